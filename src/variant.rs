//! Tagged-union values returned by the engine.
//!
//! Search results carry per-hit values as engine variants: heterogeneous
//! tagged data that may be a bare number or a composite object. The binding
//! never constructs variants for the engine; it only decodes what the engine
//! hands back.

use crate::error::{OtamaError, Result};

/// Maximum hash nesting the similarity decoder will follow.
const MAX_DRILL_DEPTH: usize = 32;

/// A tagged value produced by the engine.
///
/// `Hash` keeps the engine's own key order, so it is a sequence of pairs
/// rather than a sorted map.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// No value.
    Null,
    /// Signed integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of variants.
    Array(Vec<Variant>),
    /// Key/value pairs in engine key order.
    Hash(Vec<(String, Variant)>),
}

impl Variant {
    /// Name of the variant's tag, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Null => "null",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::String(_) => "string",
            Variant::Array(_) => "array",
            Variant::Hash(_) => "hash",
        }
    }

    /// Decode this variant into a similarity score.
    ///
    /// Scalar numbers pass through (integers are cast to `f64`). For a hash
    /// the decoder applies a first-field-wins narrowing: it takes the first
    /// key in the engine's own key order and recursively decodes the value
    /// bound to it, discarding every other field. This is a deliberate
    /// convention for composite score objects, not a general hash flattener.
    ///
    /// Strings, arrays and null are not numerically representable and fail
    /// with a decode error, as does hash nesting deeper than the recursion
    /// bound.
    pub fn similarity(&self) -> Result<f64> {
        self.drill(0)
    }

    fn drill(&self, depth: usize) -> Result<f64> {
        if depth > MAX_DRILL_DEPTH {
            return Err(OtamaError::decode(format!(
                "variant nesting exceeds depth limit {MAX_DRILL_DEPTH}"
            )));
        }

        match self {
            Variant::Int(v) => Ok(*v as f64),
            Variant::Float(v) => Ok(*v),
            Variant::Hash(pairs) => match pairs.first() {
                Some((_, value)) => value.drill(depth + 1),
                None => Err(OtamaError::decode("empty hash has no score field")),
            },
            other => Err(OtamaError::decode(format!(
                "variant type '{}' is not numerically representable",
                other.type_name()
            ))),
        }
    }
}
