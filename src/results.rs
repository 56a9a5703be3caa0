//! Ranked search results.

use serde::{Deserialize, Serialize};

use crate::driver::RawResults;
use crate::error::Result;

/// A single similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Record identifier in canonical hex form.
    pub id: String,
    /// Similarity score as reported by the engine (higher is more similar).
    pub similarity: f64,
}

/// Assemble a result set from a raw engine buffer.
///
/// Walks slots `0..min(count, limit)` in engine-assigned order, hex-encoding
/// each identifier and decoding each value into a similarity score. The order
/// is preserved verbatim; the binding never re-sorts. An empty buffer yields
/// an empty vector, not an error.
pub(crate) fn assemble(raw: &dyn RawResults, limit: usize) -> Result<Vec<SearchResult>> {
    let n = raw.count().min(limit);
    let mut results = Vec::with_capacity(n);
    for i in 0..n {
        let id = raw.id_at(i).to_hex();
        let similarity = raw.value_at(i)?.similarity()?;
        results.push(SearchResult { id, similarity });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{RECORD_ID_LEN, RecordId};
    use crate::variant::Variant;

    struct FixedResults {
        rows: Vec<(RecordId, Variant)>,
    }

    impl RawResults for FixedResults {
        fn count(&self) -> usize {
            self.rows.len()
        }

        fn id_at(&self, index: usize) -> RecordId {
            self.rows[index].0
        }

        fn value_at(&self, index: usize) -> Result<Variant> {
            Ok(self.rows[index].1.clone())
        }
    }

    fn id(fill: u8) -> RecordId {
        RecordId::new([fill; RECORD_ID_LEN])
    }

    #[test]
    fn test_empty_buffer_yields_empty_set() {
        let raw = FixedResults { rows: Vec::new() };
        assert!(assemble(&raw, 10).unwrap().is_empty());
    }

    #[test]
    fn test_engine_order_is_preserved() {
        // Deliberately not sorted by similarity: the assembler must keep the
        // engine's rank order untouched.
        let raw = FixedResults {
            rows: vec![
                (id(1), Variant::Float(0.2)),
                (id(2), Variant::Float(0.9)),
                (id(3), Variant::Float(0.5)),
            ],
        };
        let results = assemble(&raw, 10).unwrap();
        let sims: Vec<f64> = results.iter().map(|r| r.similarity).collect();
        assert_eq!(sims, vec![0.2, 0.9, 0.5]);
        assert_eq!(results[0].id, id(1).to_hex());
    }

    #[test]
    fn test_limit_caps_result_count() {
        let raw = FixedResults {
            rows: vec![
                (id(1), Variant::Float(0.9)),
                (id(2), Variant::Float(0.8)),
                (id(3), Variant::Float(0.7)),
            ],
        };
        assert_eq!(assemble(&raw, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_failure_propagates() {
        let raw = FixedResults {
            rows: vec![(id(1), Variant::Null)],
        };
        assert!(assemble(&raw, 10).is_err());
    }

    #[test]
    fn test_serde_wire_shape() {
        let result = SearchResult {
            id: "ab".repeat(20),
            similarity: 0.875,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], "ab".repeat(20));
        assert_eq!(json["similarity"], 0.875);
    }
}
