//! Record identifier codec.
//!
//! The engine keys every indexed image by a fixed-width binary identifier
//! (20 bytes, the width of a SHA-1 digest). The canonical textual projection
//! is a 40-character lowercase hexadecimal string. Conversion in both
//! directions is total and lossless for well-formed input; malformed hex
//! (wrong length, non-hex characters) fails with a codec error rather than
//! producing a truncated or garbage identifier.

use std::fmt;
use std::str::FromStr;

use crate::error::{OtamaError, Result};

/// Width of a binary record identifier in bytes.
pub const RECORD_ID_LEN: usize = 20;

/// Length of the canonical hexadecimal form.
pub const RECORD_ID_HEX_LEN: usize = RECORD_ID_LEN * 2;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A fixed-width binary record identifier assigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordId([u8; RECORD_ID_LEN]);

impl RecordId {
    /// Wrap raw identifier bytes.
    pub fn new(bytes: [u8; RECORD_ID_LEN]) -> Self {
        RecordId(bytes)
    }

    /// Build an identifier from a byte slice, checking the width.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; RECORD_ID_LEN] = bytes.try_into().map_err(|_| {
            OtamaError::codec(format!(
                "record id must be {RECORD_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(RecordId(octets))
    }

    /// Parse an identifier from its hexadecimal form.
    ///
    /// Accepts upper- or lowercase digits; the canonical form emitted by
    /// [`to_hex`](Self::to_hex) is lowercase. The string is validated in full
    /// before any engine state is touched.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != RECORD_ID_HEX_LEN {
            return Err(OtamaError::codec(format!(
                "record id hex string must be {RECORD_ID_HEX_LEN} characters, got {}",
                s.len()
            )));
        }

        let mut octets = [0u8; RECORD_ID_LEN];
        let bytes = s.as_bytes();
        for (i, octet) in octets.iter_mut().enumerate() {
            let hi = hex_value(bytes[i * 2])?;
            let lo = hex_value(bytes[i * 2 + 1])?;
            *octet = (hi << 4) | lo;
        }
        Ok(RecordId(octets))
    }

    /// Encode the identifier as its canonical lowercase hexadecimal form.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(RECORD_ID_HEX_LEN);
        for &octet in &self.0 {
            out.push(HEX_DIGITS[(octet >> 4) as usize] as char);
            out.push(HEX_DIGITS[(octet & 0x0F) as usize] as char);
        }
        out
    }

    /// Access the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; RECORD_ID_LEN] {
        &self.0
    }
}

fn hex_value(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(OtamaError::codec(format!(
            "invalid hex character '{}' in record id",
            c as char
        ))),
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = OtamaError;

    fn from_str(s: &str) -> Result<Self> {
        RecordId::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_round_trip() {
        let mut bytes = [0u8; RECORD_ID_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(13).wrapping_add(7);
        }
        let id = RecordId::new(bytes);
        let hex = id.to_hex();
        assert_eq!(hex.len(), RECORD_ID_HEX_LEN);
        assert_eq!(RecordId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_text_round_trip_normalizes_case() {
        let upper = "00FFA1B2C3D4E5F60718293A4B5C6D7E8F901234";
        let id = RecordId::from_hex(upper).unwrap();
        assert_eq!(id.to_hex(), upper.to_lowercase());
    }

    #[test]
    fn test_hex_is_lowercase_and_fixed_length() {
        let id = RecordId::new([0xAB; RECORD_ID_LEN]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 40);
        assert_eq!(hex, hex.to_lowercase());
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            RecordId::from_hex("abcdef"),
            Err(crate::error::OtamaError::Codec(_))
        ));
        let too_long = "0".repeat(RECORD_ID_HEX_LEN + 2);
        assert!(RecordId::from_hex(&too_long).is_err());
    }

    #[test]
    fn test_non_hex_character_rejected() {
        let bad = format!("g{}", "0".repeat(RECORD_ID_HEX_LEN - 1));
        assert!(matches!(
            RecordId::from_hex(&bad),
            Err(crate::error::OtamaError::Codec(_))
        ));
    }

    #[test]
    fn test_from_bytes_checks_width() {
        assert!(RecordId::from_bytes(&[0u8; RECORD_ID_LEN]).is_ok());
        assert!(RecordId::from_bytes(&[0u8; 19]).is_err());
        assert!(RecordId::from_bytes(&[0u8; 21]).is_err());
    }
}
