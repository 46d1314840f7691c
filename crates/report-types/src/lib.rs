//! Validated value types shared across the report-template workspace.
//!
//! Every type here enforces its invariant at construction time, so code that holds one can
//! rely on it without re-checking:
//! - [`FieldId`]: non-empty, operator-invisible field identifier
//! - [`Parts`]: number of input cells a field occupies, always within `[1, 6]`
//! - [`RecordKey`]: storage key for templates and results, safe to embed in a path

use std::fmt;

/// Errors that can occur when creating validated ids and keys.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input is not usable as a storage key
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Stable identifier of a template field.
///
/// Identifiers are never shown to the operator. Freshly minted ones look like
/// `fld-550e8400e29b41d4a716446655440000`, but any non-empty string read back from a
/// stored template is accepted as-is so older documents keep their ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldId(String);

impl FieldId {
    /// Prefix applied to generated identifiers.
    pub const PREFIX: &'static str = "fld-";

    /// Mints a new random identifier.
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Wraps an existing identifier.
    ///
    /// The value is not trimmed: ids are opaque.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let value = input.into();
        if value.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for FieldId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FieldId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldId::new(s).map_err(serde::de::Error::custom)
    }
}

/// Number of sibling input cells a field occupies.
///
/// Always within [`Parts::MIN`]..=[`Parts::MAX`]. Out-of-range inputs are clamped rather
/// than rejected, on construction and on deserialisation alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parts(u8);

impl Parts {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// Clamps `n` into the valid range.
    pub fn clamped(n: i64) -> Self {
        Self(n.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for Parts {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Parts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Parts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let n = i64::deserialize(deserializer)?;
        Ok(Parts::clamped(n))
    }
}

/// Key under which templates and results are stored (test identifier, token number).
///
/// Keys end up as file and directory names, so the accepted alphabet is deliberately narrow:
/// ASCII alphanumerics plus `.`, `-` and `_`, at most [`RecordKey::MAX_LEN`] bytes, and never
/// a dot-only name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    pub const MAX_LEN: usize = 128;

    pub fn parse(input: &str) -> Result<Self, TextError> {
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }

        if input.len() > Self::MAX_LEN {
            return Err(TextError::InvalidKey(format!(
                "key exceeds maximum length of {} characters",
                Self::MAX_LEN
            )));
        }

        let ok = input
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
        if !ok {
            return Err(TextError::InvalidKey(format!(
                "'{}' contains invalid characters (only alphanumeric, '.', '-', '_' allowed)",
                input
            )));
        }

        if input.bytes().all(|b| b == b'.') {
            return Err(TextError::InvalidKey(format!(
                "'{}' is not a valid key",
                input
            )));
        }

        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for RecordKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RecordKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_generate_is_prefixed_and_unique() {
        let a = FieldId::generate();
        let b = FieldId::generate();
        assert!(a.as_str().starts_with(FieldId::PREFIX));
        assert_eq!(a.as_str().len(), FieldId::PREFIX.len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_id_keeps_legacy_values_verbatim() {
        let id = FieldId::new("field_1712345678_ab").unwrap();
        assert_eq!(id.as_str(), "field_1712345678_ab");
        assert!(FieldId::new("").is_err());
    }

    #[test]
    fn test_parts_clamps_out_of_range() {
        assert_eq!(Parts::clamped(0).get(), 1);
        assert_eq!(Parts::clamped(-4).get(), 1);
        assert_eq!(Parts::clamped(3).get(), 3);
        assert_eq!(Parts::clamped(7).get(), 6);
        assert_eq!(Parts::default().get(), 1);
    }

    #[test]
    fn test_parts_deserialize_clamps() {
        let parts: Parts = serde_json::from_str("9").unwrap();
        assert_eq!(parts.get(), 6);
        assert_eq!(serde_json::to_string(&Parts::clamped(2)).unwrap(), "2");
    }

    #[test]
    fn test_record_key_accepts_safe_names() {
        assert!(RecordKey::parse("cbc-panel_01").is_ok());
        assert!(RecordKey::parse("TOKEN.42").is_ok());
    }

    #[test]
    fn test_record_key_rejects_traversal_and_bad_chars() {
        assert!(RecordKey::parse("..").is_err());
        assert!(RecordKey::parse("a/b").is_err());
        assert!(RecordKey::parse("a b").is_err());
        assert!(RecordKey::parse("").is_err());
        assert!(RecordKey::parse(&"x".repeat(129)).is_err());
    }
}
