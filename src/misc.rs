//! Odds and ends that don't belong to any one part of the program.

use serde::{Deserialize, Deserializer, Serializer};

pub mod other;

pub use other::Similarity;

/// Something that is stored as a short string tag, like a scale or rhythm name.
/// Parsing is lenient, unknown tags give None so callers can pick a fallback.
pub trait Tagged: Sized {
    fn tag(&self) -> &'static str;
    fn from_tag(tag: &str) -> Option<Self>;

    /// Parses a tag, falling back to the default value if it is unknown.
    fn from_tag_or_default(tag: &str) -> Self
    where
        Self: Default,
    {
        Self::from_tag(tag).unwrap_or_default()
    }
}

/// Serde adapter for [`Tagged`] fields.
/// Use with `#[serde(with = "crate::misc::tagged")]`.
pub mod tagged {
    use super::*;

    pub fn serialize<T: Tagged, S: Serializer>(value: &T, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value.tag())
    }

    pub fn deserialize<'de, T, D>(de: D) -> Result<T, D::Error>
    where
        T: Tagged + Default,
        D: Deserializer<'de>,
    {
        Ok(match serde_json::Value::deserialize(de)? {
            serde_json::Value::String(x) => T::from_tag_or_default(&x),
            _ => T::default(),
        })
    }
}
