//! Serde utilities for provider payloads.

use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;

/// Deserializes optional counters the provider sends either as numbers or as
/// numeric strings (`"total": "1234"`).
pub mod option_string_or_u32 {
    use super::{de, fmt, Deserializer, Visitor};

    /// Deserializes an optional u32 from a string or number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither, or does not fit in a u32.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CountVisitor;

        impl<'de> Visitor<'de> for CountVisitor {
            type Value = Option<u32>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative count as a string or integer")
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u32::try_from(value).map(Some).map_err(de::Error::custom)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u32::try_from(value).map(Some).map_err(de::Error::custom)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.trim().parse::<u32>().map(Some).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}

/// Deserializes identifiers that may arrive as numbers or strings.
pub mod string_or_number {
    use super::{de, fmt, Deserializer, Visitor};

    /// Deserializes a string from a string or integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = String;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer identifier")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.to_string())
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.to_string())
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.to_string())
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
