//! Shared serde helper functions for raw record fields.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Deserialize an optional integer id that may arrive as a number, a numeric
/// string, an empty string, or null.
///
/// Log files carry `userId` as `""` for logged-out sessions and as either
/// `"39"` or `39` otherwise.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientI64;

    impl<'de> Visitor<'de> for LenientI64 {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, a numeric string, an empty string, or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("integer {v} out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.fract() == 0.0 && v.is_finite() && v.abs() < i64::MAX as f64 {
                Ok(Some(v as i64))
            } else {
                Err(E::custom(format!("expected an integral value, found {v}")))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<i64>() {
                Ok(n) => Ok(Some(n)),
                Err(_) => trimmed
                    .parse::<f64>()
                    .map_err(|_| E::custom(format!("invalid integer '{trimmed}'")))
                    .and_then(|f| self.visit_f64(f)),
            }
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(LenientI64)
        }
    }

    deserializer.deserialize_any(LenientI64)
}
