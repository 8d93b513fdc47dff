//! Tolerant field decoding for provider payloads.
//!
//! Providers send `null` or an unexpected type for single fields now and
//! then. Such a field reads as its default instead of failing the whole page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// `deserialize_with` helper: any value that doesn't fit `T` becomes `T::default()`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match T::deserialize(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring field with unexpected shape");
            Ok(T::default())
        }
    }
}
