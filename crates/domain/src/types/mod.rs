//! Domain types organized by feature

pub mod claim;
pub mod job;
pub mod ruleset;
pub mod session;
pub mod upload;

pub use claim::*;
pub use job::*;
pub use ruleset::*;
pub use session::*;
pub use upload::*;

/// Deserialize a decimal that the backend may encode as a JSON number or as a
/// string (`"1250.00"`).
pub(crate) mod decimal_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    /// Write the value as a JSON number
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*value)
    }

    /// Accept a JSON number or a numeric string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(value) => Ok(value),
            NumberOrString::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}
