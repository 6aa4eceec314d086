// ABOUTME: Custom serde deserializers for settings fields.
// ABOUTME: Resolves literal-or-env values and validates bucket names at load time.

use serde::Deserialize;

use super::EnvValue;
use crate::types::BucketName;

pub fn resolved<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    EnvValue::deserialize(deserializer)?
        .resolve()
        .map_err(serde::de::Error::custom)
}

pub fn resolved_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<EnvValue>::deserialize(deserializer)?
        .map(|value| value.resolve())
        .transpose()
        .map_err(serde::de::Error::custom)
}

pub fn resolved_bucket<'de, D>(deserializer: D) -> Result<BucketName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = resolved(deserializer)?;
    BucketName::new(&name).map_err(serde::de::Error::custom)
}
