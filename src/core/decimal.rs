//! Decimal-string encoding for `u128` values
//!
//! Use with `#[serde(with = "crate::core::decimal")]` on fields that leave
//! the process, so JSON clients limited to 53-bit numbers read them exactly.

use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse()
        .map_err(|_| de::Error::custom(format!("invalid decimal amount: {:?}", text)))
}
