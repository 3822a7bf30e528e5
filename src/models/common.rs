//! Wire helpers shared by the backend models.
//!
//! The backend is loose about scalar types: identifiers arrive as strings or
//! numbers and amounts as integers, floats or numeric strings. These helpers
//! settle each into one Rust type at deserialization time.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Unsigned(n) => n.to_string(),
            RawId::Signed(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// 金额统一为整数（越南盾无小数位）
pub fn amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Unsigned(n) => Ok(n),
        RawAmount::Float(f) if f.is_finite() && f >= 0.0 => Ok(f.round() as u64),
        RawAmount::Float(f) => Err(D::Error::custom(format!("invalid amount: {f}"))),
        RawAmount::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.round() as u64)
            .ok_or_else(|| D::Error::custom(format!("invalid amount: {s}"))),
    }
}
