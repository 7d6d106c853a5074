//! Serde helpers for [`Amount`](crate::Amount).
//!
//! Amounts routinely exceed `u64` (10^27 base units for a billion 18-decimal
//! tokens), which neither TOML integers nor buffered serde content can carry, so
//! they are written as decimal strings. Reading also accepts plain integers for
//! small hand-written values.

use std::fmt;

use serde::{de, Deserializer, Serializer};

use crate::Amount;

/// Parses a decimal amount, ignoring `_` digit separators.
pub fn parse_amount(s: &str) -> Result<Amount, String> {
    let digits: String = s.trim().chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid amount {s:?}: expected decimal digits"));
    }
    digits
        .parse::<Amount>()
        .map_err(|e| format!("invalid amount {s:?}: {e}"))
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer or decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        parse_amount(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(v as Amount)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::try_from(v).map_err(|_| E::custom(format!("negative amount {v}")))
    }
}

/// `#[serde(with = "crate::amount::decimal")]` for a single amount.
pub mod decimal {
    use super::*;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// `#[serde(with = "crate::amount::decimal_opt")]` for an optional amount.
pub mod decimal_opt {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapped(#[serde(with = "super::decimal")] Amount);

    pub fn serialize<S>(value: &Option<Amount>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(Wrapped).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}

/// `#[serde(with = "crate::amount::decimal_map")]` for account → amount maps.
pub mod decimal_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::AccountId;

    #[derive(Serialize, Deserialize)]
    struct Wrapped(#[serde(with = "super::decimal")] Amount);

    pub fn serialize<S>(value: &BTreeMap<AccountId, Amount>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(value.iter().map(|(k, v)| (k, Wrapped(*v))))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<AccountId, Amount>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<AccountId, Wrapped>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, v)| (k, v.0)).collect())
    }
}
