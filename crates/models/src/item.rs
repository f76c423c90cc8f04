use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// A purchasable entry in a cart. The price travels as a JSON number but is
/// held as a `Decimal` so sums and comparisons stay exact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize", deserialize_with = "price::deserialize")]
    pub price: Decimal,
}

mod price {
    use rust_decimal::Decimal;
    use serde::{de::Error, Deserialize, Deserializer};

    /// Only JSON numbers are prices, and only those a `Decimal` holds without
    /// rounding. Strings such as `"12.5"` are refused.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let n = serde_json::Number::deserialize(d)?;
        if let Some(v) = n.as_i64() {
            return Ok(Decimal::from(v));
        }
        if let Some(v) = n.as_u64() {
            return Ok(Decimal::from(v));
        }
        let text = n.to_string();
        let exact = if text.contains(['e', 'E']) {
            Decimal::from_scientific(&text)
        } else {
            Decimal::from_str_exact(&text)
        };
        exact.map_err(|e| D::Error::custom(format!("price {text} cannot be held exactly: {e}")))
    }
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self { id: id.into(), name: name.into(), price }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ModelError::Validation(format!("price must be non-negative, got {}", self.price)));
        }
        Ok(())
    }

    /// Decode a request body into an item, rejecting negative prices.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let item: Item = serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))?;
        item.validate()?;
        Ok(item)
    }
}
