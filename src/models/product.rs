//! Purchasable event listing, read-only from this service's perspective.

use serde::{Deserialize, Serialize};

/// One registerable event. Serialized on the wire under the key `dinner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub attributes: ProductAttributes,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub inventory: Inventory,
}

/// Event details attached by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    /// Scheduled start, RFC 3339.
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub chef: String,
    #[serde(default)]
    pub menu: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub quantity: i64,
}

impl Product {
    /// Display number for the event, derived by stripping non-digits from
    /// the product id ("sku_dinner12" renders as "12").
    pub fn event_number(&self) -> String {
        self.id.chars().filter(char::is_ascii_digit).collect()
    }
}
