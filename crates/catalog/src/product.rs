//! Product data model.

use std::collections::BTreeMap;

use common::{ProductId, VendorId};
use serde::{Deserialize, Serialize};

/// Closed set of product categories carried by the catalog.
///
/// Each category has its own attribute schema (see [`crate::attributes`]);
/// the store itself only cares about the category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cpu,
    Ram,
    Gpu,
    Motherboard,
    Drive,
    Monitor,
    Keyboard,
    Mouse,
}

impl Category {
    /// Stable string form used in the database `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Ram => "ram",
            Category::Gpu => "gpu",
            Category::Motherboard => "motherboard",
            Category::Drive => "drive",
            Category::Monitor => "monitor",
            Category::Keyboard => "keyboard",
            Category::Mouse => "mouse",
        }
    }

    /// Parses the database string form back into a category.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cpu" => Some(Category::Cpu),
            "ram" => Some(Category::Ram),
            "gpu" => Some(Category::Gpu),
            "motherboard" => Some(Category::Motherboard),
            "drive" => Some(Category::Drive),
            "monitor" => Some(Category::Monitor),
            "keyboard" => Some(Category::Keyboard),
            "mouse" => Some(Category::Mouse),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar value inside a product's attribute bag.
///
/// Attribute bags are semi-structured: each category stores its own set of
/// technical fields (core count, memory speed, panel type, ...) as plain
/// scalars under string keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Numeric view of the value, when it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Int(n) => Some(*n as f64),
            AttrValue::Float(n) => Some(*n),
            AttrValue::Bool(_) | AttrValue::Text(_) => None,
        }
    }

    /// Equality that treats `Int` and `Float` with the same numeric value
    /// as equal, matching how the database compares extracted JSON numbers.
    pub fn loosely_eq(&self, other: &AttrValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Float(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Category-specific technical fields stored with a product.
///
/// A `BTreeMap` keeps key order deterministic, which keeps generated query
/// text and test assertions stable.
pub type AttributeBag = BTreeMap<String, AttrValue>;

/// A catalog product.
///
/// Created and updated by vendor-management operations outside this core;
/// the order-placement engine only ever reads it and decrements `stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: String,
    pub description: String,
    pub model: String,
    pub category: Category,
    /// Price in integer cents.
    pub price_cents: i64,
    /// Units available; never negative.
    pub stock: i64,
    pub is_new: bool,
    pub attributes: AttributeBag,
    /// Soft-deleted products are invisible to every read path in this core.
    pub is_deleted: bool,
}

/// Projection of a product returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub model: String,
    pub price_cents: i64,
    pub stock: i64,
    pub is_new: bool,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            model: p.model.clone(),
            price_cents: p.price_cents,
            stock: p.stock,
            is_new: p.is_new,
        }
    }
}
