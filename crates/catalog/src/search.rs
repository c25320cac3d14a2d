//! Specification query builder.
//!
//! Translates a category plus an open attribute filter map into a
//! parameterized, read-only SQL query. Attribute keys and values originate
//! from caller input, so every one of them — keys included — is emitted as
//! a bound parameter and never concatenated into the query text.

use common::VendorId;
use serde::{Deserialize, Serialize};

use crate::attributes::CategoryAttributes;
use crate::product::{AttrValue, Category};

/// Attribute keys compared as a floor threshold (`stored >= requested`)
/// instead of equality. Currently only the CPU base clock behaves this way.
const THRESHOLD_KEYS: &[&str] = &["base_clock"];

/// Builder for product search queries.
///
/// Fixed filters (`is_deleted = false`, category) always apply; price
/// bounds, vendor and condition apply only when set; attribute pairs each
/// contribute one probe into the product's attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Category,
    /// Minimum price in cents (inclusive).
    pub min_price_cents: Option<i64>,
    /// Maximum price in cents (inclusive).
    pub max_price_cents: Option<i64>,
    pub vendor_id: Option<VendorId>,
    pub is_new: Option<bool>,
    /// Ordered attribute probes; order controls generated parameter order.
    pub attributes: Vec<(String, AttrValue)>,
}

/// A value bound into the generated query, in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(uuid::Uuid),
}

impl ProductFilter {
    /// Creates a filter matching everything in a category.
    pub fn for_category(category: Category) -> Self {
        Self {
            category,
            min_price_cents: None,
            max_price_cents: None,
            vendor_id: None,
            is_new: None,
            attributes: Vec::new(),
        }
    }

    /// Creates a filter from a tagged per-category attribute shape.
    pub fn from_attributes(attributes: CategoryAttributes) -> Self {
        let category = attributes.category();
        Self {
            attributes: attributes.into_pairs(),
            ..Self::for_category(category)
        }
    }

    /// Filters by minimum price in cents (inclusive).
    pub fn min_price_cents(mut self, cents: i64) -> Self {
        self.min_price_cents = Some(cents);
        self
    }

    /// Filters by maximum price in cents (inclusive).
    pub fn max_price_cents(mut self, cents: i64) -> Self {
        self.max_price_cents = Some(cents);
        self
    }

    /// Filters by vendor.
    pub fn vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Filters by new/used condition.
    pub fn is_new(mut self, is_new: bool) -> Self {
        self.is_new = Some(is_new);
        self
    }

    /// Appends one attribute probe.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// True when the named key compares as a floor threshold.
    pub fn is_threshold_key(name: &str) -> bool {
        THRESHOLD_KEYS.contains(&name)
    }

    /// Builds the SQL text and its ordered parameter list.
    ///
    /// Pure: no I/O, no connection. The Postgres store binds the returned
    /// values in order; tests and benches call this directly.
    pub fn to_sql(&self) -> (String, Vec<BindValue>) {
        let mut sql = String::from(
            "SELECT id, name, description, model, price_cents, stock, is_new \
             FROM products WHERE is_deleted = FALSE",
        );
        let mut params: Vec<BindValue> = Vec::new();

        params.push(BindValue::Text(self.category.as_str().to_string()));
        sql.push_str(&format!(" AND category = ${}", params.len()));

        if let Some(min) = self.min_price_cents {
            params.push(BindValue::Int(min));
            sql.push_str(&format!(" AND price_cents >= ${}", params.len()));
        }
        if let Some(max) = self.max_price_cents {
            params.push(BindValue::Int(max));
            sql.push_str(&format!(" AND price_cents <= ${}", params.len()));
        }
        if let Some(vendor_id) = self.vendor_id {
            params.push(BindValue::Uuid(vendor_id.as_uuid()));
            sql.push_str(&format!(" AND vendor_id = ${}", params.len()));
        }
        if let Some(is_new) = self.is_new {
            params.push(BindValue::Bool(is_new));
            sql.push_str(&format!(" AND is_new = ${}", params.len()));
        }

        for (name, value) in &self.attributes {
            params.push(BindValue::Text(name.clone()));
            let key_param = params.len();

            // The ->> extraction yields text (or NULL for an absent key, so
            // an unknown key is a probe that matches nothing). Typed probes
            // guard on the stored JSON type before casting: a numeric probe
            // against a text value matches nothing instead of failing the
            // cast and aborting the whole query.
            match value {
                AttrValue::Int(_) | AttrValue::Float(_)
                    if Self::is_threshold_key(name) =>
                {
                    params.push(match value {
                        AttrValue::Int(n) => BindValue::Float(*n as f64),
                        AttrValue::Float(n) => BindValue::Float(*n),
                        _ => unreachable!(),
                    });
                    sql.push_str(&format!(
                        " AND jsonb_typeof(attributes -> ${key_param}) = 'number' \
                         AND (attributes ->> ${key_param})::numeric >= ${}",
                        params.len()
                    ));
                }
                AttrValue::Int(n) => {
                    params.push(BindValue::Int(*n));
                    sql.push_str(&format!(
                        " AND jsonb_typeof(attributes -> ${key_param}) = 'number' \
                         AND (attributes ->> ${key_param})::numeric = ${}",
                        params.len()
                    ));
                }
                AttrValue::Float(n) => {
                    params.push(BindValue::Float(*n));
                    sql.push_str(&format!(
                        " AND jsonb_typeof(attributes -> ${key_param}) = 'number' \
                         AND (attributes ->> ${key_param})::numeric = ${}",
                        params.len()
                    ));
                }
                AttrValue::Bool(b) => {
                    params.push(BindValue::Bool(*b));
                    sql.push_str(&format!(
                        " AND jsonb_typeof(attributes -> ${key_param}) = 'boolean' \
                         AND (attributes ->> ${key_param})::boolean = ${}",
                        params.len()
                    ));
                }
                AttrValue::Text(s) => {
                    params.push(BindValue::Text(s.clone()));
                    sql.push_str(&format!(
                        " AND attributes ->> ${key_param} = ${}",
                        params.len()
                    ));
                }
            }
        }

        sql.push_str(" ORDER BY name, id");
        (sql, params)
    }
}
