//! Cart mutation engine.
//!
//! A request carries an ordered batch of operations; each operation sees
//! the effect of the ones before it. Operations that cannot be resolved
//! against the catalog are skipped rather than rejected, so the agent can
//! never conjure items that are not on the menu.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::{MenuCatalog, normalize_name};

/// Upper bound for a single wire quantity.
pub const MAX_QTY: i64 = 99;

/// One line in a client's cart. At most one line exists per normalized
/// item name; a line with quantity 0 is removed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub price: f64,
    pub img_ref: String,
    pub qty: i64,
}

/// A single cart mutation. The tag set is closed: an unrecognized `op`
/// is rejected when the request is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum CartOp {
    /// Append or accumulate a catalog item.
    Add {
        #[serde(default)]
        name: String,
        #[serde(default = "default_qty", deserialize_with = "lenient_qty")]
        qty: i64,
    },
    /// Decrement an existing line, deleting it when it reaches zero.
    Remove {
        #[serde(default)]
        name: String,
        #[serde(default = "default_qty", deserialize_with = "lenient_qty")]
        qty: i64,
    },
    /// Upsert a line to an exact quantity, refreshing price/image from
    /// the catalog. A quantity of zero deletes the line.
    Set {
        #[serde(default)]
        name: String,
        #[serde(default = "default_qty", deserialize_with = "lenient_qty")]
        qty: i64,
    },
    /// Discard every line; later operations see an empty cart.
    Clear,
}

const fn default_qty() -> i64 {
    1
}

/// Accept numbers or numeric strings for `qty`; anything unparseable
/// clamps to 0 instead of failing the whole batch.
fn lenient_qty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(clamp_qty(&value))
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_qty(value: &Value) -> i64 {
    let qty = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };
    qty.clamp(0, MAX_QTY)
}

/// Apply `ops` in order to a copy of `existing`, resolving names against
/// `catalog`. Unknown names and empty names are no-ops.
#[must_use]
pub fn apply(existing: &[CartLine], ops: &[CartOp], catalog: &MenuCatalog) -> Vec<CartLine> {
    let mut lines = existing.to_vec();

    for op in ops {
        match op {
            CartOp::Clear => lines.clear(),
            CartOp::Add { name, qty } => {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let qty = if *qty <= 0 { 1 } else { *qty };
                let Some(item) = catalog.find_by_name(name) else {
                    continue;
                };
                if let Some(line) = find_line_mut(&mut lines, name) {
                    // Accumulation is deliberately not re-clamped: the
                    // per-op bound applies to wire values, not totals.
                    line.qty += qty;
                } else {
                    lines.push(CartLine {
                        name: item.name.clone(),
                        price: item.price,
                        img_ref: item.img_ref.clone(),
                        qty,
                    });
                }
            }
            CartOp::Remove { name, qty } => {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let qty = if *qty <= 0 { 1 } else { *qty };
                let Some(idx) = find_line(&lines, name) else {
                    continue;
                };
                let current = lines.get(idx).map_or(0, |line| line.qty);
                if current <= qty {
                    lines.remove(idx);
                } else if let Some(line) = lines.get_mut(idx) {
                    line.qty = current - qty;
                }
            }
            CartOp::Set { name, qty } => {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                if *qty <= 0 {
                    if let Some(idx) = find_line(&lines, name) {
                        lines.remove(idx);
                    }
                    continue;
                }
                let Some(item) = catalog.find_by_name(name) else {
                    continue;
                };
                if let Some(line) = find_line_mut(&mut lines, name) {
                    line.qty = *qty;
                    line.price = item.price;
                    line.img_ref = item.img_ref.clone();
                } else {
                    lines.push(CartLine {
                        name: item.name.clone(),
                        price: item.price,
                        img_ref: item.img_ref.clone(),
                        qty: *qty,
                    });
                }
            }
        }
    }

    lines
}

/// Cart total rounded to two decimal places. Lines with a non-finite
/// price contribute nothing instead of poisoning the sum.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn total(lines: &[CartLine]) -> f64 {
    let sum: f64 = lines
        .iter()
        .filter(|line| line.price.is_finite())
        .map(|line| line.price * line.qty as f64)
        .sum();
    (sum * 100.0).round() / 100.0
}

fn find_line(lines: &[CartLine], name: &str) -> Option<usize> {
    let key = normalize_name(name);
    lines
        .iter()
        .position(|line| normalize_name(&line.name) == key)
}

fn find_line_mut<'a>(lines: &'a mut Vec<CartLine>, name: &str) -> Option<&'a mut CartLine> {
    let key = normalize_name(name);
    lines
        .iter_mut()
        .find(|line| normalize_name(&line.name) == key)
}
