//! Client-keyed in-memory stores.
//!
//! Carts, statuses and prefill records are independent maps sharing only
//! the opaque client id as key; consistency between them is enforced by
//! [`crate::flow`], not by structural links. The server guards the whole
//! [`ClientStores`] set with one lock per request so a status can never
//! be computed against a cart it did not see.

use std::collections::{BTreeMap, HashMap};

use crate::cart::CartLine;
use crate::prefill::PrefillRecord;
use crate::status::OrderStatus;

/// Per-client cart lines.
#[derive(Debug, Default)]
pub struct CartStore {
    entries: HashMap<String, Vec<CartLine>>,
}

impl CartStore {
    /// Lines for a client; a never-seen client has an empty cart.
    #[must_use]
    pub fn get(&self, client_id: &str) -> &[CartLine] {
        self.entries
            .get(client_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn put(&mut self, client_id: &str, lines: Vec<CartLine>) {
        self.entries.insert(client_id.to_owned(), lines);
    }
}

/// Per-client order status, populated lazily on first touch.
#[derive(Debug, Default)]
pub struct StatusStore {
    entries: HashMap<String, OrderStatus>,
}

impl StatusStore {
    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<OrderStatus> {
        self.entries.get(client_id).copied()
    }

    pub fn put(&mut self, client_id: &str, status: OrderStatus) {
        self.entries.insert(client_id.to_owned(), status);
    }
}

/// Per-client accumulated checkout prefill.
#[derive(Debug, Default)]
pub struct PrefillStore {
    entries: HashMap<String, PrefillRecord>,
}

impl PrefillStore {
    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<&PrefillRecord> {
        self.entries.get(client_id)
    }

    pub fn put(&mut self, client_id: &str, record: PrefillRecord) {
        self.entries.insert(client_id.to_owned(), record);
    }

    /// Copy of the stored raw fields, empty for a never-seen client.
    #[must_use]
    pub fn raw(&self, client_id: &str) -> BTreeMap<String, String> {
        self.entries
            .get(client_id)
            .map(|record| record.raw.clone())
            .unwrap_or_default()
    }
}

/// All per-client state. Updated under one critical section per request.
#[derive(Debug, Default)]
pub struct ClientStores {
    pub carts: CartStore,
    pub statuses: StatusStore,
    pub prefill: PrefillStore,
}

impl ClientStores {
    /// Current status for a client, deriving 0/1 from the cart when the
    /// client has never been explicitly touched.
    #[must_use]
    pub fn status(&self, client_id: &str) -> OrderStatus {
        self.statuses
            .get(client_id)
            .unwrap_or_else(|| OrderStatus::derived(self.carts.get(client_id).is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_client_has_empty_cart_and_derived_status() {
        let stores = ClientStores::default();
        assert!(stores.carts.get("ghost").is_empty());
        assert_eq!(stores.status("ghost"), OrderStatus::CartEmpty);
    }

    #[test]
    fn derived_status_follows_the_cart_until_first_write() {
        let mut stores = ClientStores::default();
        stores.carts.put(
            "c1",
            vec![CartLine {
                name: "Soup".to_owned(),
                price: 4.0,
                img_ref: String::new(),
                qty: 1,
            }],
        );
        assert_eq!(stores.status("c1"), OrderStatus::CartFilled);

        stores.statuses.put("c1", OrderStatus::CartOpen);
        assert_eq!(stores.status("c1"), OrderStatus::CartOpen);
    }
}
