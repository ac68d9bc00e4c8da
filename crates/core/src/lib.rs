//! Mesa Core - Domain library for the conversational ordering backend.
//!
//! This crate holds the pure per-client order machinery used by the
//! `server` crate:
//! - [`catalog`] - Menu catalog normalization and agent prompt building
//! - [`cart`] - Ordered cart mutation batches resolved against the catalog
//! - [`prefill`] - Checkout form accumulation and validation
//! - [`flow`] - The 0..5 order status state machine
//! - [`store`] - Client-keyed in-memory stores
//!
//! # Architecture
//!
//! The core crate contains only types and state transitions - no I/O, no
//! HTTP clients, no transport. Every function here is a computation over
//! the stores it is handed; callers decide what to broadcast from the
//! returned change records, which keeps the state machine unit testable
//! without a push-channel double.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod flow;
pub mod prefill;
pub mod status;
pub mod store;

pub use cart::{CartLine, CartOp};
pub use catalog::{MenuCatalog, MenuItem};
pub use flow::{StatusChange, TransitionError, TransitionOutcome};
pub use prefill::{CleanedPrefill, PrefillRecord, Validation};
pub use status::OrderStatus;
pub use store::{CartStore, ClientStores, PrefillStore, StatusStore};
