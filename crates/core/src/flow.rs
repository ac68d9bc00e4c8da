//! Order status state machine.
//!
//! Pure transition logic over [`ClientStores`]: every function returns a
//! change record and leaves broadcasting to the caller, gated solely on
//! `changed`. Status 4 is a re-verified gate - it is recomputed from the
//! prefill validation on every attempt touching {3,4}, so a stale
//! "complete" flag cannot survive a later incomplete patch.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::prefill;
use crate::status::OrderStatus;
use crate::store::ClientStores;

/// Result of unconditionally recording a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub prev: OrderStatus,
    pub next: OrderStatus,
    /// Only a change may broadcast; an equal write never does.
    pub changed: bool,
}

/// Why a requested transition was refused. No store is mutated when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The caller's optimistic `from` no longer matches the stored status.
    #[error("state_conflict: currently at {current}, requested from {requested_from}")]
    Conflict {
        current: OrderStatus,
        requested_from: i64,
    },
    /// Target 0 requires an empty cart.
    #[error("cart_not_empty: currently at {current}")]
    CartNotEmpty { current: OrderStatus },
    /// Targets 1..=4 require a non-empty cart.
    #[error("cart_empty: currently at {current}")]
    CartEmpty { current: OrderStatus },
    /// Target 5 is reachable only from 4.
    #[error("invalid_transition: must be 4 -> 5, currently at {current}")]
    InvalidTransition { current: OrderStatus },
    /// The requested target is not a flow status.
    #[error("unknown_target: {to}")]
    UnknownTarget { to: i64 },
}

/// A successful transition: the status that was landed on (which may
/// differ from the requested target on the 3/4 branch) plus the prefill
/// data to surface to the caller and the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub status: OrderStatus,
    pub changed: bool,
    /// `Some` only on the 3/4 branch: whether a valid prefill gated the
    /// client into 4.
    pub applied_prefill: Option<bool>,
    /// Missing prefill fields, empty when the record validates.
    pub missing: Option<Vec<&'static str>>,
    /// Raw accumulated prefill, forwarded verbatim for agent visibility.
    pub prefill: Option<BTreeMap<String, String>>,
}

impl TransitionOutcome {
    fn plain(change: StatusChange) -> Self {
        Self {
            status: change.next,
            changed: change.changed,
            applied_prefill: None,
            missing: None,
            prefill: None,
        }
    }
}

/// Unconditionally record `next` for the client and report whether the
/// observable value changed. Broadcast gating is the caller's job.
pub fn set_status(stores: &mut ClientStores, client_id: &str, next: OrderStatus) -> StatusChange {
    let prev = stores.status(client_id);
    stores.statuses.put(client_id, next);
    StatusChange {
        prev,
        next,
        changed: prev != next,
    }
}

/// Post-mutation reconciliation invoked after every cart write: while the
/// client sits in the pre-checkout statuses {0,1,2}, the status must
/// truthfully reflect the cart. Returns `None` when the client is already
/// past the cart stage.
pub fn reconcile_cart_status(stores: &mut ClientStores, client_id: &str) -> Option<StatusChange> {
    let current = stores.status(client_id);
    if !matches!(
        current,
        OrderStatus::CartEmpty | OrderStatus::CartFilled | OrderStatus::CartOpen
    ) {
        return None;
    }

    let next = if stores.carts.get(client_id).is_empty() {
        OrderStatus::CartEmpty
    } else if current == OrderStatus::CartOpen {
        OrderStatus::CartOpen
    } else {
        OrderStatus::CartFilled
    };
    Some(set_status(stores, client_id, next))
}

/// Attempt to move a client to status `to`, enforcing the optimistic
/// `from` guard and the per-target preconditions. On the {3,4} branch a
/// supplied `patch` is merged into the client's prefill first; the landed
/// status then follows the validation outcome, never the raw request.
pub fn transition(
    stores: &mut ClientStores,
    client_id: &str,
    to: i64,
    from: Option<i64>,
    patch: Option<&serde_json::Map<String, Value>>,
) -> Result<TransitionOutcome, TransitionError> {
    let current = stores.status(client_id);

    if let Some(requested_from) = from {
        if requested_from != i64::from(current.as_u8()) {
            return Err(TransitionError::Conflict {
                current,
                requested_from,
            });
        }
    }

    let target = u8::try_from(to)
        .ok()
        .and_then(|value| OrderStatus::try_from(value).ok())
        .ok_or(TransitionError::UnknownTarget { to })?;

    let cart_empty = stores.carts.get(client_id).is_empty();

    match target {
        OrderStatus::CartEmpty => {
            if !cart_empty {
                return Err(TransitionError::CartNotEmpty { current });
            }
            Ok(TransitionOutcome::plain(set_status(
                stores,
                client_id,
                OrderStatus::CartEmpty,
            )))
        }
        OrderStatus::CartFilled | OrderStatus::CartOpen => {
            if cart_empty {
                return Err(TransitionError::CartEmpty { current });
            }
            Ok(TransitionOutcome::plain(set_status(
                stores, client_id, target,
            )))
        }
        OrderStatus::CheckoutOpen | OrderStatus::CheckoutReady => {
            if cart_empty {
                return Err(TransitionError::CartEmpty { current });
            }
            Ok(checkout_transition(stores, client_id, target, patch))
        }
        OrderStatus::Confirmed => {
            if current != OrderStatus::CheckoutReady {
                return Err(TransitionError::InvalidTransition { current });
            }
            Ok(TransitionOutcome::plain(set_status(
                stores,
                client_id,
                OrderStatus::Confirmed,
            )))
        }
    }
}

/// The {3,4} branch: merge a patch if one arrived, otherwise revalidate
/// whatever is stored. Status 4 is only ever entered with a currently
/// valid prefill; a request for 4 degrades to 3 when incomplete.
fn checkout_transition(
    stores: &mut ClientStores,
    client_id: &str,
    target: OrderStatus,
    patch: Option<&serde_json::Map<String, Value>>,
) -> TransitionOutcome {
    // An empty patch carries no fields and falls through to the stored
    // record, same as no patch at all.
    if let Some(patch) = patch.filter(|p| !p.is_empty()) {
        let (validation, raw) = prefill::merge_patch(&mut stores.prefill, client_id, patch);
        let landed = if validation.valid {
            OrderStatus::CheckoutReady
        } else {
            OrderStatus::CheckoutOpen
        };
        let change = set_status(stores, client_id, landed);
        return TransitionOutcome {
            status: change.next,
            changed: change.changed,
            applied_prefill: Some(validation.valid),
            missing: Some(validation.missing),
            prefill: Some(raw),
        };
    }

    let raw = stores.prefill.raw(client_id);
    let validation = prefill::validate(&raw);

    let (landed, applied) = match target {
        OrderStatus::CheckoutReady if validation.valid => (OrderStatus::CheckoutReady, true),
        // Requested 3, or requested 4 without a valid record: land on 3.
        _ => (OrderStatus::CheckoutOpen, false),
    };

    let change = set_status(stores, client_id, landed);
    TransitionOutcome {
        status: change.next,
        changed: change.changed,
        applied_prefill: Some(applied),
        missing: Some(if validation.valid {
            Vec::new()
        } else {
            validation.missing
        }),
        prefill: Some(raw),
    }
}
