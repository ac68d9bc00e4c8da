//! Checkout prefill accumulator.
//!
//! Checkout form data arrives in partial patches across several agent
//! turns. Patches merge field-by-field over what is already stored; the
//! merged record is revalidated on every touch so a "complete" flag can
//! never outlive a later incomplete patch.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::store::PrefillStore;

/// The only checkout fields a patch may carry; everything else is
/// silently dropped.
pub const PREFILL_FIELDS: [&str; 6] = ["name", "phone", "email", "card", "exp", "cvv"];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));
static EXP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}$").expect("valid expiry pattern"));

/// Redacted view of a validated record. Raw card and CVV digits never
/// appear here: only the last four card digits and the CVV length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanedPrefill {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub card_last4: String,
    pub exp: String,
    pub cvv_len: usize,
}

/// Per-client accumulated checkout state.
#[derive(Debug, Clone, Default)]
pub struct PrefillRecord {
    /// Raw field values as last submitted, merged across patches.
    pub raw: BTreeMap<String, String>,
    /// Redacted view from the last validation.
    pub cleaned: CleanedPrefill,
    /// Whether the last validation passed.
    pub valid: bool,
}

/// Outcome of validating a raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub missing: Vec<&'static str>,
    pub cleaned: CleanedPrefill,
}

/// Validate a raw record without mutating anything.
#[must_use]
pub fn validate(raw: &BTreeMap<String, String>) -> Validation {
    let field = |key: &str| raw.get(key).map(String::as_str).unwrap_or_default();

    let name = field("name").trim().to_owned();
    let phone = digits(field("phone"));
    let email = field("email").trim().to_owned();
    let card = digits(field("card"));
    let exp = field("exp").trim().to_owned();
    let cvv = digits(field("cvv"));

    let mut missing = Vec::new();
    if name.is_empty() {
        missing.push("name");
    }
    if phone.len() < 7 {
        missing.push("phone");
    }
    if !EMAIL_RE.is_match(&email) {
        missing.push("email");
    }
    if !(13..=19).contains(&card.len()) {
        missing.push("card");
    }
    if !valid_expiry(&exp) {
        missing.push("exp");
    }
    if cvv.len() != 3 && cvv.len() != 4 {
        missing.push("cvv");
    }

    let card_last4 = card
        .get(card.len().saturating_sub(4)..)
        .unwrap_or_default()
        .to_owned();

    Validation {
        valid: missing.is_empty(),
        missing,
        cleaned: CleanedPrefill {
            name,
            phone,
            email,
            card_last4,
            exp,
            cvv_len: cvv.len(),
        },
    }
}

/// Merge a partial patch over the client's stored raw values, revalidate
/// and store the result. Returns the validation plus the merged raw map.
pub fn merge_patch(
    store: &mut PrefillStore,
    client_id: &str,
    patch: &serde_json::Map<String, Value>,
) -> (Validation, BTreeMap<String, String>) {
    let mut raw = store.raw(client_id);
    for (key, value) in patch {
        if !PREFILL_FIELDS.contains(&key.as_str()) || value.is_null() {
            continue;
        }
        raw.insert(key.clone(), stringify(value));
    }

    let validation = validate(&raw);
    store.put(
        client_id,
        PrefillRecord {
            raw: raw.clone(),
            cleaned: validation.cleaned.clone(),
            valid: validation.valid,
        },
    );
    (validation, raw)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// `MM/YY` with a parseable month in 1..=12.
fn valid_expiry(exp: &str) -> bool {
    if !EXP_RE.is_match(exp) {
        return false;
    }
    exp.get(..2)
        .and_then(|mm| mm.parse::<u32>().ok())
        .is_some_and(|month| (1..=12).contains(&month))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_patch() -> serde_json::Map<String, Value> {
        json!({
            "name": "Ana",
            "phone": "5551234567",
            "email": "a@b.com",
            "card": "4111111111111111",
            "exp": "09/27",
            "cvv": "123",
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn full_patch_validates() {
        let mut store = PrefillStore::default();
        let (validation, raw) = merge_patch(&mut store, "c1", &full_patch());

        assert!(validation.valid);
        assert!(validation.missing.is_empty());
        assert_eq!(raw.get("card").unwrap(), "4111111111111111");
        assert_eq!(validation.cleaned.card_last4, "1111");
        assert_eq!(validation.cleaned.cvv_len, 3);
    }

    #[test]
    fn missing_cvv_is_reported() {
        let mut patch = full_patch();
        patch.remove("cvv");

        let mut store = PrefillStore::default();
        let (validation, _) = merge_patch(&mut store, "c1", &patch);

        assert!(!validation.valid);
        assert_eq!(validation.missing, vec!["cvv"]);
    }

    #[test]
    fn patches_accumulate_across_calls() {
        let mut store = PrefillStore::default();

        let first = json!({"name": "Ana", "phone": "555-123-4567"})
            .as_object()
            .unwrap()
            .clone();
        let (validation, _) = merge_patch(&mut store, "c1", &first);
        assert!(!validation.valid);
        assert!(validation.missing.contains(&"email"));

        let second = json!({
            "email": "a@b.com",
            "card": "4111 1111 1111 1111",
            "exp": "09/27",
            "cvv": "123",
        })
        .as_object()
        .unwrap()
        .clone();
        let (validation, raw) = merge_patch(&mut store, "c1", &second);
        assert!(validation.valid, "earlier fields survive the merge");
        assert_eq!(raw.get("name").unwrap(), "Ana");
        assert_eq!(validation.cleaned.phone, "5551234567");
    }

    #[test]
    fn unknown_keys_and_nulls_are_dropped() {
        let mut store = PrefillStore::default();
        let patch = json!({"name": "Ana", "address": "ignored", "phone": null})
            .as_object()
            .unwrap()
            .clone();
        let (_, raw) = merge_patch(&mut store, "c1", &patch);

        assert_eq!(raw.len(), 1);
        assert!(raw.contains_key("name"));
    }

    #[test]
    fn expiry_month_must_be_in_range() {
        let mut raw = BTreeMap::new();
        raw.insert("exp".to_owned(), "13/27".to_owned());
        assert!(validate(&raw).missing.contains(&"exp"));

        raw.insert("exp".to_owned(), "00/27".to_owned());
        assert!(validate(&raw).missing.contains(&"exp"));

        raw.insert("exp".to_owned(), "12/27".to_owned());
        assert!(!validate(&raw).missing.contains(&"exp"));

        raw.insert("exp".to_owned(), "9/27".to_owned());
        assert!(validate(&raw).missing.contains(&"exp"), "single-digit month needs padding");
    }

    #[test]
    fn card_length_bounds() {
        let mut raw = BTreeMap::new();
        raw.insert("card".to_owned(), "4111 1111 1111".to_owned()); // 12 digits
        assert!(validate(&raw).missing.contains(&"card"));

        raw.insert("card".to_owned(), "4111111111111".to_owned()); // 13 digits
        assert!(!validate(&raw).missing.contains(&"card"));
    }

    #[test]
    fn cleaned_view_redacts_card_and_cvv() {
        let mut store = PrefillStore::default();
        let (validation, _) = merge_patch(&mut store, "c1", &full_patch());

        let rendered = serde_json::to_string(&validation.cleaned).unwrap();
        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("\"123\""));
        assert!(rendered.contains("\"card_last4\":\"1111\""));
        assert!(rendered.contains("\"cvv_len\":3"));
    }
}
