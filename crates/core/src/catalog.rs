//! Menu catalog: normalized sellable items and the derived agent prompt.
//!
//! The catalog is replaced wholesale, never patched item by item. Every
//! replacement rebuilds the natural-language prompt block handed to the
//! realtime agent, so the prompt can never drift from the items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A sellable menu item. Identity is the trimmed, case-folded name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: f64,
    pub img_ref: String,
    pub ingredients: String,
    pub description: String,
}

/// The current catalog snapshot plus its derived agent instructions.
#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
    prompt: String,
}

impl MenuCatalog {
    /// Build a catalog from raw (untrusted) item records.
    #[must_use]
    pub fn from_raw(raw: &[Value]) -> Self {
        let mut catalog = Self::default();
        catalog.replace(raw);
        catalog
    }

    /// Replace the snapshot with normalized copies of `raw` and rebuild
    /// the prompt. Malformed fields fall back to `""` / `0`; a bad item
    /// never aborts the batch.
    pub fn replace(&mut self, raw: &[Value]) {
        self.items = raw.iter().map(normalize_item).collect();
        self.prompt = build_prompt(&self.items);
    }

    /// Current normalized items.
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Instruction block for the realtime agent, rebuilt on every
    /// [`replace`](Self::replace).
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Case-insensitive, trim-insensitive exact name lookup.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&MenuItem> {
        let key = normalize_name(name);
        self.items
            .iter()
            .find(|item| normalize_name(&item.name) == key)
    }
}

/// Normalized item identity: trimmed and case-folded.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_item(raw: &Value) -> MenuItem {
    MenuItem {
        name: coerce_string(raw.get("name")),
        price: coerce_price(raw.get("price")),
        img_ref: coerce_string(raw.get("img_ref")),
        ingredients: coerce_string(raw.get("ingredients")),
        description: coerce_string(raw.get("description")),
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_price(value: Option<&Value>) -> f64 {
    let price = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if price.is_finite() { price.max(0.0) } else { 0.0 }
}

/// Fixed instructional header for the realtime agent: role, tool usage
/// rules, and the per-status flow script.
const PROMPT_HEADER: &[&str] = &[
    "You are a realtime voice agent for a restaurant called Mesa.",
    "Use ONLY the following official menu.",
    "Recommend at most 1-3 items: name + price + a short reason.",
    "If unsure, ask. Keep answers short and conversational.",
    "Respond in the user's language.",
    "Do NOT invent items that are not in the menu.",
    "",
    "TOOLS:",
    "- Use `update_front` when you want to highlight/show only certain menu items on the client UI.",
    "- Use `update_cart` to apply changes to the cart with `ops`, or clear it with `action: clear`. Do NOT include `client_id`; the client routes it correctly.",
    "- Use `get_cart` when asked for cart status, item count, or total price. Do NOT include `client_id`; the client routes it.",
    "- Use `get_order_status` to retrieve the current order flow step (0..5).",
    "- Use `transition_order_status` to change UI flow (cart/checkout/success).",
    "",
    "IMPORTANT!! Before you call `transition_order_status`, ALWAYS call `get_order_status` to ensure the state is fresh.",
    "When you use these tools, include a short `reply` so the user hears an immediate response.",
    "If you are asked for the state of the cart or the current total price, ALWAYS use get_cart, even if you know the answer. Never assume totals from memory.",
    "",
    "INSTRUCTIONS:",
    "Guide the customer through the purchasing process on the ordering platform.",
    "The first step will be to ask what they want to eat, and advise them to add the items they want to the cart. Every time you recommend or talk about a product, use `update_front` to show the product details.",
    "If the customer is satisfied with their order, continue with the order, going through each order status using `transition_order_status` following the next steps:",
    "1. The customer has items in the shopping cart",
    "2. The shopping cart is opened, here you have to ask if there is anything else to be added or continue to checkout. Do a recap and summary.",
    "3. The customer accepted to continue with the payment, so the modal with the customer information and payment method is shown. Here YOU WILL ASK for the name, phone, email and credit card information to help the customer fill this form. (ALWAYS the payment will be with card. Never ask for other payment options; if the customer asks, explain that you can only accept credit card.)",
    "4. The customer completed the necessary information, ask to check if everything is correct",
    "5. The customer successfully placed the order. Explain that the order will arrive soon, and ask them to check the email and contact phone to track the order",
];

fn build_prompt(items: &[MenuItem]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| {
            let mut line = format!("- {} — ${:.2}", item.name, item.price);
            if !item.description.is_empty() {
                line.push_str(&format!(": {}", item.description));
            }
            if !item.ingredients.is_empty() {
                line.push_str(&format!(" (ingredients: {})", item.ingredients));
            }
            line
        })
        .collect();

    let menu_block = if lines.is_empty() {
        "- (empty menu)".to_owned()
    } else {
        lines.join("\n")
    };

    format!("{}\n\nMenu:\n{}", PROMPT_HEADER.join("\n"), menu_block)
}
