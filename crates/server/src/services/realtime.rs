//! Realtime session negotiation against the third-party voice API.
//!
//! The negotiation call is read-only with respect to every client store:
//! state is composed into the instruction text before the request starts,
//! no lock is held across it, and a failure surfaces to the caller
//! without touching carts, statuses or prefill.

use mesa_core::cart::{self, CartLine};
use mesa_core::status::OrderStatus;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument;

use crate::config::ServerConfig;

/// Errors from the negotiation round trip.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Transport failure or timeout before an upstream status arrived.
    #[error("realtime request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with an error status.
    #[error("{status}: {body}")]
    Upstream { status: u16, body: String },

    /// No API key was configured for this deployment.
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,
}

/// Client for the realtime sessions endpoint.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
}

impl RealtimeClient {
    /// Create a client with the configured negotiation timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.realtime_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.realtime_url.clone(),
            api_key: config.openai_api_key.clone(),
        })
    }

    /// Negotiate a session and return the opaque upstream payload.
    ///
    /// # Errors
    ///
    /// Fails when no API key is configured, the transport errors out or
    /// times out, or the upstream answers with a status >= 400.
    #[instrument(skip(self, instructions, tools))]
    pub async fn negotiate(
        &self,
        model: &str,
        voice: &str,
        instructions: &str,
        tools: Value,
    ) -> Result<Value, RealtimeError> {
        let api_key = self.api_key.as_ref().ok_or(RealtimeError::MissingApiKey)?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key.expose_secret())
            .header("OpenAI-Beta", "realtime=v1")
            .json(&json!({
                "model": model,
                "voice": voice,
                "instructions": instructions,
                "tools": tools,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(RealtimeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Compose the full instruction text for one client: catalog prompt plus
/// their current cart block and order status line.
#[must_use]
pub fn compose_instructions(
    catalog_prompt: &str,
    cart: &[CartLine],
    status: OrderStatus,
) -> String {
    let cart_block = if cart.is_empty() {
        "(empty cart)".to_owned()
    } else {
        let lines: Vec<String> = cart
            .iter()
            .map(|line| format!("- {} x{} — ${:.2} each", line.name, line.qty, line.price))
            .collect();
        format!("{}\nCurrent total: ${:.2}", lines.join("\n"), cart::total(cart))
    };

    format!(
        "{catalog_prompt}\n\nCurrent customer cart:\n{cart_block}\n\nCurrent order status:\n- {}",
        status.describe()
    )
}

/// The fixed tool schema advertised to the realtime agent.
#[must_use]
pub fn session_tools() -> Value {
    json!([
        {
            "type": "function",
            "name": "update_front",
            "description": "Update the client UI to show only the given item names in real time, and include a short reply to speak to the user.",
            "parameters": {
                "type": "object",
                "properties": {
                    "names": {"type": "array", "items": {"type": "string"}},
                    "reply": {"type": "string"}
                },
                "required": ["names", "reply"]
            }
        },
        {
            "type": "function",
            "name": "update_cart",
            "description": "Add/remove items in the user's cart, or clear it. Use `action`: 'apply' (default) or 'clear'. Always include a short `reply` when appropriate.",
            "parameters": {
                "type": "object",
                "properties": {
                    "action": {"type": "string", "enum": ["apply", "clear"]},
                    "ops": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "op": {"type": "string", "enum": ["add", "remove", "set", "clear"]},
                                "name": {"type": "string"},
                                "qty": {"type": "integer", "minimum": 0}
                            },
                            "required": ["op"]
                        }
                    },
                    "reply": {"type": "string"}
                }
            }
        },
        {
            "type": "function",
            "name": "get_cart",
            "description": "Return the current cart state with item names, qty, unit prices and total. Always include a short reply.",
            "parameters": {
                "type": "object",
                "properties": {
                    "reply": {"type": "string"}
                }
            }
        },
        {
            "type": "function",
            "name": "get_order_status",
            "description": "Return current order_status (0..5). ALWAYS call this before transition_order_status.",
            "parameters": {
                "type": "object",
                "properties": {
                    "reply": {"type": "string"}
                }
            }
        },
        {
            "type": "function",
            "name": "transition_order_status",
            "description": "Advance or adjust the order flow UI for the current customer (0:empty, 1:cart-with-items, 2:cart-open, 3:checkout-open, 4:checkout-valid, 5:success). Optionally include 'prefill' when to is 3 or 4. Always include a short 'reply'.",
            "parameters": {
                "type": "object",
                "properties": {
                    "to": {"type": "integer", "enum": [0, 1, 2, 3, 4, 5]},
                    "prefill": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "phone": {"type": "string"},
                            "email": {"type": "string"},
                            "card": {"type": "string"},
                            "exp": {"type": "string"},
                            "cvv": {"type": "string"}
                        }
                    },
                    "reply": {"type": "string"}
                },
                "required": ["to", "reply"]
            }
        }
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_cart_and_status() {
        let cart = vec![
            CartLine {
                name: "Margherita".to_owned(),
                price: 8.5,
                img_ref: String::new(),
                qty: 2,
            },
            CartLine {
                name: "Pad Thai".to_owned(),
                price: 11.0,
                img_ref: String::new(),
                qty: 1,
            },
        ];
        let text = compose_instructions("MENU PROMPT", &cart, OrderStatus::CartOpen);

        assert!(text.starts_with("MENU PROMPT"));
        assert!(text.contains("- Margherita x2 — $8.50 each"));
        assert!(text.contains("Current total: $28.00"));
        assert!(text.contains("- 2 (cart modal open)"));
    }

    #[test]
    fn empty_cart_renders_placeholder() {
        let text = compose_instructions("P", &[], OrderStatus::CartEmpty);
        assert!(text.contains("(empty cart)"));
        assert!(text.contains("- 0 (cart empty)"));
    }

    #[test]
    fn tool_schema_names_the_five_tools() {
        let tools = session_tools();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "update_front",
                "update_cart",
                "get_cart",
                "get_order_status",
                "transition_order_status"
            ]
        );
    }
}
