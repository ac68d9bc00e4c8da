//! Order flow status for one client.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One client's position in the ordering flow.
///
/// Serialized as the bare step number (0..5) so push payloads and API
/// responses stay wire-compatible with the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// 0 - the cart is empty.
    CartEmpty,
    /// 1 - the cart has items.
    CartFilled,
    /// 2 - the cart view is open.
    CartOpen,
    /// 3 - the checkout form is open but incomplete.
    CheckoutOpen,
    /// 4 - the checkout form validates, ready to finalize.
    CheckoutReady,
    /// 5 - the order is confirmed.
    Confirmed,
}

impl OrderStatus {
    /// Wire representation of the step.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::CartEmpty => 0,
            Self::CartFilled => 1,
            Self::CartOpen => 2,
            Self::CheckoutOpen => 3,
            Self::CheckoutReady => 4,
            Self::Confirmed => 5,
        }
    }

    /// Status for a client that was never explicitly touched: derived
    /// from whether their cart is empty.
    #[must_use]
    pub const fn derived(cart_empty: bool) -> Self {
        if cart_empty {
            Self::CartEmpty
        } else {
            Self::CartFilled
        }
    }

    /// Human-readable step description, used in agent instructions.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CartEmpty => "0 (cart empty)",
            Self::CartFilled => "1 (cart has items)",
            Self::CartOpen => "2 (cart modal open)",
            Self::CheckoutOpen => "3 (checkout form open)",
            Self::CheckoutReady => "4 (checkout valid, ready to finalize)",
            Self::Confirmed => "5 (order confirmation open)",
        }
    }
}

impl TryFrom<u8> for OrderStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::CartEmpty),
            1 => Ok(Self::CartFilled),
            2 => Ok(Self::CartOpen),
            3 => Ok(Self::CheckoutOpen),
            4 => Ok(Self::CheckoutReady),
            5 => Ok(Self::Confirmed),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::try_from(value)
            .map_err(|v| serde::de::Error::custom(format!("order status out of range: {v}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_number() {
        for n in 0..=5_u8 {
            let status = OrderStatus::try_from(n).unwrap();
            assert_eq!(status.as_u8(), n);
            assert_eq!(serde_json::to_string(&status).unwrap(), n.to_string());
        }
        assert!(OrderStatus::try_from(6).is_err());
    }

    #[test]
    fn derives_initial_status_from_cart() {
        assert_eq!(OrderStatus::derived(true), OrderStatus::CartEmpty);
        assert_eq!(OrderStatus::derived(false), OrderStatus::CartFilled);
    }
}
