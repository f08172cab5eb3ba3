//! Postal addresses supplied by the checkout domain.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// What an address is used for on a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    #[default]
    Shipping,
    Billing,
}

/// A postal address as the checkout domain stores it.
///
/// No field is checked locally. Deliverability is decided by the carrier
/// API when the address is submitted for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub name: String,
    /// Company name; sent only when the address is the shipment origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street1: String,
    #[serde(default)]
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    /// ISO 3166 alpha-2 country code.
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub primary: bool,
}

impl Address {
    /// Returns true for the customer's default delivery address.
    #[must_use]
    pub fn is_primary_shipping(&self) -> bool {
        self.primary && self.address_type == AddressType::Shipping
    }
}
