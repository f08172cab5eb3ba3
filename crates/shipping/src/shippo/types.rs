//! Shippo REST API request and response types.
//!
//! These types represent the subset of the Shippo object model the
//! checkout pipeline needs. Unknown response fields are ignored.
//!
//! See: <https://docs.goshippo.com/shippoapi/public-api/>

use core::fmt;

use dulocart_core::{DistanceUnit, MassUnit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /addresses/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub email: String,
    pub phone: String,
    /// Ask Shippo to verify deliverability while creating the address.
    pub validate: bool,
}

/// A parcel entry inside a shipment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelRequest {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub distance_unit: DistanceUnit,
    pub weight: Decimal,
    pub mass_unit: MassUnit,
}

/// Body of `POST /shipments/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    /// Object id of the origin address.
    pub address_from: String,
    /// Object id of the destination address.
    pub address_to: String,
    pub parcels: Vec<ParcelRequest>,
    /// `false` makes Shippo return rates in the same response.
    #[serde(rename = "async")]
    pub is_async: bool,
}

/// Body of `POST /transactions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Object id of the rate to purchase.
    pub rate: String,
    #[serde(rename = "async")]
    pub is_async: bool,
}

// =============================================================================
// Responses
// =============================================================================

/// A message attached to an address, shipment or transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApiMessage {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, &self.code) {
            (Some(source), Some(code)) => write!(f, "[{source} {code}] {}", self.text),
            (Some(tag), None) | (None, Some(tag)) => write!(f, "[{tag}] {}", self.text),
            (None, None) => f.write_str(&self.text),
        }
    }
}

/// Render a message list for error reporting.
#[must_use]
pub fn message_texts(messages: &[ApiMessage]) -> Vec<String> {
    messages.iter().map(ToString::to_string).collect()
}

/// Result of Shippo's address verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationResults {
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}

/// Address object returned by `POST /addresses/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub object_id: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub validation_results: Option<ValidationResults>,
}

impl Address {
    /// Only an explicit positive verdict counts as valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_results
            .as_ref()
            .and_then(|results| results.is_valid)
            .unwrap_or(false)
    }

    /// Validation messages, if any were returned.
    #[must_use]
    pub fn validation_messages(&self) -> &[ApiMessage] {
        self.validation_results
            .as_ref()
            .map_or(&[], |results| results.messages.as_slice())
    }
}

/// Carrier service level attached to a rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceLevel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
}

/// A priced shipping option for a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub object_id: String,
    pub shipment: String,
    /// Price in the carrier's currency.
    pub amount: Decimal,
    pub currency: String,
    /// Price in the currency the rates were requested in.
    pub amount_local: Decimal,
    pub currency_local: String,
    pub provider: String,
    #[serde(default)]
    pub servicelevel: ServiceLevel,
    #[serde(default)]
    pub estimated_days: Option<u32>,
}

/// Shipment object returned by `POST /shipments/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub object_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rates: Vec<Rate>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}

/// Paginated list returned by `GET /shipments/{id}/rates/{currency}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateList {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Rate>,
}

/// Lifecycle state of a label purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Waiting,
    Queued,
    Success,
    Error,
    Refunded,
    Refundpending,
    Refundrejected,
    #[serde(other)]
    Unknown,
}

/// Transaction object returned by `POST /transactions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub object_id: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url_provider: Option<String>,
    #[serde(default)]
    pub label_url: Option<String>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}
