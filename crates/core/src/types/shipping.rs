//! Quoted rates and purchased labels.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// A priced shipping option returned for a specific shipment.
///
/// The `rate_id` is an opaque carrier-API reference. It stays valid until
/// a label is purchased against it; freshness is not tracked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedRate {
    pub rate_id: String,
    /// Remote shipment the rate was quoted for.
    pub shipment_id: String,
    /// Carrier name (e.g., "USPS").
    pub provider: String,
    pub service_level_name: String,
    /// Stable carrier service identifier (e.g., `usps_priority`).
    pub service_level_token: String,
    /// Price in the currency the quote was requested in.
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<u32>,
}

/// Tracking details captured after a successful label purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLabel {
    carrier: String,
    tracking_number: String,
    tracking_url: String,
    label_url: String,
}

impl ShippingLabel {
    #[must_use]
    pub const fn new(
        carrier: String,
        tracking_number: String,
        tracking_url: String,
        label_url: String,
    ) -> Self {
        Self {
            carrier,
            tracking_number,
            tracking_url,
            label_url,
        }
    }

    #[must_use]
    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    #[must_use]
    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    #[must_use]
    pub fn tracking_url(&self) -> &str {
        &self.tracking_url
    }

    /// URL of the printable label.
    #[must_use]
    pub fn label_url(&self) -> &str {
        &self.label_url
    }
}
