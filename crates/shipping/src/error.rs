//! Shipping pipeline errors.

use thiserror::Error;

/// Errors that can occur while quoting or purchasing shipping.
///
/// The first group originates at the Shippo API and is propagated unchanged.
/// The second group is raised locally from response contents.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// Could not reach Shippo (DNS, TLS, connect, timeout).
    #[error("Shippo connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// Shippo rejected the API key.
    #[error("Shippo authentication failed: {0}")]
    Authentication(String),

    /// Shippo rejected the request parameters.
    #[error("Invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// Rate limited by Shippo.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("Shippo API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Shippo's address validation says the address is not deliverable.
    #[error("The provided address is invalid (zip {zip}): {}", .messages.join("; "))]
    InvalidAddress { zip: String, messages: Vec<String> },

    /// No rate with this id on the shipment.
    #[error("Shippo rate with id {rate_id} not found, request another rate")]
    RateNotFound { rate_id: String },

    /// The label purchase did not report success.
    #[error("Label purchase failed: {}", .messages.join("; "))]
    TransactionFailed { messages: Vec<String> },

    /// Shippo returned no rates for the shipment.
    #[error("No rates available for shipment {shipment_id}")]
    NoRatesAvailable { shipment_id: String },
}

impl ShippingError {
    /// Whether the failure was reported by the remote service rather than
    /// raised from a response the service accepted.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Authentication(_)
                | Self::InvalidRequest { .. }
                | Self::RateLimited(_)
                | Self::Api { .. }
                | Self::Parse(_)
        )
    }
}

impl From<reqwest::Error> for ShippingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Connection(err)
        }
    }
}

impl From<serde_json::Error> for ShippingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_display_names_zip() {
        let err = ShippingError::InvalidAddress {
            zip: "00000".to_string(),
            messages: vec!["Address not found".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "The provided address is invalid (zip 00000): Address not found"
        );
    }

    #[test]
    fn test_rate_not_found_display_names_id() {
        let err = ShippingError::RateNotFound {
            rate_id: "rate_abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shippo rate with id rate_abc not found, request another rate"
        );
    }

    #[test]
    fn test_transaction_failed_joins_messages() {
        let err = ShippingError::TransactionFailed {
            messages: vec!["Rate expired".to_string(), "Try again".to_string()],
        };
        assert_eq!(err.to_string(), "Label purchase failed: Rate expired; Try again");
    }

    #[test]
    fn test_is_remote() {
        assert!(ShippingError::Authentication("bad key".to_string()).is_remote());
        assert!(ShippingError::RateLimited(60).is_remote());
        assert!(
            ShippingError::InvalidRequest {
                status: 400,
                message: "bad".to_string()
            }
            .is_remote()
        );
        assert!(
            !ShippingError::RateNotFound {
                rate_id: "x".to_string()
            }
            .is_remote()
        );
        assert!(
            !ShippingError::TransactionFailed { messages: vec![] }.is_remote()
        );
        assert!(
            !ShippingError::NoRatesAvailable {
                shipment_id: "shp".to_string()
            }
            .is_remote()
        );
    }
}
