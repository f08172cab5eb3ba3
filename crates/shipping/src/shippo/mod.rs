//! Shippo shipping API access.
//!
//! Provides the [`ShippingApi`] seam the pipeline is written against and the
//! [`ShippoClient`] implementation over HTTP. An in-memory double is
//! available under the `test-util` feature.
//!
//! # Architecture
//!
//! - REST + JSON, authenticated with `Authorization: ShippoToken <key>`
//! - API version pinned via the `Shippo-API-Version` header
//! - Every call is synchronous from Shippo's point of view (`async: false`),
//!   so rates and labels come back in the creating response
//! - No retries: remote failures surface immediately

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod types;

pub use client::ShippoClient;
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryShippo;
pub use types::*;

use async_trait::async_trait;
use dulocart_core::CurrencyCode;

use crate::error::ShippingError;

/// Remote operations the shipping pipeline needs.
#[async_trait]
pub trait ShippingApi: Send + Sync {
    /// Create (and validate) an address.
    async fn create_address(&self, request: &AddressRequest) -> Result<Address, ShippingError>;

    /// Create a shipment between two previously created addresses.
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, ShippingError>;

    /// List the rates of a shipment priced in `currency`.
    async fn shipment_rates(
        &self,
        shipment_id: &str,
        currency: CurrencyCode,
    ) -> Result<Vec<Rate>, ShippingError>;

    /// Purchase a label against a rate.
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ShippingError>;
}
