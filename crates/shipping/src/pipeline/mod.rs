//! Address → parcel → rate → label pipeline.
//!
//! - [`quote`] prices a cart and returns the cheapest rate
//! - [`purchase`] buys a label against a previously quoted rate
//!
//! Both create their own remote shipment; nothing is cached between calls.

pub mod builder;
pub mod purchase;
pub mod quote;

pub use builder::{AddressRole, address_request, create_validated_address, parcel_requests};
pub use purchase::{find_rate, label_from_transaction, purchase};
pub use quote::{quote, quoted_rate, select_cheapest};

use dulocart_core::{Address, ParcelInfo};
use tracing::debug;

use crate::error::ShippingError;
use crate::shippo::{Shipment, ShipmentRequest, ShippingApi};

/// Validate both addresses and create a shipment between them.
///
/// The destination is validated first; an invalid address stops the
/// pipeline before any shipment exists.
async fn create_shipment<A>(
    api: &A,
    from: &Address,
    to: &Address,
    parcels: &[ParcelInfo],
) -> Result<Shipment, ShippingError>
where
    A: ShippingApi + ?Sized,
{
    let address_to = create_validated_address(api, to, AddressRole::Destination).await?;
    let address_from = create_validated_address(api, from, AddressRole::Origin).await?;

    let request = ShipmentRequest {
        address_from: address_from.object_id,
        address_to: address_to.object_id,
        parcels: parcel_requests(parcels),
        is_async: false,
    };

    let shipment = api.create_shipment(&request).await?;
    debug!(shipment_id = %shipment.object_id, "Shipment ready");
    Ok(shipment)
}
