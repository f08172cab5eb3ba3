//! Address and parcel payload construction.
//!
//! Domain records are mapped field-for-field. Nothing is checked locally:
//! every address is sent with `validate: true` and Shippo's verdict decides.

use dulocart_core::{Address, ParcelInfo};
use tracing::{instrument, warn};

use crate::error::ShippingError;
use crate::shippo::{self, AddressRequest, ParcelRequest, ShippingApi, message_texts};

/// Which end of the shipment an address is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    /// Sender; carries the company name.
    Origin,
    Destination,
}

/// Build the Shippo address payload for a domain address.
#[must_use]
pub fn address_request(address: &Address, role: AddressRole) -> AddressRequest {
    let company = match role {
        AddressRole::Origin => address.company.clone(),
        AddressRole::Destination => None,
    };

    AddressRequest {
        name: address.name.clone(),
        company,
        street1: address.street1.clone(),
        street2: address.street2.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        zip: address.zip.clone(),
        country: address.country.clone(),
        email: address.email.clone(),
        phone: address.phone.clone(),
        validate: true,
    }
}

/// Build one parcel payload per parcel, preserving order.
#[must_use]
pub fn parcel_requests(parcels: &[ParcelInfo]) -> Vec<ParcelRequest> {
    parcels
        .iter()
        .map(|parcel| ParcelRequest {
            length: parcel.length,
            width: parcel.width,
            height: parcel.height,
            distance_unit: parcel.distance_unit,
            weight: parcel.weight,
            mass_unit: parcel.mass_unit,
        })
        .collect()
}

/// Create an address remotely and fail unless Shippo marks it valid.
///
/// # Errors
///
/// Returns `ShippingError::InvalidAddress` carrying the postal code when
/// validation fails, or the remote error unchanged.
#[instrument(skip(api, address), fields(zip = %address.zip))]
pub async fn create_validated_address<A>(
    api: &A,
    address: &Address,
    role: AddressRole,
) -> Result<shippo::Address, ShippingError>
where
    A: ShippingApi + ?Sized,
{
    let created = api.create_address(&address_request(address, role)).await?;

    if !created.is_valid() {
        let zip = if created.zip.is_empty() {
            address.zip.clone()
        } else {
            created.zip.clone()
        };
        let messages = message_texts(created.validation_messages());
        warn!(zip = %zip, ?role, ?messages, "Address failed validation");
        return Err(ShippingError::InvalidAddress { zip, messages });
    }

    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dulocart_core::{AddressType, DistanceUnit, MassUnit};
    use rust_decimal::Decimal;

    use super::*;
    use crate::shippo::InMemoryShippo;
    use crate::shippo::memory::RecordedCall;

    fn warehouse() -> Address {
        Address {
            id: None,
            name: "Shipping Desk".to_string(),
            company: Some("Dulocart".to_string()),
            street1: "965 Mission St".to_string(),
            street2: "Suite 480".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip: "94103".to_string(),
            country: "US".to_string(),
            email: "ship@dulocart.example".to_string(),
            phone: "+1 415 555 0100".to_string(),
            address_type: AddressType::Shipping,
            primary: true,
        }
    }

    #[test]
    fn test_address_request_maps_fields_and_validates() {
        let request = address_request(&warehouse(), AddressRole::Origin);

        assert_eq!(request.name, "Shipping Desk");
        assert_eq!(request.company.as_deref(), Some("Dulocart"));
        assert_eq!(request.street1, "965 Mission St");
        assert_eq!(request.street2, "Suite 480");
        assert_eq!(request.city, "San Francisco");
        assert_eq!(request.state, "CA");
        assert_eq!(request.zip, "94103");
        assert_eq!(request.country, "US");
        assert_eq!(request.email, "ship@dulocart.example");
        assert_eq!(request.phone, "+1 415 555 0100");
        assert!(request.validate);
    }

    #[test]
    fn test_destination_drops_company() {
        let request = address_request(&warehouse(), AddressRole::Destination);
        assert_eq!(request.company, None);
        assert!(request.validate);
    }

    #[test]
    fn test_parcel_requests_preserve_order_and_fields() {
        let parcels: Vec<ParcelInfo> = (1..=4)
            .map(|i| ParcelInfo {
                length: Decimal::from(i * 10),
                width: Decimal::from(i * 5),
                height: Decimal::from(i),
                distance_unit: if i % 2 == 0 {
                    DistanceUnit::Cm
                } else {
                    DistanceUnit::In
                },
                weight: Decimal::new(i * 125, 2),
                mass_unit: if i % 2 == 0 { MassUnit::Kg } else { MassUnit::Lb },
            })
            .collect();

        let requests = parcel_requests(&parcels);

        assert_eq!(requests.len(), parcels.len());
        for (parcel, request) in parcels.iter().zip(&requests) {
            assert_eq!(request.length, parcel.length);
            assert_eq!(request.width, parcel.width);
            assert_eq!(request.height, parcel.height);
            assert_eq!(request.distance_unit, parcel.distance_unit);
            assert_eq!(request.weight, parcel.weight);
            assert_eq!(request.mass_unit, parcel.mass_unit);
        }
    }

    #[test]
    fn test_parcel_requests_empty() {
        assert!(parcel_requests(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_create_validated_address_accepts_valid() {
        let shippo = InMemoryShippo::default();
        let created = create_validated_address(&shippo, &warehouse(), AddressRole::Origin)
            .await
            .unwrap();

        assert!(created.is_valid());
        assert_eq!(
            shippo.calls(),
            vec![RecordedCall::CreateAddress {
                zip: "94103".to_string(),
                validate: true
            }]
        );
    }

    #[tokio::test]
    async fn test_create_validated_address_rejects_with_zip() {
        let shippo = InMemoryShippo::default();
        shippo.reject_zip("94103");

        let result =
            create_validated_address(&shippo, &warehouse(), AddressRole::Destination).await;

        match result {
            Err(ShippingError::InvalidAddress { zip, messages }) => {
                assert_eq!(zip, "94103");
                assert_eq!(messages.len(), 1);
            }
            other => panic!("expected InvalidAddress, got {other:?}"),
        }
    }
}
