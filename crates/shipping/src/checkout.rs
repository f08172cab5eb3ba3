//! Checkout orchestration.
//!
//! Pulls the destination and cart weight out of a checkout, runs the
//! shipping pipeline and merges the result back. Records are plain data;
//! persisting them is the caller's job.

use chrono::{DateTime, Utc};
use dulocart_core::{
    Address, CheckoutId, CurrencyCode, CustomerId, OrderId, Price, QuotedRate, ShippingLabel,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::error::ShippingError;
use crate::parcel::ParcelTemplate;
use crate::pipeline;
use crate::shippo::ShippingApi;

/// Errors raised while quoting or submitting a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Checkout {0} has no shipping address")]
    MissingShippingAddress(CheckoutId),

    #[error("Checkout {0} has no quoted delivery rate")]
    NotQuoted(CheckoutId),

    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

/// A line in the cart. Only weight matters for shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub quantity: u32,
    /// Weight of one unit, in the parcel template's mass unit.
    pub unit_weight: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Aggregate weight of every unit in the cart.
    #[must_use]
    pub fn weight(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_weight * Decimal::from(item.quantity))
            .sum()
    }
}

/// A checkout in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub id: CheckoutId,
    pub customer_id: CustomerId,
    /// Saved addresses of the customer; the primary shipping one wins.
    #[serde(default)]
    pub customer_addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<QuotedRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_at: Option<DateTime<Utc>>,
}

impl Checkout {
    /// The address the order ships to.
    #[must_use]
    pub fn destination(&self) -> Option<&Address> {
        self.customer_addresses
            .iter()
            .find(|address| address.is_primary_shipping())
            .or(self.shipping_address.as_ref())
    }
}

/// A confirmed order with its purchased label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub checkout_id: CheckoutId,
    pub customer_id: CustomerId,
    pub shipping_address: Address,
    pub cart: Cart,
    pub delivery_cost: Price,
    pub delivery_rate: QuotedRate,
    pub label: ShippingLabel,
    pub purchased_at: DateTime<Utc>,
}

/// Runs the shipping pipeline for checkouts shipped from one origin.
#[derive(Debug, Clone)]
pub struct CheckoutService<A> {
    api: A,
    origin: Address,
    parcel: ParcelTemplate,
    currency: CurrencyCode,
}

impl<A: ShippingApi> CheckoutService<A> {
    #[must_use]
    pub const fn new(
        api: A,
        origin: Address,
        parcel: ParcelTemplate,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            api,
            origin,
            parcel,
            currency,
        }
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn origin(&self) -> &Address {
        &self.origin
    }

    /// Quote delivery for a checkout and store the rate on it.
    ///
    /// The checkout is only modified when the quote succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingShippingAddress` when there is nowhere
    /// to ship, or the pipeline error wrapped in `CheckoutError::Shipping`.
    #[instrument(skip_all, fields(checkout_id = %checkout.id))]
    pub async fn get_quote(&self, checkout: &mut Checkout) -> Result<QuotedRate, CheckoutError> {
        let destination = checkout
            .destination()
            .cloned()
            .ok_or(CheckoutError::MissingShippingAddress(checkout.id))?;
        let parcels = self.parcel.parcels_for_weight(checkout.cart.weight());

        let rate = pipeline::quote(
            &self.api,
            &self.origin,
            &destination,
            &parcels,
            self.currency,
        )
        .await?;

        info!(
            rate_id = %rate.rate_id,
            cost = %rate.price.display(),
            "Checkout delivery quoted"
        );

        checkout.shipping_address = Some(destination);
        checkout.delivery = Some(rate.clone());
        checkout.quoted_at = Some(Utc::now());

        Ok(rate)
    }

    /// Convert a quoted checkout into an order and buy its label.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotQuoted` when the checkout has no rate,
    /// `CheckoutError::MissingShippingAddress` when it has no destination,
    /// or the pipeline error wrapped in `CheckoutError::Shipping`.
    #[instrument(skip_all, fields(checkout_id = %checkout.id, order_id = %order_id))]
    pub async fn submit_order(
        &self,
        checkout: &Checkout,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let rate = checkout
            .delivery
            .as_ref()
            .ok_or(CheckoutError::NotQuoted(checkout.id))?;
        let destination = checkout
            .shipping_address
            .as_ref()
            .or_else(|| checkout.destination())
            .ok_or(CheckoutError::MissingShippingAddress(checkout.id))?;
        let parcels = self.parcel.parcels_for_weight(checkout.cart.weight());

        let label =
            pipeline::purchase(&self.api, &self.origin, destination, &parcels, rate).await?;

        info!(
            carrier = %label.carrier(),
            tracking_number = %label.tracking_number(),
            "Order label attached"
        );

        Ok(Order {
            id: order_id,
            checkout_id: checkout.id,
            customer_id: checkout.customer_id,
            shipping_address: destination.clone(),
            cart: checkout.cart.clone(),
            delivery_cost: rate.price,
            delivery_rate: rate.clone(),
            label,
            purchased_at: Utc::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dulocart_core::AddressType;

    use super::*;
    use crate::shippo::InMemoryShippo;
    use crate::shippo::memory::{RateOffer, RecordedCall};

    fn address(name: &str, zip: &str, address_type: AddressType, primary: bool) -> Address {
        Address {
            id: None,
            name: name.to_string(),
            company: None,
            street1: "500 Terry Francois St".to_string(),
            street2: String::new(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip: zip.to_string(),
            country: "US".to_string(),
            email: String::new(),
            phone: String::new(),
            address_type,
            primary,
        }
    }

    fn warehouse() -> Address {
        Address {
            company: Some("Dulocart".to_string()),
            ..address("Shipping Desk", "94103", AddressType::Shipping, true)
        }
    }

    fn checkout() -> Checkout {
        Checkout {
            id: CheckoutId::new(7),
            customer_id: CustomerId::new(42),
            customer_addresses: vec![
                address("Ada", "10001", AddressType::Billing, true),
                address("Ada", "94107", AddressType::Shipping, true),
                address("Ada", "60601", AddressType::Shipping, false),
            ],
            shipping_address: None,
            cart: Cart {
                items: vec![
                    CartItem {
                        product_id: Some("tea-tin".to_string()),
                        quantity: 3,
                        unit_weight: Decimal::new(50, 2),
                    },
                    CartItem {
                        product_id: None,
                        quantity: 1,
                        unit_weight: Decimal::new(25, 2),
                    },
                ],
            },
            delivery: None,
            quoted_at: None,
        }
    }

    fn service(shippo: InMemoryShippo) -> CheckoutService<InMemoryShippo> {
        CheckoutService::new(
            shippo,
            warehouse(),
            ParcelTemplate::default(),
            CurrencyCode::USD,
        )
    }

    fn offers() -> Vec<RateOffer> {
        vec![
            RateOffer::new("UPS", "ups_ground", Decimal::new(820, 2)),
            RateOffer::new("USPS", "usps_priority", Decimal::new(510, 2)),
        ]
    }

    #[test]
    fn test_cart_weight_sums_units() {
        assert_eq!(checkout().cart.weight(), Decimal::new(175, 2));
        assert_eq!(Cart::default().weight(), Decimal::ZERO);
    }

    #[test]
    fn test_destination_prefers_primary_shipping() {
        let mut checkout = checkout();
        checkout.shipping_address = Some(address("Ada", "73301", AddressType::Shipping, false));
        assert_eq!(checkout.destination().unwrap().zip, "94107");

        checkout.customer_addresses.clear();
        assert_eq!(checkout.destination().unwrap().zip, "73301");
    }

    #[tokio::test]
    async fn test_get_quote_stores_cheapest_rate() {
        let service = service(InMemoryShippo::with_offers(offers()));
        let mut checkout = checkout();

        let rate = service.get_quote(&mut checkout).await.unwrap();

        assert_eq!(rate.provider, "USPS");
        assert_eq!(checkout.delivery.as_ref(), Some(&rate));
        assert_eq!(checkout.shipping_address.as_ref().unwrap().zip, "94107");
        assert!(checkout.quoted_at.is_some());

        // Customer is the destination, the warehouse the origin.
        let calls = service.api().calls();
        assert_eq!(
            calls.first(),
            Some(&RecordedCall::CreateAddress {
                zip: "94107".to_string(),
                validate: true
            })
        );
        assert_eq!(
            calls.get(1),
            Some(&RecordedCall::CreateAddress {
                zip: "94103".to_string(),
                validate: true
            })
        );
    }

    #[tokio::test]
    async fn test_get_quote_without_address() {
        let service = service(InMemoryShippo::with_offers(offers()));
        let mut checkout = checkout();
        checkout.customer_addresses.clear();

        let result = service.get_quote(&mut checkout).await;

        assert!(matches!(
            result,
            Err(CheckoutError::MissingShippingAddress(id)) if id == CheckoutId::new(7)
        ));
        assert!(service.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_quote_leaves_checkout_untouched() {
        let shippo = InMemoryShippo::with_offers(offers());
        shippo.reject_zip("94107");
        let service = service(shippo);
        let mut checkout = checkout();
        let before = checkout.clone();

        let result = service.get_quote(&mut checkout).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Shipping(ShippingError::InvalidAddress { .. }))
        ));
        assert_eq!(checkout, before);
    }

    #[tokio::test]
    async fn test_submit_order_attaches_label() {
        let service = service(InMemoryShippo::with_offers(offers()));
        let mut checkout = checkout();
        let rate = service.get_quote(&mut checkout).await.unwrap();

        let order = service
            .submit_order(&checkout, OrderId::new(1001))
            .await
            .unwrap();

        assert_eq!(order.id, OrderId::new(1001));
        assert_eq!(order.checkout_id, checkout.id);
        assert_eq!(order.customer_id, CustomerId::new(42));
        assert_eq!(order.delivery_cost, rate.price);
        assert_eq!(order.delivery_rate, rate);
        assert_eq!(
            service.api().calls().last(),
            Some(&RecordedCall::CreateTransaction {
                rate_id: order.delivery_rate.rate_id.clone()
            })
        );
        assert_eq!(order.shipping_address.zip, "94107");
        assert_eq!(order.label.carrier(), "USPS");
        assert!(!order.label.tracking_number().is_empty());
        assert!(!order.label.tracking_url().is_empty());
        assert!(!order.label.label_url().is_empty());
    }

    #[tokio::test]
    async fn test_submit_order_requires_quote() {
        let service = service(InMemoryShippo::with_offers(offers()));

        let result = service.submit_order(&checkout(), OrderId::new(1)).await;

        assert!(matches!(result, Err(CheckoutError::NotQuoted(_))));
        assert!(service.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_order_with_stale_rate() {
        let shippo = InMemoryShippo::with_offers(offers());
        let service = service(shippo.clone());
        let mut checkout = checkout();
        let rate = service.get_quote(&mut checkout).await.unwrap();

        // Same carrier service, repriced under a new rate id.
        shippo.set_offers(vec![RateOffer::new(
            "USPS",
            "usps_priority",
            Decimal::new(990, 2),
        )]);
        let result = service.submit_order(&checkout, OrderId::new(2)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Shipping(ShippingError::RateNotFound { ref rate_id }))
                if *rate_id == rate.rate_id
        ));
        assert!(
            !service
                .api()
                .calls()
                .iter()
                .any(|call| matches!(call, RecordedCall::CreateTransaction { .. }))
        );
    }
}
