//! Label purchase.

use dulocart_core::{Address, ParcelInfo, QuotedRate, ShippingLabel};
use tracing::{info, instrument, warn};

use super::create_shipment;
use crate::error::ShippingError;
use crate::shippo::{Rate, ShippingApi, Transaction, TransactionRequest, TransactionStatus, message_texts};

/// Look up a rate by id in a shipment's rate list.
///
/// Only the exact id counts; another rate for the same carrier service is
/// never substituted.
///
/// # Errors
///
/// Returns `ShippingError::RateNotFound` naming `rate_id` when the list has
/// no such rate.
pub fn find_rate<'a>(rates: &'a [Rate], rate_id: &str) -> Result<&'a Rate, ShippingError> {
    rates
        .iter()
        .find(|rate| rate.object_id == rate_id)
        .ok_or_else(|| ShippingError::RateNotFound {
            rate_id: rate_id.to_string(),
        })
}

/// Turn a finished transaction into a label.
///
/// # Errors
///
/// Returns `ShippingError::TransactionFailed` with Shippo's messages unless
/// the status is `SUCCESS` and the label details are present.
pub fn label_from_transaction(
    transaction: Transaction,
    carrier: &str,
) -> Result<ShippingLabel, ShippingError> {
    if transaction.status != TransactionStatus::Success {
        return Err(ShippingError::TransactionFailed {
            messages: message_texts(&transaction.messages),
        });
    }

    match (transaction.tracking_number, transaction.label_url) {
        (Some(tracking_number), Some(label_url)) => Ok(ShippingLabel::new(
            carrier.to_string(),
            tracking_number,
            transaction.tracking_url_provider.unwrap_or_default(),
            label_url,
        )),
        _ => Err(ShippingError::TransactionFailed {
            messages: vec![format!(
                "Transaction {} succeeded without a label or tracking number",
                transaction.object_id
            )],
        }),
    }
}

/// Buy a label for a previously quoted rate.
///
/// The shipment is rebuilt from scratch; the quote's shipment is not reused.
///
/// # Errors
///
/// Returns `ShippingError::InvalidAddress`, `ShippingError::RateNotFound`,
/// `ShippingError::TransactionFailed`, or the remote error unchanged.
#[instrument(skip_all, fields(rate_id = %rate.rate_id, provider = %rate.provider))]
pub async fn purchase<A>(
    api: &A,
    from: &Address,
    to: &Address,
    parcels: &[ParcelInfo],
    rate: &QuotedRate,
) -> Result<ShippingLabel, ShippingError>
where
    A: ShippingApi + ?Sized,
{
    let shipment = create_shipment(api, from, to, parcels).await?;
    let found = find_rate(&shipment.rates, &rate.rate_id).inspect_err(|_| {
        warn!(shipment_id = %shipment.object_id, "Quoted rate missing from shipment");
    })?;

    let transaction = api
        .create_transaction(&TransactionRequest {
            rate: found.object_id.clone(),
            is_async: false,
        })
        .await?;
    let transaction_id = transaction.object_id.clone();

    let label = label_from_transaction(transaction, &found.provider).inspect_err(|e| {
        warn!(transaction_id = %transaction_id, error = %e, "Label purchase failed");
    })?;

    info!(
        transaction_id = %transaction_id,
        carrier = %label.carrier(),
        tracking_number = %label.tracking_number(),
        "Shipping label purchased"
    );

    Ok(label)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dulocart_core::{AddressType, CurrencyCode, DistanceUnit, MassUnit, Price};
    use rust_decimal::Decimal;

    use super::*;
    use crate::pipeline::quote;
    use crate::shippo::InMemoryShippo;
    use crate::shippo::memory::{RateOffer, RecordedCall};
    use crate::shippo::types::{ApiMessage, ServiceLevel};

    fn address(zip: &str) -> Address {
        Address {
            id: None,
            name: "Katherine Johnson".to_string(),
            company: Some("Dulocart".to_string()),
            street1: "1 Langley Blvd".to_string(),
            street2: String::new(),
            city: "Hampton".to_string(),
            state: "VA".to_string(),
            zip: zip.to_string(),
            country: "US".to_string(),
            email: String::new(),
            phone: String::new(),
            address_type: AddressType::Shipping,
            primary: true,
        }
    }

    fn parcels() -> Vec<ParcelInfo> {
        vec![ParcelInfo {
            length: Decimal::from(10),
            width: Decimal::from(8),
            height: Decimal::from(4),
            distance_unit: DistanceUnit::In,
            weight: Decimal::from(2),
            mass_unit: MassUnit::Lb,
        }]
    }

    fn rate(id: &str, provider: &str, token: &str) -> Rate {
        Rate {
            object_id: id.to_string(),
            shipment: "shp_9".to_string(),
            amount: Decimal::new(510, 2),
            currency: "USD".to_string(),
            amount_local: Decimal::new(510, 2),
            currency_local: "USD".to_string(),
            provider: provider.to_string(),
            servicelevel: ServiceLevel {
                name: token.to_string(),
                token: token.to_string(),
            },
            estimated_days: Some(2),
        }
    }

    fn quoted(id: &str, provider: &str, token: &str) -> QuotedRate {
        QuotedRate {
            rate_id: id.to_string(),
            shipment_id: "shp_1".to_string(),
            provider: provider.to_string(),
            service_level_name: token.to_string(),
            service_level_token: token.to_string(),
            price: Price::new(Decimal::new(510, 2), CurrencyCode::USD),
            estimated_days: None,
        }
    }

    fn transaction(status: TransactionStatus) -> Transaction {
        Transaction {
            object_id: "txn_1".to_string(),
            status,
            rate: Some("rate_1".to_string()),
            tracking_number: Some("1Z999AA10123456784".to_string()),
            tracking_url_provider: Some("https://ups.example/track/1Z999AA10123456784".to_string()),
            label_url: Some("https://labels.example/1.pdf".to_string()),
            messages: vec![],
        }
    }

    #[test]
    fn test_find_rate_matches_exact_id() {
        let rates = vec![
            rate("rate_a", "USPS", "usps_priority"),
            rate("rate_b", "USPS", "usps_priority"),
        ];
        let found = find_rate(&rates, "rate_b").unwrap();
        assert_eq!(found.object_id, "rate_b");
    }

    #[test]
    fn test_find_rate_ignores_same_service_under_other_id() {
        let rates = vec![
            rate("rate_a", "UPS", "ups_ground"),
            rate("rate_b", "USPS", "usps_priority"),
        ];
        let result = find_rate(&rates, "rate_old");
        assert!(matches!(
            result,
            Err(ShippingError::RateNotFound { ref rate_id }) if rate_id == "rate_old"
        ));
    }

    #[test]
    fn test_find_rate_in_empty_list() {
        assert!(matches!(
            find_rate(&[], "rate_missing"),
            Err(ShippingError::RateNotFound { ref rate_id }) if rate_id == "rate_missing"
        ));
    }

    #[test]
    fn test_label_from_successful_transaction() {
        let label = label_from_transaction(transaction(TransactionStatus::Success), "UPS").unwrap();
        assert_eq!(label.carrier(), "UPS");
        assert_eq!(label.tracking_number(), "1Z999AA10123456784");
        assert_eq!(label.tracking_url(), "https://ups.example/track/1Z999AA10123456784");
        assert_eq!(label.label_url(), "https://labels.example/1.pdf");
    }

    #[test]
    fn test_non_success_statuses_never_yield_a_label() {
        for status in [
            TransactionStatus::Error,
            TransactionStatus::Queued,
            TransactionStatus::Waiting,
            TransactionStatus::Refunded,
            TransactionStatus::Unknown,
        ] {
            let mut txn = transaction(status);
            txn.messages = vec![ApiMessage {
                source: Some("USPS".to_string()),
                code: None,
                text: "Rate expired".to_string(),
            }];

            match label_from_transaction(txn, "USPS") {
                Err(ShippingError::TransactionFailed { messages }) => {
                    assert_eq!(messages, vec!["[USPS] Rate expired".to_string()]);
                }
                other => panic!("expected TransactionFailed for {status:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_success_without_label_fails() {
        let mut txn = transaction(TransactionStatus::Success);
        txn.label_url = None;
        assert!(matches!(
            label_from_transaction(txn, "UPS"),
            Err(ShippingError::TransactionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_purchase_after_quote() {
        let shippo = InMemoryShippo::with_offers(vec![
            RateOffer::new("UPS", "ups_ground", Decimal::new(820, 2)),
            RateOffer::new("USPS", "usps_priority", Decimal::new(510, 2)),
        ]);
        let from = address("94103");
        let to = address("23681");

        let rate = quote(&shippo, &from, &to, &parcels(), CurrencyCode::USD)
            .await
            .unwrap();
        let label = purchase(&shippo, &from, &to, &parcels(), &rate).await.unwrap();

        assert_eq!(label.carrier(), "USPS");
        assert!(!label.tracking_number().is_empty());
        assert!(label.label_url().ends_with(".pdf"));
        assert_eq!(shippo.shipment_count(), 2);
        assert_eq!(
            shippo.calls().last(),
            Some(&RecordedCall::CreateTransaction {
                rate_id: rate.rate_id.clone()
            })
        );
    }

    #[tokio::test]
    async fn test_purchase_never_substitutes_same_service() {
        let shippo = InMemoryShippo::with_offers(vec![RateOffer::new(
            "USPS",
            "usps_priority",
            Decimal::new(990, 2),
        )]);

        let result = purchase(
            &shippo,
            &address("94103"),
            &address("23681"),
            &parcels(),
            &quoted("rate_not_in_shipment", "USPS", "usps_priority"),
        )
        .await;

        assert!(matches!(
            result,
            Err(ShippingError::RateNotFound { ref rate_id }) if rate_id == "rate_not_in_shipment"
        ));
        assert!(
            !shippo
                .calls()
                .iter()
                .any(|call| matches!(call, RecordedCall::CreateTransaction { .. }))
        );
    }

    #[tokio::test]
    async fn test_purchase_unknown_rate_never_transacts() {
        let shippo = InMemoryShippo::with_offers(vec![RateOffer::new(
            "UPS",
            "ups_ground",
            Decimal::new(820, 2),
        )]);

        let result = purchase(
            &shippo,
            &address("94103"),
            &address("23681"),
            &parcels(),
            &quoted("rate_gone", "USPS", "usps_priority"),
        )
        .await;

        assert!(matches!(
            result,
            Err(ShippingError::RateNotFound { ref rate_id }) if rate_id == "rate_gone"
        ));
        assert!(
            !shippo
                .calls()
                .iter()
                .any(|call| matches!(call, RecordedCall::CreateTransaction { .. }))
        );
    }

    #[tokio::test]
    async fn test_purchase_failed_transaction_carries_messages() {
        let shippo = InMemoryShippo::with_offers(vec![RateOffer::new(
            "USPS",
            "usps_priority",
            Decimal::new(510, 2),
        )]);
        shippo.fail_transactions(
            TransactionStatus::Error,
            &["The rate has expired", "Request a new rate"],
        );
        let from = address("94103");
        let to = address("23681");
        let rate = quote(&shippo, &from, &to, &parcels(), CurrencyCode::USD)
            .await
            .unwrap();

        let result = purchase(&shippo, &from, &to, &parcels(), &rate).await;

        match result {
            Err(ShippingError::TransactionFailed { messages }) => {
                assert_eq!(
                    messages,
                    vec![
                        "The rate has expired".to_string(),
                        "Request a new rate".to_string()
                    ]
                );
            }
            other => panic!("expected TransactionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_purchase_invalid_address_stops_before_shipment() {
        let shippo = InMemoryShippo::with_offers(vec![RateOffer::new(
            "USPS",
            "usps_priority",
            Decimal::new(510, 2),
        )]);
        shippo.reject_zip("00000");

        let result = purchase(
            &shippo,
            &address("94103"),
            &address("00000"),
            &parcels(),
            &quoted("rate_x", "USPS", "usps_priority"),
        )
        .await;

        assert!(matches!(result, Err(ShippingError::InvalidAddress { .. })));
        assert_eq!(shippo.shipment_count(), 0);
    }
}
