//! In-memory [`ShippingApi`] implementation.
//!
//! Behaves like a Shippo sandbox with scripted outcomes: configurable rate
//! offers, undeliverable zip codes, transaction results and remote failures.
//! Every call is recorded so tests can assert what reached the "remote" side.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dulocart_core::CurrencyCode;
use rust_decimal::Decimal;

use super::ShippingApi;
use super::types::{
    Address, AddressRequest, ApiMessage, Rate, ServiceLevel, Shipment, ShipmentRequest,
    Transaction, TransactionRequest, TransactionStatus, ValidationResults,
};
use crate::error::ShippingError;

/// A rate the fake carrier offers on every new shipment.
///
/// The rate id assigned to an offer is reused on every shipment, so a rate
/// quoted on one shipment can be bought on the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateOffer {
    pub provider: String,
    pub service_level_token: String,
    pub service_level_name: String,
    pub amount: Decimal,
}

impl RateOffer {
    #[must_use]
    pub fn new(provider: &str, service_level_token: &str, amount: Decimal) -> Self {
        Self {
            provider: provider.to_string(),
            service_level_token: service_level_token.to_string(),
            service_level_name: service_level_token.replace('_', " "),
            amount,
        }
    }
}

/// A remote call observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CreateAddress { zip: String, validate: bool },
    CreateShipment { parcels: usize },
    ShipmentRates { shipment_id: String, currency: CurrencyCode },
    CreateTransaction { rate_id: String },
}

/// Failure the fake reports instead of serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    Authentication,
    InvalidRequest(String),
    Unavailable,
}

impl RemoteFailure {
    fn to_error(&self) -> ShippingError {
        match self {
            Self::Authentication => {
                ShippingError::Authentication("Invalid token.".to_string())
            }
            Self::InvalidRequest(message) => ShippingError::InvalidRequest {
                status: 400,
                message: message.clone(),
            },
            Self::Unavailable => ShippingError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            },
        }
    }
}

#[derive(Debug, Default)]
struct State {
    offers: Vec<(String, RateOffer)>,
    offer_seq: u64,
    invalid_zips: HashSet<String>,
    shipments: HashMap<String, Vec<Rate>>,
    transaction_status: Option<(TransactionStatus, Vec<String>)>,
    failure: Option<RemoteFailure>,
    calls: Vec<RecordedCall>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_failure(&self) -> Result<(), ShippingError> {
        self.failure.as_ref().map_or(Ok(()), |f| Err(f.to_error()))
    }
}

/// Scriptable in-memory Shippo.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippo {
    state: Arc<Mutex<State>>,
}

impl InMemoryShippo {
    /// A fake offering `offers` on every shipment, in the given order.
    #[must_use]
    pub fn with_offers(offers: Vec<RateOffer>) -> Self {
        let shippo = Self::default();
        shippo.set_offers(offers);
        shippo
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the offers used for shipments created from now on.
    pub fn set_offers(&self, offers: Vec<RateOffer>) {
        let mut state = self.state();
        let offers = offers
            .into_iter()
            .map(|offer| {
                state.offer_seq += 1;
                (format!("rate_{}", state.offer_seq), offer)
            })
            .collect();
        state.offers = offers;
    }

    /// Mark a zip code as undeliverable.
    pub fn reject_zip(&self, zip: &str) {
        self.state().invalid_zips.insert(zip.to_string());
    }

    /// Make transactions finish with `status` and `messages` instead of `SUCCESS`.
    pub fn fail_transactions(&self, status: TransactionStatus, messages: &[&str]) {
        self.state().transaction_status = Some((
            status,
            messages.iter().map(ToString::to_string).collect(),
        ));
    }

    /// Make every subsequent call fail, or clear the failure with `None`.
    pub fn set_failure(&self, failure: Option<RemoteFailure>) {
        self.state().failure = failure;
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Number of shipments created so far.
    #[must_use]
    pub fn shipment_count(&self) -> usize {
        self.state().shipments.len()
    }
}

#[async_trait]
impl ShippingApi for InMemoryShippo {
    async fn create_address(&self, request: &AddressRequest) -> Result<Address, ShippingError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreateAddress {
            zip: request.zip.clone(),
            validate: request.validate,
        });
        state.check_failure()?;

        let id = state.next_id();
        let valid = !state.invalid_zips.contains(&request.zip);
        let messages = if valid {
            vec![]
        } else {
            vec![ApiMessage {
                source: Some("USPS".to_string()),
                code: Some("Address Not Found".to_string()),
                text: "The address as submitted could not be found.".to_string(),
            }]
        };

        Ok(Address {
            object_id: format!("adr_{id}"),
            zip: request.zip.clone(),
            is_complete: Some(valid),
            validation_results: request.validate.then_some(ValidationResults {
                is_valid: Some(valid),
                messages,
            }),
        })
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, ShippingError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreateShipment {
            parcels: request.parcels.len(),
        });
        state.check_failure()?;

        let id = state.next_id();
        let shipment_id = format!("shp_{id}");
        let rates: Vec<Rate> = state
            .offers
            .iter()
            .map(|(rate_id, offer)| Rate {
                object_id: rate_id.clone(),
                shipment: shipment_id.clone(),
                amount: offer.amount,
                currency: "USD".to_string(),
                amount_local: offer.amount,
                currency_local: "USD".to_string(),
                provider: offer.provider.clone(),
                servicelevel: ServiceLevel {
                    name: offer.service_level_name.clone(),
                    token: offer.service_level_token.clone(),
                },
                estimated_days: Some(3),
            })
            .collect();

        state.shipments.insert(shipment_id.clone(), rates.clone());

        Ok(Shipment {
            object_id: shipment_id,
            status: Some("SUCCESS".to_string()),
            rates,
            messages: vec![],
        })
    }

    async fn shipment_rates(
        &self,
        shipment_id: &str,
        currency: CurrencyCode,
    ) -> Result<Vec<Rate>, ShippingError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ShipmentRates {
            shipment_id: shipment_id.to_string(),
            currency,
        });
        state.check_failure()?;

        let rates = state
            .shipments
            .get(shipment_id)
            .ok_or_else(|| ShippingError::InvalidRequest {
                status: 404,
                message: format!("Shipment {shipment_id} not found"),
            })?;

        Ok(rates
            .iter()
            .cloned()
            .map(|mut rate| {
                rate.currency_local = currency.code().to_string();
                rate
            })
            .collect())
    }

    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ShippingError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreateTransaction {
            rate_id: request.rate.clone(),
        });
        state.check_failure()?;

        let known = state
            .shipments
            .values()
            .flatten()
            .any(|rate| rate.object_id == request.rate);
        if !known {
            return Err(ShippingError::InvalidRequest {
                status: 400,
                message: format!("Rate {} does not exist", request.rate),
            });
        }

        let id = state.next_id();
        let transaction = match state.transaction_status.clone() {
            Some((status, messages)) => Transaction {
                object_id: format!("txn_{id}"),
                status,
                rate: Some(request.rate.clone()),
                tracking_number: None,
                tracking_url_provider: None,
                label_url: None,
                messages: messages
                    .into_iter()
                    .map(|text| ApiMessage {
                        text,
                        ..ApiMessage::default()
                    })
                    .collect(),
            },
            None => Transaction {
                object_id: format!("txn_{id}"),
                status: TransactionStatus::Success,
                rate: Some(request.rate.clone()),
                tracking_number: Some(format!("92055901649173127510{id:02}")),
                tracking_url_provider: Some(format!(
                    "https://tools.usps.com/go/TrackConfirmAction?tLabels=92055901649173127510{id:02}"
                )),
                label_url: Some(format!("https://shippo-delivery.example/label_{id}.pdf")),
                messages: vec![],
            },
        };

        Ok(transaction)
    }
}
