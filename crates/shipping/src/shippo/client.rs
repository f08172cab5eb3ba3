//! Shippo REST API client.
//!
//! Provides typed access to the address, shipment, rate and transaction
//! endpoints used by the checkout pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use dulocart_core::CurrencyCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::{Origin, Url};

use super::ShippingApi;
use super::types::{
    Address, AddressRequest, Rate, RateList, Shipment, ShipmentRequest, Transaction,
    TransactionRequest,
};
use crate::config::ShippoConfig;
use crate::error::ShippingError;

/// Header carrying the pinned API version.
const API_VERSION_HEADER: &str = "Shippo-API-Version";

/// Seconds to wait when Shippo rate limits without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Shippo REST API client.
///
/// Credentials and the API version are fixed at construction and sent as
/// default headers on every request.
#[derive(Clone)]
pub struct ShippoClient {
    inner: Arc<ShippoClientInner>,
}

struct ShippoClientInner {
    client: reqwest::Client,
    base_url: String,
    origin: Origin,
    api_version: String,
}

impl ShippoClient {
    /// Create a new Shippo API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ShippoConfig) -> Result<Self, ShippingError> {
        let mut headers = HeaderMap::new();

        let mut auth_value =
            HeaderValue::from_str(&format!("ShippoToken {}", config.api_key.expose_secret()))
                .map_err(|e| ShippingError::Parse(format!("Invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| ShippingError::Parse(format!("Invalid API version: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShippoClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                origin: config.base_url.origin(),
                api_version: config.api_version.clone(),
            }),
        })
    }

    /// The pinned API version sent with every request.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Validate a pagination link before following it.
    ///
    /// The credentials travel as default headers, so only links on the
    /// configured origin are followed.
    fn page_url(&self, next: &str) -> Result<Url, ShippingError> {
        let url = Url::parse(next)
            .map_err(|e| ShippingError::Parse(format!("Invalid pagination link {next}: {e}")))?;
        if url.origin() != self.inner.origin {
            return Err(ShippingError::Parse(format!(
                "Pagination link {next} is outside {}",
                self.inner.base_url
            )));
        }
        Ok(url)
    }

    /// Execute a GET request against an absolute URL.
    async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T, ShippingError> {
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request to the Shippo API.
    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShippingError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShippingError> {
        if response.status().is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|e| {
                ShippingError::Parse(format!("Failed to parse Shippo response: {e}"))
            });
        }

        Err(Self::parse_error(response).await)
    }

    /// Map a non-success response to an error.
    async fn parse_error(response: reqwest::Response) -> ShippingError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return ShippingError::RateLimited(retry_after);
        }

        let message = response
            .text()
            .await
            .map(|body| body.trim().to_string())
            .unwrap_or_else(|_| "Unknown error".to_string());

        warn!(status, message = %message, "Shippo request rejected");

        match status {
            401 | 403 => ShippingError::Authentication(message),
            400 | 404 | 422 => ShippingError::InvalidRequest { status, message },
            _ => ShippingError::Api { status, message },
        }
    }
}

#[async_trait]
impl ShippingApi for ShippoClient {
    #[instrument(skip(self, request), fields(zip = %request.zip, country = %request.country))]
    async fn create_address(&self, request: &AddressRequest) -> Result<Address, ShippingError> {
        let address: Address = self.post("/addresses/", request).await?;
        debug!(
            object_id = %address.object_id,
            is_valid = address.is_valid(),
            "Address created"
        );
        Ok(address)
    }

    #[instrument(skip(self, request), fields(parcels = request.parcels.len()))]
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, ShippingError> {
        let shipment: Shipment = self.post("/shipments/", request).await?;
        debug!(
            object_id = %shipment.object_id,
            status = ?shipment.status,
            rates = shipment.rates.len(),
            "Shipment created"
        );
        Ok(shipment)
    }

    #[instrument(skip(self), fields(currency = %currency))]
    async fn shipment_rates(
        &self,
        shipment_id: &str,
        currency: CurrencyCode,
    ) -> Result<Vec<Rate>, ShippingError> {
        let first = self.page_url(&self.url(&format!(
            "/shipments/{shipment_id}/rates/{}",
            currency.code()
        )))?;
        let mut page: RateList = self.get_url(first).await?;
        let mut rates = std::mem::take(&mut page.results);

        while let Some(next) = page.next.take() {
            page = self.get_url(self.page_url(&next)?).await?;
            rates.append(&mut page.results);
        }

        debug!(count = rates.len(), "Rates fetched");
        Ok(rates)
    }

    #[instrument(skip(self, request), fields(rate = %request.rate))]
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, ShippingError> {
        let transaction: Transaction = self.post("/transactions/", request).await?;
        debug!(
            object_id = %transaction.object_id,
            status = ?transaction.status,
            "Transaction created"
        );
        Ok(transaction)
    }
}

impl std::fmt::Debug for ShippoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippoClient")
            .field("base_url", &self.inner.base_url)
            .field("api_version", &self.inner.api_version)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
