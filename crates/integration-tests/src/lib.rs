//! Integration tests for Dulocart shipping.
//!
//! # Running Tests
//!
//! ```bash
//! # Against the local fake
//! cargo test -p dulocart-integration-tests
//!
//! # Including the live sandbox test
//! SHIPPO_API_KEY=shippo_test_... cargo test -p dulocart-integration-tests -- --ignored
//! ```
//!
//! # Fake Shippo
//!
//! [`FakeShippo`] serves the four endpoints the pipeline uses on a loopback
//! port so the real `reqwest` client is exercised end to end. Every request
//! is captured with its headers and JSON body.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dulocart_core::{Address, AddressType};
use dulocart_shipping::config::DEFAULT_API_VERSION;
use dulocart_shipping::{ShippoClient, ShippoConfig};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Token the fake expects in `Authorization: ShippoToken <token>`.
pub const TEST_TOKEN: &str = "shippo_test_7c1e94a0b2d84f63";

/// A request observed by the fake.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Value::Null` for GET.
    pub body: Value,
}

impl CapturedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Error response returned instead of serving the next requests.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    status: StatusCode,
    body: String,
    retry_after: Option<u64>,
}

/// A rate offered on every shipment; `rate_id` is the same on each.
#[derive(Debug, Clone)]
struct Offer {
    rate_id: String,
    provider: String,
    token: String,
    amount: String,
}

#[derive(Debug, Default)]
struct FakeState {
    base_url: String,
    requests: Vec<CapturedRequest>,
    offers: Vec<Offer>,
    page_size: usize,
    invalid_zips: HashSet<String>,
    shipments: HashMap<String, Vec<Value>>,
    transaction: Option<Value>,
    failure: Option<ScriptedFailure>,
    raw_body: Option<String>,
    page_origin: Option<String>,
    offer_seq: u64,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn rate_json(offer: &Offer, shipment_id: &str, currency: &str) -> Value {
        json!({
            "object_id": offer.rate_id,
            "shipment": shipment_id,
            "amount": offer.amount,
            "currency": "USD",
            "amount_local": offer.amount,
            "currency_local": currency,
            "provider": offer.provider,
            "servicelevel": {
                "name": offer.token.replace('_', " "),
                "token": offer.token,
            },
            "estimated_days": 2,
            "attributes": [],
        })
    }
}

type SharedState = Arc<Mutex<FakeState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record the request; return the scripted response if one is set.
fn capture(
    state: &SharedState,
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: &[u8],
) -> Option<Response> {
    let mut state = lock(state);
    state.requests.push(CapturedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(ToString::to_string),
        headers,
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    });

    if let Some(raw) = state.raw_body.clone() {
        return Some((StatusCode::OK, raw).into_response());
    }

    state.failure.clone().map(|failure| {
        let mut response = (failure.status, failure.body).into_response();
        if let Some(secs) = failure.retry_after {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(secs));
        }
        response
    })
}

#[allow(clippy::unused_async)]
async fn create_address(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(response) = capture(&state, method, &uri, headers, &body) {
        return response;
    }

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let zip = request["zip"].as_str().unwrap_or_default().to_string();

    let mut state = lock(&state);
    let id = state.next_id();
    let valid = !state.invalid_zips.contains(&zip);
    let messages = if valid {
        json!([])
    } else {
        json!([{
            "source": "USPS",
            "code": "Address Not Found",
            "text": "The address as submitted could not be found. Please check for excessive abbreviations in the street address.",
        }])
    };

    (
        StatusCode::CREATED,
        Json(json!({
            "object_id": format!("adr_{id}"),
            "is_complete": valid,
            "name": request["name"],
            "company": request["company"],
            "street1": request["street1"],
            "city": request["city"],
            "state": request["state"],
            "zip": zip,
            "country": request["country"],
            "validation_results": {
                "is_valid": valid,
                "messages": messages,
            },
        })),
    )
        .into_response()
}

#[allow(clippy::unused_async)]
async fn create_shipment(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(response) = capture(&state, method, &uri, headers, &body) {
        return response;
    }

    let mut state = lock(&state);
    let id = state.next_id();
    let shipment_id = format!("shp_{id}");
    let rates: Vec<Value> = state
        .offers
        .iter()
        .map(|offer| FakeState::rate_json(offer, &shipment_id, "USD"))
        .collect();
    state.shipments.insert(shipment_id.clone(), rates.clone());

    (
        StatusCode::CREATED,
        Json(json!({
            "object_id": shipment_id,
            "status": "SUCCESS",
            "rates": rates,
            "messages": [],
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

#[allow(clippy::unused_async)]
async fn list_rates(
    State(state): State<SharedState>,
    Path((shipment_id, currency)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = capture(&state, method, &uri, headers, &[]) {
        return response;
    }

    let state = lock(&state);
    let Some(rates) = state.shipments.get(&shipment_id) else {
        return (StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#).into_response();
    };

    let page = query.page.unwrap_or(1).max(1);
    let size = state.page_size.max(1);
    let results: Vec<Value> = rates
        .iter()
        .skip((page - 1) * size)
        .take(size)
        .cloned()
        .map(|mut rate| {
            rate["currency_local"] = json!(currency);
            rate
        })
        .collect();
    let next = (page * size < rates.len()).then(|| {
        format!(
            "{}/shipments/{shipment_id}/rates/{currency}?page={}",
            state.page_origin.as_deref().unwrap_or(&state.base_url),
            page + 1
        )
    });

    Json(json!({
        "next": next,
        "previous": null,
        "results": results,
    }))
    .into_response()
}

#[allow(clippy::unused_async)]
async fn create_transaction(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(response) = capture(&state, method, &uri, headers, &body) {
        return response;
    }

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let rate_id = request["rate"].as_str().unwrap_or_default().to_string();

    let mut state = lock(&state);
    let known = state
        .shipments
        .values()
        .flatten()
        .any(|rate| rate["object_id"] == rate_id.as_str());
    if !known {
        return (StatusCode::BAD_REQUEST, r#"{"rate":["Rate not found."]}"#).into_response();
    }

    let id = state.next_id();
    let transaction = state.transaction.clone().unwrap_or_else(|| {
        json!({
            "object_id": format!("txn_{id}"),
            "status": "SUCCESS",
            "rate": rate_id,
            "tracking_number": format!("9205590164917312751{id:03}"),
            "tracking_url_provider": format!(
                "https://tools.usps.com/go/TrackConfirmAction_input?origTrackNum=9205590164917312751{id:03}"
            ),
            "label_url": format!("https://deliver.goshippo.com/txn_{id}.pdf"),
            "messages": [],
        })
    });

    (StatusCode::CREATED, Json(transaction)).into_response()
}

/// Local stand-in for the Shippo API.
pub struct FakeShippo {
    addr: SocketAddr,
    state: SharedState,
    server: JoinHandle<()>,
}

impl FakeShippo {
    /// Serve the fake on a free loopback port.
    ///
    /// # Panics
    ///
    /// Panics if no loopback port can be bound.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Shippo");
        let addr = listener.local_addr().expect("Failed to read fake Shippo address");

        let state = Arc::new(Mutex::new(FakeState {
            base_url: format!("http://{addr}"),
            page_size: 25,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/addresses/", post(create_address))
            .route("/shipments/", post(create_shipment))
            .route("/shipments/{shipment_id}/rates/{currency}", get(list_rates))
            .route("/transactions/", post(create_transaction))
            .with_state(Arc::clone(&state));

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at the fake.
    ///
    /// # Panics
    ///
    /// Panics if the loopback URL does not parse.
    #[must_use]
    pub fn config(&self) -> ShippoConfig {
        ShippoConfig {
            api_key: SecretString::from(TEST_TOKEN),
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: Url::parse(&self.base_url()).expect("Invalid fake Shippo URL"),
            timeout: Duration::from_secs(5),
        }
    }

    /// A real HTTP client talking to the fake.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ShippoClient {
        ShippoClient::new(&self.config()).expect("Failed to build Shippo client")
    }

    /// Offer a rate on every shipment created from now on. `amount` is the
    /// decimal string Shippo sends. Offers get ids `rate_1`, `rate_2`, ...
    pub fn offer(&self, provider: &str, token: &str, amount: &str) {
        let mut state = lock(&self.state);
        state.offer_seq += 1;
        let rate_id = format!("rate_{}", state.offer_seq);
        state.offers.push(Offer {
            rate_id,
            provider: provider.to_string(),
            token: token.to_string(),
            amount: amount.to_string(),
        });
    }

    /// Drop all offers.
    pub fn clear_offers(&self) {
        lock(&self.state).offers.clear();
    }

    /// Point `next` links of the rate listing at another origin.
    pub fn link_pages_to(&self, origin: &str) {
        lock(&self.state).page_origin = Some(origin.trim_end_matches('/').to_string());
    }

    /// Rates per page on the rate listing endpoint.
    pub fn set_page_size(&self, size: usize) {
        lock(&self.state).page_size = size;
    }

    /// Mark a zip code as undeliverable.
    pub fn reject_zip(&self, zip: &str) {
        lock(&self.state).invalid_zips.insert(zip.to_string());
    }

    /// Answer every transaction with this body.
    pub fn respond_to_transactions(&self, transaction: Value) {
        lock(&self.state).transaction = Some(transaction);
    }

    /// Answer every request with an error response.
    pub fn fail_with(&self, status: u16, body: &str, retry_after: Option<u64>) {
        lock(&self.state).failure = Some(ScriptedFailure {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
            retry_after,
        });
    }

    /// Answer every request with `200 OK` and this raw body.
    pub fn respond_raw(&self, body: &str) {
        lock(&self.state).raw_body = Some(body.to_string());
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        lock(&self.state).requests.clone()
    }

    /// `"METHOD /path"` for every request received so far.
    #[must_use]
    pub fn request_lines(&self) -> Vec<String> {
        lock(&self.state)
            .requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Drop for FakeShippo {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A US address with every field set.
#[must_use]
pub fn us_address(
    name: &str,
    company: Option<&str>,
    street1: &str,
    city: &str,
    zip: &str,
) -> Address {
    Address {
        id: None,
        name: name.to_string(),
        company: company.map(ToString::to_string),
        street1: street1.to_string(),
        street2: String::new(),
        city: city.to_string(),
        state: "CA".to_string(),
        zip: zip.to_string(),
        country: "US".to_string(),
        email: "orders@dulocart.example".to_string(),
        phone: "+1 415 555 0100".to_string(),
        address_type: AddressType::Shipping,
        primary: true,
    }
}

/// The company warehouse parcels ship from.
#[must_use]
pub fn warehouse() -> Address {
    us_address(
        "Shipping Desk",
        Some("Dulocart"),
        "965 Mission St",
        "San Francisco",
        "94103",
    )
}

/// A customer delivery address.
#[must_use]
pub fn customer() -> Address {
    us_address(
        "Grace Hopper",
        None,
        "1600 Amphitheatre Pkwy",
        "Mountain View",
        "94043",
    )
}
