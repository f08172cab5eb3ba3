//! Shipping configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHIPPO_API_KEY` - Shippo API token (`shippo_live_...` or `shippo_test_...`)
//!
//! ## Optional
//! - `SHIPPO_API_VERSION` - API version header (default: 2018-02-08)
//! - `SHIPPO_BASE_URL` - API base URL (default: <https://api.goshippo.com>)
//! - `SHIPPO_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHIPPING_CURRENCY` - Currency rates are requested in (default: USD)
//! - `SHIPPING_PARCEL_LENGTH` / `_WIDTH` / `_HEIGHT` - Box dimensions (default: 10 x 8 x 4)
//! - `SHIPPING_DISTANCE_UNIT` - Unit for box dimensions (default: in)
//! - `SHIPPING_MASS_UNIT` - Unit for cart weight (default: lb)

use std::str::FromStr;
use std::time::Duration;

use dulocart_core::{CurrencyCode, DistanceUnit, MassUnit};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::parcel::ParcelTemplate;

/// API version every request is pinned to.
pub const DEFAULT_API_VERSION: &str = "2018-02-08";
pub const DEFAULT_BASE_URL: &str = "https://api.goshippo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TEST_TOKEN_PREFIX: &str = "shippo_test_";
const LIVE_TOKEN_PREFIX: &str = "shippo_live_";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shippo environment a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Sandbox token; labels are never billed.
    Test,
    /// Production token; every purchase is billed.
    Live,
}

impl TokenMode {
    /// Classify a token by its prefix.
    #[must_use]
    pub fn of(token: &str) -> Option<Self> {
        if token.starts_with(TEST_TOKEN_PREFIX) {
            Some(Self::Test)
        } else if token.starts_with(LIVE_TOKEN_PREFIX) {
            Some(Self::Live)
        } else {
            None
        }
    }
}

/// Shipping pipeline configuration.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    /// Shippo API access
    pub shippo: ShippoConfig,
    /// Currency rates are quoted in
    pub currency: CurrencyCode,
    /// Box used for every cart
    pub parcel: ParcelTemplate,
}

/// Shippo API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ShippoConfig {
    /// Shippo API token
    pub api_key: SecretString,
    /// Value of the `Shippo-API-Version` header
    pub api_version: String,
    /// API base URL
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ShippoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippoConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ShippingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SHIPPO_API_KEY` is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ShippingConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shippo = ShippoConfig::from_lookup(&lookup)?;
        let currency = parse_or_default(&lookup, "SHIPPING_CURRENCY", CurrencyCode::USD)?;

        let defaults = ParcelTemplate::default();
        let parcel = ParcelTemplate {
            length: parse_or_default(&lookup, "SHIPPING_PARCEL_LENGTH", defaults.length)?,
            width: parse_or_default(&lookup, "SHIPPING_PARCEL_WIDTH", defaults.width)?,
            height: parse_or_default(&lookup, "SHIPPING_PARCEL_HEIGHT", defaults.height)?,
            distance_unit: parse_or_default::<DistanceUnit, _>(
                &lookup,
                "SHIPPING_DISTANCE_UNIT",
                defaults.distance_unit,
            )?,
            mass_unit: parse_or_default::<MassUnit, _>(
                &lookup,
                "SHIPPING_MASS_UNIT",
                defaults.mass_unit,
            )?,
        };

        for (key, value) in [
            ("SHIPPING_PARCEL_LENGTH", parcel.length),
            ("SHIPPING_PARCEL_WIDTH", parcel.width),
            ("SHIPPING_PARCEL_HEIGHT", parcel.height),
        ] {
            if value <= Decimal::ZERO {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }

        Ok(Self {
            shippo,
            currency,
            parcel,
        })
    }
}

impl ShippoConfig {
    /// Environment of the configured token, if it has a known prefix.
    #[must_use]
    pub fn mode(&self) -> Option<TokenMode> {
        TokenMode::of(self.api_key.expose_secret())
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("SHIPPO_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SHIPPO_API_KEY".to_string()))?;

        let mode = TokenMode::of(&api_key).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "SHIPPO_API_KEY".to_string(),
                format!("expected a {TEST_TOKEN_PREFIX}... or {LIVE_TOKEN_PREFIX}... token"),
            )
        })?;
        tracing::debug!(?mode, "Shippo token loaded");

        let base_url = lookup("SHIPPO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHIPPO_BASE_URL".to_string(), e.to_string())
        })?;

        let timeout_secs =
            parse_or_default(lookup, "SHIPPO_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_version: lookup("SHIPPO_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
