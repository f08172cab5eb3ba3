//! Dulocart Shipping - Shippo integration for the checkout.
//!
//! Quotes the cheapest shipping rate for a cart and buys a label once the
//! order is confirmed:
//!
//! ```text
//! Checkout ─► addresses + parcel ─► Shippo ─► cheapest rate ─► Checkout
//! Order    ─► addresses + parcel ─► Shippo ─► transaction   ─► Order
//! ```
//!
//! # Modules
//!
//! - [`config`] - Environment-driven Shippo credentials and parcel template
//! - [`shippo`] - HTTP client, wire types and (with `test-util`) an in-memory double
//! - [`pipeline`] - Address validation, rate quoting and label purchase
//! - [`checkout`] - Applies pipeline results to checkout and order records
//! - [`parcel`] - Parcel derivation from cart weight
//! - [`error`] - `ShippingError`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod parcel;
pub mod pipeline;
pub mod shippo;

pub use checkout::{Cart, CartItem, Checkout, CheckoutError, CheckoutService, Order};
pub use config::{ConfigError, ShippingConfig, ShippoConfig, TokenMode};
pub use error::ShippingError;
pub use parcel::ParcelTemplate;
#[cfg(any(test, feature = "test-util"))]
pub use shippo::InMemoryShippo;
pub use shippo::{ShippingApi, ShippoClient};
