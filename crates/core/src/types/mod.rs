//! Core types for Dulocart.
//!
//! This module provides type-safe wrappers for the shipping domain.

pub mod address;
pub mod id;
pub mod parcel;
pub mod price;
pub mod shipping;

pub use address::{Address, AddressType};
pub use id::*;
pub use parcel::{DistanceUnit, MassUnit, ParcelInfo, UnitError};
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use shipping::{QuotedRate, ShippingLabel};
