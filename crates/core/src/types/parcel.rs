//! Parcel dimensions and weight.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a unit of measure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// Not a distance unit carriers accept.
    #[error("unknown distance unit: {0}")]
    Distance(String),
    /// Not a mass unit carriers accept.
    #[error("unknown mass unit: {0}")]
    Mass(String),
}

/// Unit for parcel length, width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Cm,
    #[default]
    In,
    Ft,
    Mm,
    M,
    Yd,
}

impl DistanceUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cm => "cm",
            Self::In => "in",
            Self::Ft => "ft",
            Self::Mm => "mm",
            Self::M => "m",
            Self::Yd => "yd",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cm" => Ok(Self::Cm),
            "in" => Ok(Self::In),
            "ft" => Ok(Self::Ft),
            "mm" => Ok(Self::Mm),
            "m" => Ok(Self::M),
            "yd" => Ok(Self::Yd),
            _ => Err(UnitError::Distance(s.to_string())),
        }
    }
}

/// Unit for parcel weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    G,
    Oz,
    #[default]
    Lb,
    Kg,
}

impl MassUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Oz => "oz",
            Self::Lb => "lb",
            Self::Kg => "kg",
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MassUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" => Ok(Self::G),
            "oz" => Ok(Self::Oz),
            "lb" => Ok(Self::Lb),
            "kg" => Ok(Self::Kg),
            _ => Err(UnitError::Mass(s.to_string())),
        }
    }
}

/// Physical package used to price shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelInfo {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub distance_unit: DistanceUnit,
    pub weight: Decimal,
    pub mass_unit: MassUnit,
}
