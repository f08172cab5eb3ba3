//! Parcel derivation from cart weight.
//!
//! Every cart ships in one box of fixed dimensions carrying the aggregate
//! cart weight. Overweight carts are not split across parcels.

use dulocart_core::{DistanceUnit, MassUnit, ParcelInfo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Box dimensions applied to every cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelTemplate {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub distance_unit: DistanceUnit,
    /// Unit the cart weight is expressed in.
    pub mass_unit: MassUnit,
}

impl Default for ParcelTemplate {
    fn default() -> Self {
        Self {
            length: Decimal::from(10),
            width: Decimal::from(8),
            height: Decimal::from(4),
            distance_unit: DistanceUnit::In,
            mass_unit: MassUnit::Lb,
        }
    }
}

impl ParcelTemplate {
    /// Parcels for a cart of the given total weight: always exactly one.
    #[must_use]
    pub fn parcels_for_weight(&self, weight: Decimal) -> Vec<ParcelInfo> {
        vec![ParcelInfo {
            length: self.length,
            width: self.width,
            height: self.height,
            distance_unit: self.distance_unit,
            weight,
            mass_unit: self.mass_unit,
        }]
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_single_parcel_carries_full_weight() {
        let template = ParcelTemplate::default();
        let parcels = template.parcels_for_weight(Decimal::from(150));

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].weight, Decimal::from(150));
        assert_eq!(parcels[0].length, Decimal::from(10));
        assert_eq!(parcels[0].distance_unit, DistanceUnit::In);
        assert_eq!(parcels[0].mass_unit, MassUnit::Lb);
    }
}
