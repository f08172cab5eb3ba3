//! Rate quoting.

use dulocart_core::{Address, CurrencyCode, ParcelInfo, Price, QuotedRate};
use tracing::{info, instrument};

use super::create_shipment;
use crate::error::ShippingError;
use crate::shippo::{Rate, ShippingApi};

/// Pick the rate with the lowest local amount.
///
/// Ties resolve to the earliest rate in API order.
#[must_use]
pub fn select_cheapest(rates: &[Rate]) -> Option<&Rate> {
    rates
        .iter()
        .min_by(|a, b| a.amount_local.cmp(&b.amount_local))
}

/// Convert a Shippo rate into the domain quote.
///
/// The price is the local amount; `requested` is used when Shippo reports a
/// local currency outside [`CurrencyCode`].
#[must_use]
pub fn quoted_rate(rate: &Rate, requested: CurrencyCode) -> QuotedRate {
    let currency = rate.currency_local.parse().unwrap_or(requested);

    QuotedRate {
        rate_id: rate.object_id.clone(),
        shipment_id: rate.shipment.clone(),
        provider: rate.provider.clone(),
        service_level_name: rate.servicelevel.name.clone(),
        service_level_token: rate.servicelevel.token.clone(),
        price: Price::new(rate.amount_local, currency),
        estimated_days: rate.estimated_days,
    }
}

/// Quote the cheapest rate for shipping `parcels` from `from` to `to`.
///
/// Every call creates a new remote shipment.
///
/// # Errors
///
/// Returns `ShippingError::InvalidAddress` if either address fails
/// validation, `ShippingError::NoRatesAvailable` if no carrier offers a
/// rate, or the remote error unchanged.
#[instrument(skip_all, fields(from_zip = %from.zip, to_zip = %to.zip, currency = %currency))]
pub async fn quote<A>(
    api: &A,
    from: &Address,
    to: &Address,
    parcels: &[ParcelInfo],
    currency: CurrencyCode,
) -> Result<QuotedRate, ShippingError>
where
    A: ShippingApi + ?Sized,
{
    let shipment = create_shipment(api, from, to, parcels).await?;
    let rates = api.shipment_rates(&shipment.object_id, currency).await?;

    let cheapest = select_cheapest(&rates).ok_or_else(|| ShippingError::NoRatesAvailable {
        shipment_id: shipment.object_id.clone(),
    })?;
    let quoted = quoted_rate(cheapest, currency);

    info!(
        shipment_id = %quoted.shipment_id,
        rate_id = %quoted.rate_id,
        provider = %quoted.provider,
        service = %quoted.service_level_token,
        amount = %quoted.price.amount,
        offered = rates.len(),
        "Shipping rate quoted"
    );

    Ok(quoted)
}
