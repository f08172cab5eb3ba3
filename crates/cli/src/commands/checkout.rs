//! `dulocart checkout`: quote and submit checkout records.

use std::path::Path;

use dulocart_core::{Address, OrderId};
use dulocart_shipping::{Checkout, CheckoutService, ShippoClient};
use tracing::info;

use super::{CommandResult, connect, read_record, write_record};

async fn service(origin: &Path) -> CommandResult<CheckoutService<ShippoClient>> {
    let (config, client) = connect()?;
    let origin: Address = read_record(origin).await?;
    Ok(CheckoutService::new(
        client,
        origin,
        config.parcel,
        config.currency,
    ))
}

/// Quote delivery for a checkout and write the updated record.
///
/// The input file is overwritten unless `out` is given. Nothing is written
/// when the quote fails.
///
/// # Errors
///
/// Returns an error if configuration is missing, a record cannot be read,
/// or the quote fails.
pub async fn quote(checkout_path: &Path, origin: &Path, out: Option<&Path>) -> CommandResult {
    let service = service(origin).await?;
    let mut checkout: Checkout = read_record(checkout_path).await?;

    let rate = service.get_quote(&mut checkout).await?;
    info!(
        checkout_id = %checkout.id,
        provider = %rate.provider,
        price = %rate.price.display(),
        "Checkout quoted"
    );

    write_record(&checkout, Some(out.unwrap_or(checkout_path))).await
}

/// Submit a quoted checkout and write the resulting order.
///
/// # Errors
///
/// Returns an error if configuration is missing, a record cannot be read,
/// the checkout was never quoted, or the purchase fails.
pub async fn submit(
    checkout_path: &Path,
    origin: &Path,
    order_id: OrderId,
    out: Option<&Path>,
) -> CommandResult {
    let service = service(origin).await?;
    let checkout: Checkout = read_record(checkout_path).await?;

    let order = service
        .submit_order(&checkout, order_id)
        .await?;
    info!(
        order_id = %order.id,
        tracking_number = %order.label.tracking_number(),
        "Order submitted"
    );

    write_record(&order, out).await
}
