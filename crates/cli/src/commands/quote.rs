//! `dulocart quote`: cheapest rate between two addresses.

use std::path::Path;

use dulocart_core::Address;
use dulocart_shipping::pipeline;
use rust_decimal::Decimal;
use tracing::info;

use super::{CommandResult, connect, read_record, write_record};

/// Quote the cheapest rate and write it as YAML.
///
/// # Errors
///
/// Returns an error if configuration is missing, a record cannot be read,
/// or the quote fails.
pub async fn run(from: &Path, to: &Path, weight: Decimal, out: Option<&Path>) -> CommandResult {
    let (config, client) = connect()?;
    let from: Address = read_record(from).await?;
    let to: Address = read_record(to).await?;

    let parcels = config.parcel.parcels_for_weight(weight);
    let rate = pipeline::quote(&client, &from, &to, &parcels, config.currency).await?;

    info!(
        provider = %rate.provider,
        service = %rate.service_level_name,
        price = %rate.price.display(),
        "Cheapest rate"
    );

    write_record(&rate, out).await
}
