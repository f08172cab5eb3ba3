//! `dulocart purchase`: buy a label for a quoted rate.

use std::path::Path;

use dulocart_core::{Address, QuotedRate};
use dulocart_shipping::{TokenMode, pipeline};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{CommandResult, connect, read_record, write_record};

/// Purchase a label and write it as YAML.
///
/// # Errors
///
/// Returns an error if configuration is missing, a record cannot be read,
/// or the purchase fails.
pub async fn run(
    from: &Path,
    to: &Path,
    weight: Decimal,
    rate: &Path,
    out: Option<&Path>,
) -> CommandResult {
    let (config, client) = connect()?;
    let from: Address = read_record(from).await?;
    let to: Address = read_record(to).await?;
    let rate: QuotedRate = read_record(rate).await?;

    if config.shippo.mode() == Some(TokenMode::Live) {
        warn!(rate_id = %rate.rate_id, "Purchasing with a live Shippo token; the label is billed");
    }

    let parcels = config.parcel.parcels_for_weight(weight);
    let label = pipeline::purchase(&client, &from, &to, &parcels, &rate).await?;

    info!(
        carrier = %label.carrier(),
        tracking_number = %label.tracking_number(),
        label_url = %label.label_url(),
        "Label purchased"
    );

    write_record(&label, out).await
}
