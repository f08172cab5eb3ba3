//! Command implementations and shared record I/O.

pub mod checkout;
pub mod purchase;
pub mod quote;

use std::path::Path;

use dulocart_shipping::{ShippingConfig, ShippoClient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load configuration from the environment and build a Shippo client.
pub fn connect() -> CommandResult<(ShippingConfig, ShippoClient)> {
    let config = ShippingConfig::from_env()?;
    let client = ShippoClient::new(&config.shippo)?;
    debug!(base_url = %config.shippo.base_url, "Shippo client ready");
    Ok((config, client))
}

/// Read a YAML record.
pub async fn read_record<T: DeserializeOwned>(path: &Path) -> CommandResult<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let record = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid record in {}: {e}", path.display()))?;
    Ok(record)
}

/// Write a YAML record to `out`, or to stdout when `None`.
pub async fn write_record<T: Serialize>(record: &T, out: Option<&Path>) -> CommandResult {
    let yaml = serde_yaml::to_string(record)?;

    match out {
        Some(path) => {
            tokio::fs::write(path, yaml).await?;
            debug!(path = %path.display(), "Record written");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(yaml.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dulocart_core::{Address, AddressType, CheckoutId};
    use dulocart_shipping::Checkout;
    use rust_decimal::Decimal;

    use super::*;

    const CHECKOUT_YAML: &str = r"
id: 7
customer_id: 42
customer_addresses:
  - name: Ada Lovelace
    street1: 500 Terry Francois St
    city: San Francisco
    state: CA
    zip: '94107'
    country: US
    address_type: SHIPPING
    primary: true
cart:
  items:
    - product_id: tea-tin
      quantity: 3
      unit_weight: '0.5'
";

    #[tokio::test]
    async fn test_read_checkout_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkout.yaml");
        tokio::fs::write(&path, CHECKOUT_YAML).await.unwrap();

        let checkout: Checkout = read_record(&path).await.unwrap();

        assert_eq!(checkout.id, CheckoutId::new(7));
        assert_eq!(checkout.cart.weight(), Decimal::new(15, 1));
        assert_eq!(checkout.destination().unwrap().zip, "94107");
        assert!(checkout.delivery.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.yaml");
        let address = Address {
            id: None,
            name: "Shipping Desk".to_string(),
            company: Some("Dulocart".to_string()),
            street1: "965 Mission St".to_string(),
            street2: String::new(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip: "94103".to_string(),
            country: "US".to_string(),
            email: String::new(),
            phone: String::new(),
            address_type: AddressType::Shipping,
            primary: true,
        };

        write_record(&address, Some(&path)).await.unwrap();
        let read: Address = read_record(&path).await.unwrap();

        assert_eq!(read, address);
    }

    #[tokio::test]
    async fn test_read_missing_record_names_path() {
        let err = read_record::<Address>(Path::new("/nonexistent/warehouse.yaml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/warehouse.yaml"));
    }
}
