//! Dulocart CLI - Shippo rate quotes and label purchase.
//!
//! # Usage
//!
//! ```bash
//! # Cheapest rate for a 2 lb parcel
//! dulocart quote --from warehouse.yaml --to customer.yaml --weight 2
//!
//! # Buy a label for a previously quoted rate
//! dulocart purchase --from warehouse.yaml --to customer.yaml --weight 2 --rate rate.yaml
//!
//! # Quote a checkout record in place, then turn it into an order
//! dulocart checkout quote checkout.yaml --origin warehouse.yaml
//! dulocart checkout submit checkout.yaml --origin warehouse.yaml --order-id 1001 -o order.yaml
//! ```
//!
//! Records are YAML. Results go to stdout unless `--out` is given; logs go to
//! stderr. Shippo credentials come from the environment (see
//! `dulocart_shipping::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dulocart_core::OrderId;
use rust_decimal::Decimal;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "dulocart")]
#[command(author, version, about = "Dulocart shipping tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the cheapest shipping rate between two addresses
    Quote {
        /// Origin address (YAML)
        #[arg(long)]
        from: PathBuf,

        /// Destination address (YAML)
        #[arg(long)]
        to: PathBuf,

        /// Parcel weight in the configured mass unit
        #[arg(short, long)]
        weight: Decimal,

        /// Write the quoted rate to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Buy a shipping label for a quoted rate
    Purchase {
        /// Origin address (YAML)
        #[arg(long)]
        from: PathBuf,

        /// Destination address (YAML)
        #[arg(long)]
        to: PathBuf,

        /// Parcel weight in the configured mass unit
        #[arg(short, long)]
        weight: Decimal,

        /// Quoted rate (YAML, as written by `quote`)
        #[arg(short, long)]
        rate: PathBuf,

        /// Write the label to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run the checkout flow on a checkout record
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Quote delivery and store the rate on the checkout
    Quote {
        /// Checkout record (YAML)
        checkout: PathBuf,

        /// Company address parcels ship from (YAML)
        #[arg(long)]
        origin: PathBuf,

        /// Write the updated checkout here (default: overwrite the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Convert a quoted checkout into an order and buy its label
    Submit {
        /// Quoted checkout record (YAML)
        checkout: PathBuf,

        /// Company address parcels ship from (YAML)
        #[arg(long)]
        origin: PathBuf,

        /// Id assigned to the new order
        #[arg(long)]
        order_id: OrderId,

        /// Write the order to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before Sentry reads its DSN
    let _ = dotenvy::dotenv();

    let _sentry_guard = telemetry::init_sentry();
    telemetry::init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Quote {
            from,
            to,
            weight,
            out,
        } => commands::quote::run(&from, &to, weight, out.as_deref()).await?,
        Commands::Purchase {
            from,
            to,
            weight,
            rate,
            out,
        } => commands::purchase::run(&from, &to, weight, &rate, out.as_deref()).await?,
        Commands::Checkout { action } => match action {
            CheckoutAction::Quote {
                checkout,
                origin,
                out,
            } => commands::checkout::quote(&checkout, &origin, out.as_deref()).await?,
            CheckoutAction::Submit {
                checkout,
                origin,
                order_id,
                out,
            } => {
                commands::checkout::submit(&checkout, &origin, order_id, out.as_deref()).await?;
            }
        },
    }
    Ok(())
}
