//! Seed data script - populates the database with sample provider quotes
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://remit_rates.db?mode=rwc
//!
//! Pairs that already exist are skipped, so the script can be re-run safely.

use std::sync::Arc;

use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use remit_rates::{
    db,
    errors::ServiceError,
    services::rates::{NewRate, RateService},
};

#[derive(Parser)]
#[command(name = "seed-data", about = "Seed sample remittance rates", version)]
struct Cli {
    #[arg(
        long,
        default_value = "sqlite://remit_rates.db?mode=rwc",
        help = "Database connection URL"
    )]
    database_url: String,

    #[arg(long, help = "Skip running migrations before seeding")]
    skip_migrations: bool,
}

const SAMPLE_RATES: &[(&str, Decimal, &str)] = &[
    ("Wise", dec!(280.5), "PKR"),
    ("Remitly", dec!(285.0), "PKR"),
    ("Xoom", dec!(279.0), "PKR"),
    ("Western Union", dec!(277.25), "PKR"),
    ("Wise", dec!(83.12), "INR"),
    ("Remitly", dec!(83.45), "INR"),
    ("Xoom", dec!(82.9), "INR"),
    ("Wise", dec!(109.8), "BDT"),
    ("Remitly", dec!(110.15), "BDT"),
    ("Wise", dec!(56.1), "PHP"),
    ("Xoom", dec!(55.75), "PHP"),
    ("Remitly", dec!(133.2), "NPR"),
    ("Wise", dec!(300.4), "LKR"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    info!("=== Remit Rates Seed Data ===");
    info!("Connecting to database: {}", cli.database_url);
    let pool = db::establish_connection(&cli.database_url).await?;

    if !cli.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    let service = RateService::new(Arc::new(pool));
    let mut created = 0;
    let mut skipped = 0;

    for (provider, rate, currency) in SAMPLE_RATES {
        match service.create(NewRate::new(*provider, *rate, *currency)).await {
            Ok(model) => {
                created += 1;
                info!("  {} {}", model.provider, model.rate_display());
            }
            Err(ServiceError::ValidationFailed(errors)) => {
                skipped += 1;
                warn!("  skipped {} {}: {}", provider, currency, errors.join(", "));
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!("=== Seed Data Complete: {} created, {} skipped ===", created, skipped);
    info!("Try: curl http://localhost:8080/api/v1/rates/compare/PKR");

    Ok(())
}
