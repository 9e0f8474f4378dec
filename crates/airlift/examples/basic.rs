//! Basic example running one shuttle simulation.
//!
//! This example shows:
//! - Configuring a simulation with `AirliftConfig`
//! - Recording checkpoints as JSON lines alongside tracing output
//! - Reading the aggregate report after the run
//!
//! Run with: `cargo run --example basic -p airlift`

use std::sync::Arc;

use airlift::{AirliftConfig, JsonLinesJournal, Simulation};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airlift=debug".into()),
        )
        .init();

    let config = AirliftConfig {
        n_passengers: 12,
        capacity: 4,
        ..Default::default()
    };

    let journal = Arc::new(JsonLinesJournal::new(std::io::stdout()));
    let report = Simulation::with_journal(config, journal).run().await?;

    println!(
        "\n{} flights completed, loads {:?}",
        report.flights_completed, report.flight_loads
    );
    for (id, status) in report.passenger_status.iter().enumerate() {
        println!("  passenger {id}: {status:?}");
    }

    Ok(())
}
