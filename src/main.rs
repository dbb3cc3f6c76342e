//! dbal - Main entry point.
//!
//! Connects through the driver layer, runs one command and prints the result as JSON.

use clap::Parser;
use dbal::config::{Command, Config};
use dbal::db::DatabaseDriver;
use serde_json::{Value as JsonValue, json};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(driver: &mut DatabaseDriver, command: &Command) -> dbal::DbResult<JsonValue> {
    let output = match command {
        Command::Tables => json!(driver.table_list().await?),
        Command::Columns {
            table,
            types_only: true,
        } => {
            let types = driver.table_column_types(table).await?;
            JsonValue::Object(
                types
                    .iter()
                    .map(|(name, type_name)| (name.to_string(), json!(type_name)))
                    .collect(),
            )
        }
        Command::Columns { table, .. } => json!(driver.table_columns(table).await?),
        Command::Keys { table } => json!(driver.table_keys(table).await?),
        Command::Query { sql } => {
            driver.set_query(sql.as_str());
            let rows = driver.load_assoc_list().await?;
            json!({
                "rows": rows,
                "affected_rows": driver.get_affected_rows()?,
            })
        }
        Command::Version => json!({
            "driver": driver.name(),
            "version": driver.version().await?,
        }),
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    let connection = config.connection_config()?;
    info!(
        driver = %connection.driver,
        "Starting dbal v{}",
        env!("CARGO_PKG_VERSION")
    );

    if !DatabaseDriver::is_kind_supported(connection.driver) {
        eprintln!(
            "Error: no native client for {} is built into this binary.",
            connection.driver
        );
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  dbal --database sqlite:site.db tables");
        eprintln!("  dbal --database sqlite:site.db?prefix=jos_ keys '#__users'");
        std::process::exit(1);
    }

    let mut driver = DatabaseDriver::new(connection);
    let result = run(&mut driver, &config.command).await;
    driver.disconnect().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e.into())
        }
    }
}
