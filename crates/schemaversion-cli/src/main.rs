//! schemaversion CLI - inspect and initialize schema-version bookkeeping.

use clap::{Parser, Subcommand};
use schemaversion::{create_adapter, Adapter, AdapterConfig, AdapterError, DriverAdapter};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "schemaversion")]
#[command(about = "Schema-version tracking for MySQL, PostgreSQL and SQL Server")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "schemaversion.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the schemaversion table exists and the current version
    Status,

    /// Create the schemaversion table if it does not exist
    Init,

    /// Execute SQL and print the normalized result
    Exec {
        /// SQL to execute
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        sql: Option<String>,

        /// Read the SQL from a file instead
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), AdapterError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(AdapterError::Config)?;

    let config = AdapterConfig::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Status => {
            let mut adapter = connect(&config).await?;
            let outcome = status(&mut adapter).await;
            let (present, version) = finish(adapter, outcome).await?;

            if cli.output_json {
                let report = json!({
                    "driver": config.driver,
                    "table_exists": present,
                    "version": version,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Schema Version Status:");
                println!("  Driver: {}", config.driver);
                println!(
                    "  schemaversion table: {}",
                    if present { "present" } else { "absent" }
                );
                match version {
                    Some(v) => println!("  Current version: {}", v),
                    None => println!("  Current version: none"),
                }
            }
        }

        Commands::Init => {
            let mut adapter = connect(&config).await?;
            let outcome = adapter.ensure_version_table().await;
            let created = finish(adapter, outcome).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&json!({ "created": created }))?);
            } else if created {
                println!("Created schemaversion table at version 0");
            } else {
                println!("schemaversion table already exists");
            }
        }

        Commands::Exec { sql, file } => {
            let sql = match (sql, file) {
                (Some(sql), _) => sql,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => {
                    return Err(AdapterError::Config(
                        "either SQL or --file is required".to_string(),
                    ))
                }
            };

            let mut adapter = connect(&config).await?;
            let outcome = adapter.run_query(&sql).await;
            let result = finish(adapter, outcome).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                match &result.rows {
                    Some(rows) => {
                        for row in rows {
                            println!("{}", serde_json::to_string(row)?);
                        }
                        println!("({} rows)", rows.len());
                    }
                    None => println!("OK"),
                }
            }
        }

        Commands::HealthCheck => {
            let start = Instant::now();
            let mut adapter = connect(&config).await?;
            let outcome = adapter.run_query("SELECT 1").await;
            finish(adapter, outcome).await?;
            let latency_ms = start.elapsed().as_millis() as u64;

            if cli.output_json {
                let report = json!({
                    "driver": config.driver,
                    "healthy": true,
                    "latency_ms": latency_ms,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Health Check Results:");
                println!("  {}: OK ({}ms)", config.driver, latency_ms);
            }
        }
    }

    Ok(())
}

/// Create the adapter and open its connection.
async fn connect(config: &AdapterConfig) -> Result<Adapter, AdapterError> {
    let mut adapter = create_adapter(config)?;
    adapter.connect().await?;
    Ok(adapter)
}

/// Disconnect, then report the command's outcome ahead of any teardown error.
async fn finish<T>(
    mut adapter: Adapter,
    outcome: Result<T, AdapterError>,
) -> Result<T, AdapterError> {
    let closed = adapter.disconnect().await;
    let value = outcome?;
    closed?;
    Ok(value)
}

async fn status(adapter: &mut Adapter) -> Result<(bool, Option<i64>), AdapterError> {
    let check = adapter.queries().check_version_table.clone();
    let present = adapter.run_query(&check).await?.has_rows();
    let version = if present {
        adapter.current_version().await?
    } else {
        None
    };
    Ok((present, version))
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout is reserved for command output.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}': use text or json", other)),
    }

    Ok(())
}
