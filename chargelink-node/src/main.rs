//! chargelink - charging station remote control CLI
//!
//! # Usage
//!
//! ```bash
//! # Reserve charge point for 60 minutes
//! chargelink --address 10.0.0.17 --port 31234 reserve 04A2B9C1 60 1
//!
//! # Start / stop a charging session
//! chargelink -a 10.0.0.17 start 42
//! chargelink -a 10.0.0.17 stop 42
//!
//! # Deployment settings (key material, delimiter, ...) from a file
//! chargelink --config station.json update-db 04A2B9C1 1
//!
//! # Local station that answers every request with OK
//! chargelink --port 31234 station
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chargelink_client::{ClientConfig, Command, StationClient, TracingLogger};
use chargelink_core::{SimulatedStation, StationBehavior};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Remote control for charging stations over the encrypted UDP protocol
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Station address
    #[arg(short, long, default_value = "127.0.0.1", global = true)]
    address: String,

    /// Station UDP port
    #[arg(short, long, default_value = "31234", global = true)]
    port: u16,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Shared secret (overrides the config file)
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Wait between retransmissions in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Retransmissions before giving up
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Push a database update
    UpdateDb { uid: String, charger_type: u32 },

    /// Reserve a charge point
    Reserve {
        uid: String,
        minutes: u32,
        charger_type: u32,
    },

    /// Release a reservation
    StopReservation {
        uid: String,
        charger_type: u32,
        /// Only sent with the legacy release format
        #[arg(long, default_value = "0")]
        minutes: u32,
    },

    /// Start a charging session
    Start { id: String },

    /// Stop a charging session
    Stop { id: String },

    /// Send a raw command string
    Raw { command: String },

    /// Run a simulated station on --address:--port
    Station {
        /// Status code to answer with
        #[arg(long, default_value = "OK")]
        status: String,

        /// Never answer
        #[arg(long)]
        silent: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();

    // Setup logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;

    let command = match args.command {
        Cmd::Station { status, silent } => {
            run_station(&args.address, args.port, &config, status, silent).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Cmd::UpdateDb { uid, charger_type } => Command::update_db(uid, charger_type).to_string(),
        Cmd::Reserve {
            uid,
            minutes,
            charger_type,
        } => Command::reserve(uid, minutes, charger_type).to_string(),
        Cmd::StopReservation {
            uid,
            charger_type,
            minutes,
        } => Command::stop_reservation(uid, minutes, charger_type, config.release_format)
            .to_string(),
        Cmd::Start { id } => Command::start_charging(id).to_string(),
        Cmd::Stop { id } => Command::stop_charging(id).to_string(),
        Cmd::Raw { command } => command,
    };

    let client = StationClient::new(config)?.with_logger(TracingLogger);

    match client.send_message(&command, args.port, &args.address).await {
        Ok(reply) => {
            println!("{}", reply);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Config file (if any) with command line overrides applied
fn load_config(args: &Args) -> Result<ClientConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_json_file(path)?,
        None => ClientConfig::default(),
    };

    if let Some(secret) = &args.secret {
        config.shared_secret = secret.clone();
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = args.retries {
        config = config.with_retry_count(retries);
    }

    Ok(config)
}

async fn run_station(
    address: &str,
    port: u16,
    config: &ClientConfig,
    status: String,
    silent: bool,
) -> Result<(), Box<dyn Error>> {
    let addr: SocketAddr = format!("{}:{}", address, port).parse()?;
    let behavior = if silent {
        StationBehavior::Silent
    } else {
        StationBehavior::echo(status)
    };

    let codec = config.credentials()?.codec().clone();
    let station = SimulatedStation::bind_addr(addr, codec, config.delimiter, behavior).await?;
    info!(
        "Simulated station listening on {} (delimiter {:?})",
        station.local_addr(),
        config.delimiter
    );

    tokio::select! {
        _ = station.serve() => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
