//! # chargelink client
//!
//! Remote control of charging stations over the encrypted UDP protocol:
//! database pushes, reservations, and starting/stopping charging sessions.
//!
//! ## Command mapping
//!
//! | Operation | Plaintext command |
//! |-----------|-------------------|
//! | `update_db` | `UPDATEDB <uid> <type>` |
//! | `reserve` | `FIX_UID_ <uid> <minutes> <type>` |
//! | `stop_reservation` | `FIX_UID_ <uid> 0 <type>` |
//! | `start_charging` | `START_ID_<id>` |
//! | `stop_charging` | `STOP_ID_<id>` |
//!
//! ## Usage
//!
//! ```no_run
//! use chargelink_client::{ClientConfig, StationClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StationClient::new(ClientConfig::new("1234567890123456"))?;
//!
//!     let reply = client.reserve("04A2B9C1", 60, 1, 31234, "10.0.0.17").await?;
//!     println!("{}", reply);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod command;
pub mod config;

pub use client::StationClient;
pub use command::{Command, ReleaseFormat};
pub use config::{ClientConfig, ConfigError};

// Re-export key types
pub use chargelink_core::{
    Delimiter, ExchangeError, ExchangeResponse, KeyMaterial, StatusCode, TracingLogger,
};
