//! Charging station client
//!
//! Thin layer over [`Session`]: builds the command string for each operation
//! and runs one exchange for it.

use chargelink_core::{ExchangeError, ExchangeLogger, ExchangeResponse, Session, Signer};
use tracing::info;

use crate::command::{Command, ReleaseFormat};
use crate::config::{ClientConfig, ConfigError};

/// Remote control client for charging stations
///
/// Operations take `&self`; run as many concurrently as needed.
#[derive(Debug, Clone)]
pub struct StationClient {
    session: Session,
    release_format: ReleaseFormat,
}

impl StationClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let session = Session::new(config.credentials()?, config.session_config());

        Ok(Self {
            session,
            release_format: config.release_format,
        })
    }

    /// Replace the default timestamp signer
    pub fn with_signer(mut self, signer: impl Signer + 'static) -> Self {
        self.session = self.session.with_signer(signer);
        self
    }

    /// Receive `C2S`/`S2C` frame events
    pub fn with_logger(mut self, logger: impl ExchangeLogger + 'static) -> Self {
        self.session = self.session.with_logger(logger);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send an arbitrary command string
    pub async fn send_message(
        &self,
        command: &str,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.session.send_message(command, port, address).await
    }

    pub async fn send_command(
        &self,
        command: &Command,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        info!("Client: {} -> {}:{}", command.name(), address, port);
        self.send_message(&command.to_string(), port, address).await
    }

    /// Push a database update to the station
    pub async fn update_db(
        &self,
        uid: &str,
        charger_type: u32,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.send_command(&Command::update_db(uid, charger_type), port, address)
            .await
    }

    /// Reserve a charge point for `minutes`
    pub async fn reserve(
        &self,
        uid: &str,
        minutes: u32,
        charger_type: u32,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.send_command(&Command::reserve(uid, minutes, charger_type), port, address)
            .await
    }

    /// Release a reservation
    ///
    /// `minutes` only reaches the wire with [`ReleaseFormat::Legacy`].
    pub async fn stop_reservation(
        &self,
        uid: &str,
        minutes: u32,
        charger_type: u32,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        let command = Command::stop_reservation(uid, minutes, charger_type, self.release_format);
        self.send_command(&command, port, address).await
    }

    pub async fn start_charging(
        &self,
        id: &str,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.send_command(&Command::start_charging(id), port, address)
            .await
    }

    pub async fn stop_charging(
        &self,
        id: &str,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.send_command(&Command::stop_charging(id), port, address)
            .await
    }
}
