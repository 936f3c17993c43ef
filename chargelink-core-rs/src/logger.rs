//! Frame logging capability
//!
//! The session reports every frame it sends and receives (`C2S`/`S2C`) through
//! an injected [`ExchangeLogger`]. [`NoopLogger`] is the default.

use tracing::Level;

pub trait ExchangeLogger: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

impl<F> ExchangeLogger for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message)
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl ExchangeLogger for NoopLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Forwards frames to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ExchangeLogger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "chargelink::frames", "{}", message),
            Level::WARN => tracing::warn!(target: "chargelink::frames", "{}", message),
            Level::INFO => tracing::info!(target: "chargelink::frames", "{}", message),
            Level::DEBUG => tracing::debug!(target: "chargelink::frames", "{}", message),
            _ => tracing::trace!(target: "chargelink::frames", "{}", message),
        }
    }
}
