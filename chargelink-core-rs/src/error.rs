//! Error types for the exchange engine

use thiserror::Error;

use crate::protocol::StatusCode;

/// Errors turning a received payload back into plaintext
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty payload")]
    Empty,

    #[error("payload length {0} is not a whole number of cipher blocks")]
    Truncated(usize),

    #[error("invalid PKCS#7 padding")]
    Padding,

    #[error("decrypted payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors in supplied key or IV material
#[derive(Debug, Error)]
pub enum KeyMaterialError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 16 bytes of key material, got {0}")]
    Length(usize),
}

/// Terminal failure of one exchange
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Socket I/O failed. Not retried.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("could not resolve station address {0}")]
    Unresolved(String),

    /// Station stayed silent for the whole retry budget
    #[error("API did not respond after {retries} retries")]
    RetriesExhausted { retries: u32 },

    /// Station answered with a non-OK status
    #[error("{}", .0.error_message())]
    Server(StatusCode),

    #[error("undecodable response: {0}")]
    Decode(#[from] CodecError),

    #[error("exchange aborted by caller")]
    Aborted,
}

impl ExchangeError {
    /// Status code carried by a server rejection
    pub fn status(&self) -> Option<&StatusCode> {
        match self {
            ExchangeError::Server(code) => Some(code),
            _ => None,
        }
    }
}
