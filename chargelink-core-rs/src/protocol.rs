//! Response framing and status codes
//!
//! A decrypted station reply is a delimiter-separated list of fields:
//!
//! ```text
//! <command> [<entity id>...] <signature> <status>
//! ```
//!
//! The status code is always the last field. Older firmware uses `_` as the
//! delimiter, current firmware uses a single space.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// Field separator used by the station firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Space,
    Underscore,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Space => ' ',
            Delimiter::Underscore => '_',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            " " | "space" => Ok(Delimiter::Space),
            "_" | "underscore" => Ok(Delimiter::Underscore),
            other => Err(format!("unknown delimiter: {other:?}")),
        }
    }
}

/// Terminal status field of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    /// Bad safety key
    Saf,
    /// Operation had no effect
    Noa,
    Err,
    Unknown(String),
}

impl StatusCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "OK" => StatusCode::Ok,
            "SAF" => StatusCode::Saf,
            "NOA" => StatusCode::Noa,
            "ERR" => StatusCode::Err,
            other => StatusCode::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Saf => "SAF",
            StatusCode::Noa => "NOA",
            StatusCode::Err => "ERR",
            StatusCode::Unknown(code) => code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Human readable message reported when this status rejects an exchange
    pub fn error_message(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Saf => "Invalid Safety Key",
            StatusCode::Noa => "Useless operation",
            StatusCode::Err => "Unknown error",
            StatusCode::Unknown(_) => "Unknown server error returned",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed station reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    /// First field, the command verb echoed by the station
    pub command: String,
    /// Last field between the command and the signature, if any
    pub entity_id: Option<String>,
    /// Token echoed back, if the reply carried one
    pub signature: Option<String>,
    pub status: StatusCode,
    /// The decrypted reply as received
    pub raw: String,
}

impl fmt::Display for ExchangeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits replies and decides whether they settle an exchange successfully
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder {
    pub delimiter: Delimiter,
    /// Accept `NOA` for stop commands: stopping an already stopped session is not an error
    pub suppress_noa_for_stop: bool,
}

impl ResponseDecoder {
    pub fn new(delimiter: Delimiter, suppress_noa_for_stop: bool) -> Self {
        Self {
            delimiter,
            suppress_noa_for_stop,
        }
    }

    pub fn decode(&self, raw: &str) -> ExchangeResponse {
        let fields: Vec<&str> = raw.split(self.delimiter.as_char()).collect();
        let n = fields.len();

        // split() always yields at least one field
        let status = StatusCode::parse(fields[n - 1]);
        let command = if n > 1 { fields[0].to_string() } else { String::new() };
        let signature = (n >= 3).then(|| fields[n - 2].to_string());
        let entity_id = if n >= 4 {
            Some(fields[n - 3].to_string())
        } else {
            None
        };

        ExchangeResponse {
            command,
            entity_id,
            signature,
            status,
            raw: raw.to_string(),
        }
    }

    /// Ok if the reply settles the exchange successfully
    pub fn verdict(&self, response: &ExchangeResponse) -> Result<(), ExchangeError> {
        match &response.status {
            StatusCode::Ok => Ok(()),
            StatusCode::Noa if self.suppress_noa_for_stop && is_stop_command(&response.command) => {
                Ok(())
            }
            other => Err(ExchangeError::Server(other.clone())),
        }
    }
}

/// Whether an echoed command verb belongs to a stop operation
pub fn is_stop_command(command: &str) -> bool {
    command.starts_with("STOP")
}
