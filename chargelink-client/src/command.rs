//! Station command strings
//!
//! Builds the plaintext commands understood by the station firmware. Ids and
//! numeric ranges are passed through unchecked.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Verb for database pushes
pub const UPDATE_DB: &str = "UPDATEDB";
/// Verb for reservations
pub const FIX_UID: &str = "FIX_UID_";
/// Prefix for starting a charging session
pub const START_ID: &str = "START_ID_";
/// Prefix for stopping a charging session
pub const STOP_ID: &str = "STOP_ID_";

/// How a reservation release is put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseFormat {
    /// `FIX_UID_ <uid> 0 <type>`: a zero-minute reservation releases the charge point
    #[default]
    ZeroDuration,
    /// Same bytes as the reservation itself (older firmware)
    Legacy,
}

/// A remote-control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UpdateDb {
        uid: String,
        charger_type: u32,
    },
    Reserve {
        uid: String,
        minutes: u32,
        charger_type: u32,
    },
    StopReservation {
        uid: String,
        minutes: u32,
        charger_type: u32,
        format: ReleaseFormat,
    },
    StartCharging {
        id: String,
    },
    StopCharging {
        id: String,
    },
}

impl Command {
    pub fn update_db(uid: impl Into<String>, charger_type: u32) -> Self {
        Command::UpdateDb {
            uid: uid.into(),
            charger_type,
        }
    }

    pub fn reserve(uid: impl Into<String>, minutes: u32, charger_type: u32) -> Self {
        Command::Reserve {
            uid: uid.into(),
            minutes,
            charger_type,
        }
    }

    pub fn stop_reservation(
        uid: impl Into<String>,
        minutes: u32,
        charger_type: u32,
        format: ReleaseFormat,
    ) -> Self {
        Command::StopReservation {
            uid: uid.into(),
            minutes,
            charger_type,
            format,
        }
    }

    pub fn start_charging(id: impl Into<String>) -> Self {
        Command::StartCharging { id: id.into() }
    }

    pub fn stop_charging(id: impl Into<String>) -> Self {
        Command::StopCharging { id: id.into() }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::UpdateDb { .. } => "UpdateDb",
            Command::Reserve { .. } => "Reserve",
            Command::StopReservation { .. } => "StopReservation",
            Command::StartCharging { .. } => "StartCharging",
            Command::StopCharging { .. } => "StopCharging",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::UpdateDb { uid, charger_type } => {
                write!(f, "{} {} {}", UPDATE_DB, uid, charger_type)
            }
            Command::Reserve {
                uid,
                minutes,
                charger_type,
            } => write!(f, "{} {} {} {}", FIX_UID, uid, minutes, charger_type),
            Command::StopReservation {
                uid,
                minutes,
                charger_type,
                format,
            } => {
                let minutes = match format {
                    ReleaseFormat::ZeroDuration => 0,
                    ReleaseFormat::Legacy => *minutes,
                };
                write!(f, "{} {} {} {}", FIX_UID, uid, minutes, charger_type)
            }
            Command::StartCharging { id } => write!(f, "{}{}", START_ID, id),
            Command::StopCharging { id } => write!(f, "{}{}", STOP_ID, id),
        }
    }
}
