//! chargelink core
//!
//! Exchange engine for the encrypted UDP remote-control protocol spoken by
//! charging stations. One exchange sends one signed, AES-128-CBC encrypted
//! command and waits for exactly one reply, retransmitting on silence.
//!
//! ```text
//! command ─► Signer ─► Codec::encrypt ─► UDP ─► station
//!                                              │
//! ExchangeResponse ◄─ ResponseDecoder ◄─ Codec::decrypt ◄─┘
//! ```

pub mod codec;
pub mod error;
pub mod logger;
pub mod protocol;
pub mod session;
pub mod signer;
pub mod station;

pub use codec::{Codec, KeyMaterial};
pub use error::{CodecError, ExchangeError, KeyMaterialError};
pub use logger::{ExchangeLogger, NoopLogger, TracingLogger};
pub use protocol::{Delimiter, ExchangeResponse, ResponseDecoder, StatusCode};
pub use session::{Credentials, ExchangeRequest, ExchangeState, RetryState, Session, SessionConfig};
pub use signer::{FixedSigner, Signer, TimestampSigner};
pub use station::{SimulatedStation, StationBehavior};
