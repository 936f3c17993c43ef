//! Request/response exchange over UDP
//!
//! Each exchange owns one ephemeral socket and one retransmission timer:
//!
//! ```text
//! Idle -> Sent -> Retransmit* -> Resolved | Rejected
//! ```
//!
//! The wire message is built once, so every retransmission carries the same
//! signature token. The socket and timer live inside the exchange future and
//! are dropped on the transition to a terminal state, which rules out a
//! retransmission after the exchange has settled.

use std::fmt;
use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn, Level};
use uuid::Uuid;

use crate::codec::Codec;
use crate::error::ExchangeError;
use crate::logger::{ExchangeLogger, NoopLogger};
use crate::protocol::{ExchangeResponse, ResponseDecoder};
use crate::signer::{Signer, TimestampSigner};

/// Default wait between transmissions
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default number of retransmissions after the initial send
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Receive buffer size (largest UDP payload)
const MAX_DATAGRAM_SIZE: usize = 65536;

/// Immutable secrets shared by every exchange of a client
#[derive(Debug, Clone)]
pub struct Credentials {
    shared_secret: String,
    codec: Codec,
}

impl Credentials {
    pub fn new(shared_secret: impl Into<String>, codec: Codec) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            codec,
        }
    }

    pub fn shared_secret(&self) -> &str {
        &self.shared_secret
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

/// One command bound for one station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub command: String,
    pub signature: String,
    pub address: String,
    pub port: u16,
}

impl ExchangeRequest {
    pub fn new(
        command: impl Into<String>,
        signature: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            command: command.into(),
            signature: signature.into(),
            address: address.into(),
            port,
        }
    }

    /// Plaintext that goes into the wire message
    pub fn plaintext(&self, delimiter: crate::protocol::Delimiter) -> String {
        format!("{}{}{}", self.command, delimiter, self.signature)
    }
}

/// Lifecycle of one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sent,
    Retransmit(u32),
    Resolved,
    Rejected,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeState::Idle => write!(f, "IDLE"),
            ExchangeState::Sent => write!(f, "SENT"),
            ExchangeState::Retransmit(n) => write!(f, "RETRANSMIT({})", n),
            ExchangeState::Resolved => write!(f, "RESOLVED"),
            ExchangeState::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Retransmission budget of one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempts_made: u32,
    limit: u32,
}

impl RetryState {
    pub fn new(limit: u32) -> Self {
        Self {
            attempts_made: 0,
            limit,
        }
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn exhausted(&self) -> bool {
        self.attempts_made >= self.limit
    }

    /// Count one retransmission, returns its 1-based number
    pub fn record(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_made
    }
}

/// Exchange tuning
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Wait before each retransmission
    pub timeout: Duration,
    /// Retransmissions after the initial send
    pub retry_count: u32,
    pub decoder: ResponseDecoder,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            decoder: ResponseDecoder::default(),
        }
    }
}

/// Exchange engine
///
/// Cheap to clone; clones share credentials, signer and logger. Any number of
/// exchanges may run concurrently, each with its own socket and retry state.
#[derive(Clone)]
pub struct Session {
    credentials: Arc<Credentials>,
    signer: Arc<dyn Signer>,
    logger: Arc<dyn ExchangeLogger>,
    config: SessionConfig,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session with the timestamp signer and no frame logging
    pub fn new(credentials: Credentials, config: SessionConfig) -> Self {
        Self {
            credentials: Arc::new(credentials),
            signer: Arc::new(TimestampSigner),
            logger: Arc::new(NoopLogger),
            config,
        }
    }

    pub fn with_signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    pub fn with_logger(mut self, logger: impl ExchangeLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign a command and bind it to a destination
    pub fn prepare(&self, command: &str, port: u16, address: &str) -> ExchangeRequest {
        let signature = self.signer.sign(command);
        ExchangeRequest::new(command, signature, address, port)
    }

    /// Sign and run one exchange
    pub async fn send_message(
        &self,
        command: &str,
        port: u16,
        address: &str,
    ) -> Result<ExchangeResponse, ExchangeError> {
        let request = self.prepare(command, port, address);
        self.exchange(request).await
    }

    pub async fn exchange(&self, request: ExchangeRequest) -> Result<ExchangeResponse, ExchangeError> {
        self.exchange_until(request, std::future::pending::<()>()).await
    }

    /// Run one exchange, rejecting with [`ExchangeError::Aborted`] if `abort` completes first
    pub async fn exchange_until<F>(
        &self,
        request: ExchangeRequest,
        abort: F,
    ) -> Result<ExchangeResponse, ExchangeError>
    where
        F: Future<Output = ()>,
    {
        let exchange_id = Uuid::new_v4().to_string()[..8].to_string();
        let mut state = ExchangeState::Idle;
        let mut retry = RetryState::new(self.config.retry_count);

        let result = self
            .run(&request, &exchange_id, &mut state, &mut retry, abort)
            .await;

        // Socket and timer are gone by now
        match &result {
            Ok(response) => {
                debug!(
                    exchange = %exchange_id,
                    "Exchange: {} -> {} ({}) after {} retransmits",
                    state,
                    ExchangeState::Resolved,
                    response.status,
                    retry.attempts_made()
                );
            }
            Err(e) => {
                warn!(
                    exchange = %exchange_id,
                    "Exchange: {} -> {} after {} retransmits: {}",
                    state,
                    ExchangeState::Rejected,
                    retry.attempts_made(),
                    e
                );
            }
        }

        result
    }

    async fn run<F>(
        &self,
        request: &ExchangeRequest,
        exchange_id: &str,
        state: &mut ExchangeState,
        retry: &mut RetryState,
        abort: F,
    ) -> Result<ExchangeResponse, ExchangeError>
    where
        F: Future<Output = ()>,
    {
        let dest = resolve(&request.address, request.port).await?;
        let socket = UdpSocket::bind(unspecified_for(&dest)).await?;

        let plaintext = request.plaintext(self.config.decoder.delimiter);
        let wire = self.credentials.codec().encrypt(&plaintext);

        self.logger.log(
            Level::INFO,
            &format!("C2S {} {}:{}", request.command, request.address, request.port),
        );
        socket.send_to(&wire, dest).await?;
        *state = ExchangeState::Sent;
        debug!(exchange = %exchange_id, "Exchange: sent {} bytes to {}", wire.len(), dest);

        // interval_at rejects a zero period
        let period = self.config.timeout.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        tokio::pin!(abort);

        let (len, src) = loop {
            tokio::select! {
                biased;

                _ = &mut abort => return Err(ExchangeError::Aborted),

                received = socket.recv_from(&mut buf) => break received?,

                _ = ticker.tick() => {
                    if retry.exhausted() {
                        return Err(ExchangeError::RetriesExhausted { retries: retry.limit() });
                    }
                    let attempt = retry.record();
                    *state = ExchangeState::Retransmit(attempt);
                    debug!(
                        exchange = %exchange_id,
                        "Exchange: no reply from {}, retransmit {}/{}",
                        dest, attempt, retry.limit()
                    );
                    socket.send_to(&wire, dest).await?;
                }
            }
        };
        drop(ticker);

        let reply = self.credentials.codec().decrypt(&buf[..len])?;
        self.logger.log(Level::INFO, &format!("S2C {} {}", reply, src));

        let decoder = self.config.decoder;
        let response = decoder.decode(&reply);
        decoder.verdict(&response)?;

        Ok(response)
    }
}

/// Resolve a station address, preferring IPv4
async fn resolve(address: &str, port: u16) -> Result<SocketAddr, ExchangeError> {
    let unresolved = || ExchangeError::Unresolved(format!("{}:{}", address, port));

    let addrs: Vec<SocketAddr> = lookup_host((address, port))
        .await
        .map_err(|_| unresolved())?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(unresolved)
}

fn unspecified_for(dest: &SocketAddr) -> SocketAddr {
    if dest.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    }
}
