//! Simulated charging station
//!
//! Binds a loopback UDP port, decrypts and records every request, and answers
//! according to a [`StationBehavior`]. Requests are split on the station's
//! [`Delimiter`]: the first field is taken as the command and the last as the
//! signature.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::protocol::Delimiter;

/// Builds a reply from `(command, signature)`
pub type ReplyFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// How the station answers
#[derive(Clone)]
pub enum StationBehavior {
    /// Reply `<command><delim><signature><delim><status>`
    Echo(String),
    /// Encrypt and send whatever the function returns
    Reply(ReplyFn),
    /// Send these bytes verbatim, unencrypted
    Raw(Vec<u8>),
    /// Never answer
    Silent,
}

impl StationBehavior {
    pub fn echo(status: impl Into<String>) -> Self {
        StationBehavior::Echo(status.into())
    }

    pub fn reply<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        StationBehavior::Reply(Arc::new(f))
    }
}

pub struct SimulatedStation {
    local_addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl SimulatedStation {
    /// Bind to an ephemeral loopback port
    pub async fn bind(
        codec: Codec,
        delimiter: Delimiter,
        behavior: StationBehavior,
    ) -> std::io::Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        Self::bind_addr(addr, codec, delimiter, behavior).await
    }

    pub async fn bind_addr(
        addr: SocketAddr,
        codec: Codec,
        delimiter: Delimiter,
        behavior: StationBehavior,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65536];

            loop {
                let (len, src) = match socket.recv_from(&mut buf).await {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("Station: receive error: {}", e);
                        continue;
                    }
                };

                let request = match codec.decrypt(&buf[..len]) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Station: dropping undecryptable request from {}: {}", src, e);
                        continue;
                    }
                };
                debug!("Station: received {:?} from {}", request, src);
                log.lock().push(request.clone());

                let fields: Vec<&str> = request.split(delimiter.as_char()).collect();
                let command = fields.first().copied().unwrap_or_default();
                let signature = fields.last().copied().unwrap_or_default();

                let reply = match &behavior {
                    StationBehavior::Silent => continue,
                    StationBehavior::Raw(bytes) => bytes.clone(),
                    StationBehavior::Echo(status) => codec.encrypt(&format!(
                        "{}{d}{}{d}{}",
                        command,
                        signature,
                        status,
                        d = delimiter
                    )),
                    StationBehavior::Reply(f) => codec.encrypt(&f(command, signature)),
                };

                if let Err(e) = socket.send_to(&reply, src).await {
                    warn!("Station: failed to reply to {}: {}", src, e);
                }
            }
        });

        Ok(Self {
            local_addr,
            received,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Decrypted requests, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().len()
    }

    /// Run until the task is aborted or the runtime shuts down
    pub async fn serve(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for SimulatedStation {
    fn drop(&mut self) {
        self.task.abort();
    }
}
