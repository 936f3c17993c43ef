//! Signature tokens bound to outgoing commands

use chrono::Utc;

/// Produces the token appended to a command before encryption.
///
/// The station echoes the token back, so callers can correlate replies and
/// check freshness.
pub trait Signer: Send + Sync {
    fn sign(&self, command: &str) -> String;
}

impl<F> Signer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sign(&self, command: &str) -> String {
        self(command)
    }
}

/// Current Unix time in seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampSigner;

impl Signer for TimestampSigner {
    fn sign(&self, _command: &str) -> String {
        Utc::now().timestamp().to_string()
    }
}

/// Same token for every command
#[derive(Debug, Clone)]
pub struct FixedSigner(pub String);

impl FixedSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Signer for FixedSigner {
    fn sign(&self, _command: &str) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_signer() {
        let before = Utc::now().timestamp();
        let token: i64 = TimestampSigner.sign("UPDATEDB uid 1").parse().unwrap();
        let after = Utc::now().timestamp();

        assert!(token >= before && token <= after);
    }

    #[test]
    fn test_closure_signer() {
        let signer = |cmd: &str| format!("sig-{}", cmd.len());
        assert_eq!(signer.sign("STOP_ID_7"), "sig-9");
        assert_eq!(FixedSigner::new("signature123").sign("anything"), "signature123");
    }
}
