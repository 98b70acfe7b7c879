// Connection probing
// Opens the default connection and reports the outcome without propagating errors,
// so the installer can offer a retry instead of failing.

use log::{debug, error};

use crate::database::registry::{ConnectionRegistry, DEFAULT_CONNECTION};

/// Result of a connection probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected,
    /// The open attempt failed (network, authentication, protocol).
    Unreachable(String),
    /// Nothing usable is registered as the default connection.
    Misconfigured(String),
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeOutcome::Connected)
    }
}

/// Try to open the default connection.
///
/// Open failures are logged once at error level and returned as
/// `Unreachable`; a missing or unusable registration yields `Misconfigured`
/// without logging.
pub async fn probe(registry: &mut ConnectionRegistry) -> ProbeOutcome {
    let connection = match registry.get(DEFAULT_CONNECTION) {
        Ok(c) => c,
        Err(e) => {
            debug!(
                "[PHASE: database] [STEP: test_connection] No usable default connection: {}",
                e
            );
            return ProbeOutcome::Misconfigured(e.to_string());
        }
    };

    match connection.connect().await {
        Ok(()) => ProbeOutcome::Connected,
        Err(e) => {
            error!(
                "[PHASE: database] [STEP: test_connection] {}",
                e.internal_details
            );
            ProbeOutcome::Unreachable(e.user_message)
        }
    }
}

/// Boolean form of [`probe`]: true only when the connection opened.
pub async fn test_connection(registry: &mut ConnectionRegistry) -> bool {
    probe(registry).await.is_connected()
}
