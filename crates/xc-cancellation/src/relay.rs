//! Strategies that route cancellation through the relay process.
//!
//! The sending context writes a record scoped to its own client id; the
//! receiving context polls that record with the blocking query.

use crate::source::CancellationTokenSource;
use crate::strategy::{
    CancellationChannel, CancellationReceiverStrategy, CancellationSenderStrategy,
};
use shared_types::{CancellationId, ClientId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use xc_relay::RelayClient;

/// Tokens that poll the relay for `(id, scope)`.
///
/// `scope` is the client id of the context that sends the cancellations.
#[derive(Clone)]
pub struct RelayReceiverStrategy {
    relay: RelayClient,
    scope: ClientId,
}

impl RelayReceiverStrategy {
    pub fn new(relay: RelayClient, scope: ClientId) -> Self {
        Self { relay, scope }
    }
}

impl CancellationReceiverStrategy for RelayReceiverStrategy {
    fn create_cancellation_token_source(&self, id: &CancellationId) -> CancellationTokenSource {
        let relay = self.relay.clone();
        let scope = self.scope;
        let id = id.clone();
        CancellationTokenSource::polled(move || match relay.query_canceled(&id, scope) {
            Ok(canceled) => canceled,
            Err(e) => {
                // Reads as not cancelled; the handler runs to completion
                warn!(id = %id, scope = %scope, error = %e, "Cancellation query failed");
                false
            }
        })
    }
}

/// How a [`RelaySenderStrategy`] writes the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CancelTransport {
    /// Fire-and-forget `setCanceled` message.
    #[default]
    Message,
    /// Blocking POST to the cancellation address; returns once written.
    Post,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown cancel transport '{0}' (expected 'message' or 'post')")]
pub struct UnknownTransport(pub String);

impl FromStr for CancelTransport {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "post" => Ok(Self::Post),
            other => Err(UnknownTransport(other.to_string())),
        }
    }
}

impl fmt::Display for CancelTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => f.write_str("message"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// Writes cancellations to the relay instead of the connection.
#[derive(Clone)]
pub struct RelaySenderStrategy {
    relay: RelayClient,
    transport: CancelTransport,
    cleanup_records: bool,
}

impl RelaySenderStrategy {
    pub fn new(relay: RelayClient) -> Self {
        Self {
            relay,
            transport: CancelTransport::default(),
            cleanup_records: true,
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: CancelTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Whether completed calls delete their record.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup_records: bool) -> Self {
        self.cleanup_records = cleanup_records;
        self
    }
}

impl CancellationSenderStrategy for RelaySenderStrategy {
    fn send_cancellation(&self, _channel: &dyn CancellationChannel, id: &CancellationId) {
        match self.transport {
            CancelTransport::Message => self.relay.set_canceled(id),
            CancelTransport::Post => {
                if let Err(e) = self.relay.post_canceled(id) {
                    warn!(id = %id, error = %e, "Cancellation POST failed");
                }
            }
        }
        debug!(id = %id, client = %self.relay.id(), transport = %self.transport, "Cancellation sent to relay");
    }

    fn cleanup(&self, id: &CancellationId) {
        if self.cleanup_records {
            self.relay.delete_canceled(id);
        }
    }

    fn dispose(&self) {
        debug!(client = %self.relay.id(), "Relay sender strategy disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::PortClosed;
    use xc_relay::{RelayConfig, RelayProcess};

    struct NoChannel;

    impl CancellationChannel for NoChannel {
        fn send_cancel_request(&self, _id: &CancellationId) -> Result<(), PortClosed> {
            panic!("relay strategies never use the connection channel");
        }
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("POST".parse::<CancelTransport>().unwrap(), CancelTransport::Post);
        assert_eq!(" message ".parse::<CancelTransport>().unwrap(), CancelTransport::Message);
        assert!("carrier-pigeon".parse::<CancelTransport>().is_err());
    }

    #[tokio::test]
    async fn test_sender_and_receiver_meet_at_the_relay() {
        let relay = RelayProcess::spawn(RelayConfig::default()).unwrap();
        let main = relay.register_client().unwrap();
        let worker = relay.register_worker(main.client.id()).unwrap();
        let id = CancellationId::from(12);

        let sender = RelaySenderStrategy::new(main.client.clone());
        let receiver = RelayReceiverStrategy::new(worker.client.clone(), main.client.id());
        let source = receiver.create_cancellation_token_source(&id);
        let token = source.token();

        assert!(!token.is_cancellation_requested());
        sender.send_cancellation(&NoChannel, &id);
        assert!(token.is_cancellation_requested());

        // Record deleted after completion; the observation is cached
        sender.cleanup(&id);
        assert!(!worker.client.query_canceled(&id, main.client.id()).unwrap());
        assert!(token.is_cancellation_requested());
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_post_transport() {
        let relay = RelayProcess::spawn(RelayConfig::default()).unwrap();
        let main = relay.register_client().unwrap();
        let id = CancellationId::from("slow-1");

        let sender = RelaySenderStrategy::new(main.client.clone())
            .with_transport(CancelTransport::Post)
            .with_cleanup(false);
        sender.send_cancellation(&NoChannel, &id);
        sender.cleanup(&id);

        assert!(main.client.query_canceled(&id, main.client.id()).unwrap());
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_receiver_reads_unavailable_relay_as_not_canceled() {
        let relay = RelayProcess::spawn(RelayConfig::default()).unwrap();
        let port = relay.register_client().unwrap();
        let receiver = RelayReceiverStrategy::new(port.client.clone(), port.client.id());
        relay.shutdown();

        let source = receiver.create_cancellation_token_source(&CancellationId::from(1));
        assert!(!source.token().is_cancellation_requested());
    }
}
