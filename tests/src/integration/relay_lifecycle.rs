//! # Relay Lifecycle With Live Contexts
//!
//! Reinstalling the relay under running contexts, contexts whose owner went
//! away, and startup and shutdown ordering.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{slow_config, start};
    use context_runtime::handlers::methods;
    use context_runtime::{ContextError, MainContext};
    use serde_json::json;
    use shared_types::{codes, CancellationId};
    use std::time::Duration;
    use tokio::time::timeout;
    use xc_cancellation::CancellationToken;
    use xc_relay::{RelayError, RelayState};

    #[tokio::test]
    async fn test_reinstall_purges_but_keeps_contexts() {
        let (relay, main) = start(slow_config());
        let id = CancellationId::from("stale");

        main.client().post_canceled(&id).unwrap();
        assert!(main.client().query_canceled(&id, main.client().id()).unwrap());

        assert_eq!(relay.reinstall().await.unwrap(), 2);
        assert!(!main.client().query_canceled(&id, main.client().id()).unwrap());

        // Registered contexts are claimed by the new version
        let greeting = main
            .send_request(methods::HELLO, json!("worker"), &CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(greeting, json!("Hello from the page, worker!"));

        let status = relay.status().await.unwrap();
        assert_eq!(status.state, RelayState::Active);
        assert_eq!(status.clients, 2);

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_forward_without_owner_fails_definitively() {
        let (relay, main) = start(slow_config());
        main.client().unregister();

        let error = timeout(
            Duration::from_secs(2),
            main.send_request(methods::HELLO, json!("worker"), &CancellationToken::none()),
        )
        .await
        .expect("forward does not hang")
        .unwrap_err();
        let rpc = error.rpc_error().unwrap();
        assert_eq!(rpc.code, codes::RESOURCE_UNAVAILABLE);
        assert!(rpc.message.starts_with("no client"));

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_unregisters_both_contexts() {
        let (relay, main) = start(slow_config());
        assert_eq!(relay.status().await.unwrap().clients, 2);

        main.shutdown().await.unwrap();

        assert_eq!(relay.status().await.unwrap().clients, 0);
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_start_after_relay_stopped() {
        let (relay, main) = start(slow_config());
        main.shutdown().await.unwrap();
        relay.shutdown();

        let error = MainContext::start(&relay, slow_config()).err().unwrap();
        assert!(matches!(error, ContextError::Relay(RelayError::Unavailable)));
    }
}
