//! # Procedure Calls Through the Relay
//!
//! The worker calls back into the main context. The relay forwards the call
//! to the worker's owner, whose dispatcher answers on a one-shot reply
//! channel.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{slow_config, start};
    use context_runtime::handlers::{methods, PageHello};
    use context_runtime::RelayDispatcher;
    use serde_json::json;
    use shared_types::{codes, RpcRequest, RpcResponse};
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;
    use xc_cancellation::CancellationToken;
    use xc_relay::{RelayConfig, RelayProcess};

    #[tokio::test]
    async fn test_hello_round_trip_through_main_context() {
        let (relay, main) = start(slow_config());

        let greeting = main
            .send_request(methods::HELLO, json!("worker"), &CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(greeting, json!("Hello from the page, worker!"));

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_hello_with_bad_params_reports_owner_error() {
        let (relay, main) = start(slow_config());

        let error = main
            .send_request(methods::HELLO, json!(7), &CancellationToken::none())
            .await
            .unwrap_err();
        assert_eq!(error.rpc_error().unwrap().code, codes::INVALID_PARAMS);

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_forward_from_worker_thread() {
        let relay = RelayProcess::spawn(RelayConfig::default()).unwrap();
        let main = relay.register_client().unwrap();
        let worker = relay.register_worker(main.client.id()).unwrap();

        let mut dispatcher = RelayDispatcher::new();
        dispatcher.register(methods::HELLO, PageHello);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let serving = tokio::spawn(dispatcher.run(main.inbox, shutdown_rx));

        let client = worker.client.clone();
        let response = tokio::task::spawn_blocking(move || {
            client.forward_rpc_blocking(RpcRequest::new(methods::HELLO, json!("worker")))
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(
            response,
            RpcResponse::result(json!("Hello from the page, worker!"))
        );

        shutdown_tx.send(true).unwrap();
        serving.await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_unknown_forwarded_method_is_a_hard_error() {
        let relay = RelayProcess::spawn(RelayConfig::default()).unwrap();
        let main = relay.register_client().unwrap();
        let worker = relay.register_worker(main.client.id()).unwrap();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(RelayDispatcher::new().run(main.inbox, shutdown_rx));

        let response = timeout(
            Duration::from_secs(2),
            worker.client.forward_rpc(RpcRequest::new("goodbye", json!(null))),
        )
        .await
        .unwrap()
        .unwrap();
        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: goodbye");
        relay.shutdown();
    }
}
