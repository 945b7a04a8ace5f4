//! # Cancellation Across Contexts
//!
//! The main context cancels a call it made to the worker. The cancellation
//! travels as a relay record; the worker's token polls the record and the
//! handler stops with `-32800`.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{slow_config, start};
    use context_runtime::handlers::methods;
    use context_runtime::ConnectionError;
    use serde_json::json;
    use shared_types::{codes, CancellationId};
    use std::time::{Duration, Instant};
    use xc_cancellation::{CancelTransport, CancellationToken, CancellationTokenSource};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    const CANCEL_AFTER: Duration = Duration::from_millis(100);

    /// Cancel `source` after [`CANCEL_AFTER`].
    fn cancel_later(source: CancellationTokenSource) {
        tokio::spawn(async move {
            tokio::time::sleep(CANCEL_AFTER).await;
            source.cancel();
        });
    }

    fn assert_cancelled(result: Result<serde_json::Value, ConnectionError>) {
        let error = result.expect_err("call was cancelled");
        let rpc = error.rpc_error().expect("worker answered with an error");
        assert_eq!(rpc.code, codes::REQUEST_CANCELLED);
        assert_eq!(rpc.message, "request cancelled");
    }

    // =========================================================================
    // CALLS THAT RUN TO COMPLETION
    // =========================================================================

    #[tokio::test]
    async fn test_fast_and_slow_calls_complete() {
        let config = slow_config().with_slow_call(5, Duration::from_millis(5));
        let (relay, main) = start(config);
        let none = CancellationToken::none();

        let sum = main
            .send_request(methods::ADD_NUMBERS, json!([1, 2]), &none)
            .await
            .unwrap();
        assert_eq!(sum, json!(3));

        let sum = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!({"a": 1, "b": 2}), &none)
            .await
            .unwrap();
        assert_eq!(sum, json!(3));

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    // =========================================================================
    // CANCELLED MID-POLL
    // =========================================================================

    #[tokio::test]
    async fn test_slow_call_cancelled_mid_poll() {
        let (relay, main) = start(slow_config());
        let source = CancellationTokenSource::new();
        let token = source.token();

        let started = Instant::now();
        cancel_later(source);
        let result = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token)
            .await;

        assert_cancelled(result);
        assert!(started.elapsed() < Duration::from_secs(2));

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_slow_call_cancelled_with_blocking_post() {
        let config = slow_config().with_cancel_transport(CancelTransport::Post);
        let (relay, main) = start(config);
        let source = CancellationTokenSource::new();
        let token = source.token();

        cancel_later(source);
        let result = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token)
            .await;

        assert_cancelled(result);
        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_cancelled_before_the_call() {
        let (relay, main) = start(slow_config());
        let source = CancellationTokenSource::new();
        source.cancel();

        // The record is written as soon as the continuation runs; the
        // worker sees it on its first poll
        let result = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &source.token())
            .await;

        assert_cancelled(result);
        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    // =========================================================================
    // RECORD CLEANUP
    // =========================================================================

    #[tokio::test]
    async fn test_record_deleted_after_completion() {
        let (relay, main) = start(slow_config());
        let source = CancellationTokenSource::new();
        let token = source.token();

        cancel_later(source);
        let result = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token)
            .await;
        assert_cancelled(result);

        // First request on the connection has id 0
        let canceled = main
            .client()
            .query_canceled(&CancellationId::from(0), main.client().id())
            .unwrap();
        assert!(!canceled);

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_record_kept_without_cleanup() {
        let mut config = slow_config();
        config.cleanup_records = false;
        let (relay, main) = start(config);
        let source = CancellationTokenSource::new();
        let token = source.token();

        cancel_later(source);
        let result = main
            .send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token)
            .await;
        assert_cancelled(result);

        let canceled = main
            .client()
            .query_canceled(&CancellationId::from(0), main.client().id())
            .unwrap();
        assert!(canceled);

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_abandoned_call_leaves_no_record() {
        let (relay, main) = start(slow_config().with_slow_call(20, Duration::from_millis(10)));
        let source = CancellationTokenSource::new();
        let token = source.token();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(30),
            main.send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &token),
        )
        .await;
        assert!(abandoned.is_err());

        // The caller no longer waits, so cancelling writes nothing
        source.cancel();

        let canceled = main
            .client()
            .query_canceled(&CancellationId::from(0), main.client().id())
            .unwrap();
        assert!(!canceled);
        assert_eq!(relay.status().await.unwrap().records, 0);

        main.shutdown().await.unwrap();
        relay.shutdown();
    }

    #[tokio::test]
    async fn test_cancellation_is_scoped_to_the_call() {
        let (relay, main) = start(slow_config().with_slow_call(30, Duration::from_millis(10)));
        let source = CancellationTokenSource::new();
        let cancelled_token = source.token();
        let none = CancellationToken::none();

        cancel_later(source);
        let (cancelled, untouched) = tokio::join!(
            main.send_request(methods::ADD_NUMBERS_SLOW, json!([1, 2]), &cancelled_token),
            main.send_request(methods::ADD_NUMBERS_SLOW, json!([3, 4]), &none),
        );

        assert_cancelled(cancelled);
        assert_eq!(untouched.unwrap(), json!(7));

        main.shutdown().await.unwrap();
        relay.shutdown();
    }
}
