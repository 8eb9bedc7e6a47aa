//! Invariant 5: the retrier makes at most `max_retries + 1` attempts and
//! at most `class_budget + 1` attempts per error class, whichever is
//! smaller; cancellation bounds both below.

use proptest::prelude::*;
use statsgate_core::GatewayError;
use statsgate_retry::{RetryConfig, Retrier};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn attempts_never_exceed_the_tighter_bound(
        max_retries in 0u32..8,
        network_retries in 0u32..8,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let config = RetryConfig {
                max_retries,
                network_retries,
                base_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                ..RetryConfig::default()
            };
            let retrier = Retrier::new(config);
            let calls = AtomicU32::new(0);
            let cancellation = CancellationToken::new();

            let result = retrier
                .execute(&cancellation, "test-op", |_attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), GatewayError<String>>(GatewayError::Network { message: "down".into() }) }
                })
                .await;

            prop_assert!(result.is_err());
            let expected = max_retries.min(network_retries) + 1;
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            Ok(())
        })?;
    }
}
