//! Integration tests for lazy, exactly-once channel initialization.
//!
//! Uses a counting connector injected through the public `Connector`
//! seam, so no database server is needed to exercise the concurrency
//! guarantees.

use db_channels::{
    ChannelError, ChannelRegistry, ChannelResult, ChannelSpec, Connector, QueryTracer,
    RegistryConfig,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

/// Hands out one handle id per connect attempt, after a short pause so
/// concurrent callers pile up on the in-flight initialization.
struct CountingConnector {
    attempts: AtomicUsize,
    fail_channels: Vec<String>,
}

impl CountingConnector {
    fn new(fail_channels: &[&str]) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            fail_channels: fail_channels.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FakeHandle {
    channel: String,
    attempt: usize,
}

impl Connector for CountingConnector {
    type Handle = FakeHandle;

    async fn connect(&self, spec: &ChannelSpec, _tracer: QueryTracer) -> ChannelResult<FakeHandle> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;

        if self.fail_channels.contains(&spec.name) {
            return Err(ChannelError::connection(&spec.name, "engine unreachable"));
        }
        Ok(FakeHandle {
            channel: spec.name.clone(),
            attempt,
        })
    }
}

fn two_channel_config() -> RegistryConfig {
    serde_json::from_value(json!({
        "main": { "sqlite": { "dsn": "sqlite:main.db" } },
        "broken": { "postgresql": { "dsn": "postgres://nowhere/app" } },
    }))
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_callers_share_one_initialization() {
    const CALLERS: usize = 32;

    let connector = Arc::new(CountingConnector::new(&[]));
    let registry = Arc::new(
        ChannelRegistry::with_connector(two_channel_config(), connector.clone()).unwrap(),
    );
    let barrier = Arc::new(Barrier::new(CALLERS));

    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let registry = registry.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            registry.get("main").await
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(connector.attempts(), 1, "connector ran more than once");
    assert!(
        handles.iter().all(|h| h == &handles[0]),
        "callers observed different handles"
    );
    assert_eq!(handles[0].channel, "main");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_failure_is_shared_and_permanent() {
    const CALLERS: usize = 16;

    let connector = Arc::new(CountingConnector::new(&["broken"]));
    let registry = Arc::new(
        ChannelRegistry::with_connector(two_channel_config(), connector.clone()).unwrap(),
    );
    let barrier = Arc::new(Barrier::new(CALLERS));

    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let registry = registry.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            registry.get("broken").await
        }));
    }

    let mut errors = Vec::new();
    for task in tasks {
        errors.push(task.await.unwrap().unwrap_err());
    }

    assert_eq!(connector.attempts(), 1);
    assert!(errors.iter().all(|e| e == &errors[0]));

    // A later caller still gets the cached failure, with no new attempt.
    let late = registry.get("broken").await.unwrap_err();
    assert_eq!(late, errors[0]);
    assert_eq!(connector.attempts(), 1);
    assert!(late.is_retryable());
}

#[tokio::test]
async fn channels_initialize_independently() {
    let connector = Arc::new(CountingConnector::new(&["broken"]));
    let registry =
        ChannelRegistry::with_connector(two_channel_config(), connector.clone()).unwrap();

    registry.get("broken").await.unwrap_err();
    let main = registry.get("main").await.unwrap();

    // One attempt per channel; the failed channel does not poison others.
    assert_eq!(connector.attempts(), 2);
    assert_eq!(main.channel, "main");
}

#[tokio::test]
async fn missing_channel_fails_fast() {
    let connector = Arc::new(CountingConnector::new(&[]));
    let registry =
        ChannelRegistry::with_connector(two_channel_config(), connector.clone()).unwrap();

    let err = registry.get("absent").await.unwrap_err();
    assert_eq!(err, ChannelError::not_found("absent"));
    assert!(!err.is_retryable());
    // No channel was constructed or initialized for the unknown name.
    assert_eq!(connector.attempts(), 0);
}
