//! SWR Memo demo
//!
//! Memoizes a simulated flaky upstream lookup and drives it on an interval,
//! logging which value each call got. Prints the final statistics as JSON.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swr_memo::{MemoConfig, Memoized};

/// Demo driver parameters, loaded from environment variables.
#[derive(Debug, Clone)]
struct DemoConfig {
    /// Delay between two calls
    interval: Duration,
    /// Percentage of upstream calls that fail
    failure_rate: u64,
    /// Number of calls before exiting
    calls: u64,
}

impl DemoConfig {
    /// # Environment Variables
    /// - `DEMO_INTERVAL_MS` - Delay between calls (default: 250)
    /// - `DEMO_FAILURE_RATE` - Failure percentage of the upstream (default: 30)
    /// - `DEMO_CALLS` - Number of calls (default: 40)
    fn from_env() -> Self {
        let read = |name: &str, default: u64| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            interval: Duration::from_millis(read("DEMO_INTERVAL_MS", 250)),
            failure_rate: read("DEMO_FAILURE_RATE", 30).min(100),
            calls: read("DEMO_CALLS", 40),
        }
    }
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load the freshness policy and demo parameters from the environment
/// 3. Memoize the simulated upstream
/// 4. Call it on an interval until done or until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "debug" so path decisions are visible, can be overridden
    // with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swr_memo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SWR Memo demo");

    let memo_config = with_demo_windows(MemoConfig::from_env());
    let demo = DemoConfig::from_env();
    info!(
        "Configuration loaded: max_age={:?}, stale_while_revalidate={:?}, stale_if_error={:?}, cache_errors={}, interval={:?}, failure_rate={}%",
        memo_config.max_age,
        memo_config.stale_while_revalidate,
        memo_config.stale_if_error,
        memo_config.cache_errors,
        demo.interval,
        demo.failure_rate
    );

    let upstream_calls = Arc::new(AtomicU64::new(0));
    let counter = upstream_calls.clone();
    let failure_rate = demo.failure_rate;
    let lookup = Memoized::new(
        move |region: String| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { fetch_price(region, attempt, failure_rate).await }
        },
        memo_config,
    );

    tokio::select! {
        _ = drive(&lookup, &demo) => {
            info!("Demo finished");
        }
        _ = shutdown_signal() => {}
    }

    let stats = serde_json::to_string_pretty(&lookup.stats()).context("serializing stats")?;
    info!(
        "Upstream invoked {} times",
        upstream_calls.load(Ordering::SeqCst)
    );
    println!("{stats}");

    Ok(())
}

/// Fills each unset window with a demo default, keeping whatever the
/// environment set.
fn with_demo_windows(mut config: MemoConfig) -> MemoConfig {
    config.max_age.get_or_insert(Duration::from_secs(1));
    config
        .stale_while_revalidate
        .get_or_insert(Duration::from_secs(2));
    config.stale_if_error.get_or_insert(Duration::from_secs(5));
    config
}

/// Calls the memoized lookup `demo.calls` times, `demo.interval` apart.
async fn drive<O>(
    lookup: &Memoized<String, O, swr_memo::Identity, swr_memo::MemoryStore<String, u64, String>>,
    demo: &DemoConfig,
) where
    O: swr_memo::Operation<String, Output = u64, Error = String>,
{
    let mut ticker = tokio::time::interval(demo.interval);
    for n in 0..demo.calls {
        ticker.tick().await;
        match lookup.call("eu-west".to_string()).await {
            Ok(price) => info!("Call {}: price={}", n, price),
            Err(err) => warn!("Call {}: upstream error: {}", n, err),
        }
    }
}

/// Simulated upstream: slow, and failing on a deterministic share of attempts.
async fn fetch_price(region: String, attempt: u64, failure_rate: u64) -> Result<u64, String> {
    tokio::time::sleep(Duration::from_millis(150)).await;
    if (attempt * 37) % 100 < failure_rate {
        return Err(format!("upstream unavailable for {region} (attempt {attempt})"));
    }
    Ok(1_000 + attempt)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_windows_fill_only_unset_fields() {
        let config = with_demo_windows(
            MemoConfig::default().with_stale_while_revalidate(Duration::from_millis(300)),
        );
        assert_eq!(config.max_age, Some(Duration::from_secs(1)));
        assert_eq!(config.stale_while_revalidate, Some(Duration::from_millis(300)));
        assert_eq!(config.stale_if_error, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_demo_windows_keep_fully_configured_policy() {
        let configured = MemoConfig::default()
            .with_max_age(Duration::from_millis(10))
            .with_stale_while_revalidate(Duration::from_millis(20))
            .with_stale_if_error(Duration::from_millis(30))
            .with_cache_errors(true);
        assert_eq!(with_demo_windows(configured.clone()), configured);
    }
}
