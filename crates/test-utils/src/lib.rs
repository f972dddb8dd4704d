//! Helpers shared by the `sitepipe` integration tests.

pub mod builders;
pub mod fake_executor;
pub mod fixture;

pub use builders::ConfigFileBuilder;
pub use fake_executor::FakeExecutor;
pub use fixture::SiteFixture;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for a whole pipeline run in tests. Image and script
/// compilation in debug builds is slow.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Install a test-writer subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`.
/// `SITEPIPE_LOG=sitepipe=debug cargo test` raises the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SITEPIPE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("sitepipe=info,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    within(RUN_TIMEOUT, f).await
}

pub async fn within<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(out) => out,
        Err(_) => panic!("test timed out after {limit:?}"),
    }
}
