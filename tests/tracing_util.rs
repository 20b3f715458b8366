//! Shared tracing bootstrap for integration tests.

use tracing_subscriber::EnvFilter;

/// Initializes a test-writer subscriber once per process; repeated calls
/// are no-ops so every test can request it without coordination.
pub struct TestTracing;

impl TestTracing {
    pub fn init() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        TestTracing
    }
}
