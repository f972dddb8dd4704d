#![allow(dead_code)]

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::fake_executor::FakeExecutor;
pub use sitepipe_test_utils::fixture::SiteFixture;
pub use sitepipe_test_utils::{init_tracing, with_timeout};
