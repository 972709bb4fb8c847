#![allow(dead_code)]

pub mod tracing_init {
    use std::sync::Once;

    static TRACING_INIT: Once = Once::new();

    /// Install a test subscriber once per process. Honors `RUST_LOG`.
    pub fn setup_tracing() {
        TRACING_INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
                )
                .with_test_writer()
                .try_init();
        });
    }
}

pub mod runtime {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod fixtures {
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use wayfarer::content::{Content, Renderable};
    use wayfarer::nav::NavigationController;
    use wayfarer::platform::Platform;
    use wayfarer::route::{RouteDefinition, RouteTable};

    /// Inline leaf content.
    pub fn leaf(text: &str) -> Renderable {
        Renderable::inline(Content::text(text))
    }

    /// Resolve a route tree, panicking on authoring errors.
    pub fn table(defs: Vec<RouteDefinition>) -> Arc<RouteTable> {
        RouteTable::new(defs).unwrap()
    }

    /// Controller over an in-memory platform with an ambient table.
    pub fn controller(defs: Vec<RouteDefinition>) -> Arc<NavigationController> {
        NavigationController::with_table(table(defs), Platform::in_memory())
    }

    /// Poll `check` until it passes or `timeout` elapses. The async loader
    /// settles on coroutine time, so assertions on its output spin here
    /// instead of sleeping a fixed amount.
    pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        check()
    }
}
