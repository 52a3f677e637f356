use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::prelude::*;

/// Enable tracing to chrome://tracing or https://ui.perfetto.dev/
///
/// Spans and events of the emulator are written to a `trace-*.json` file in the current
/// directory. Make sure to store the guard in a variable in the scope to be instrumented,
/// otherwise the trace will be disabled immediately.
pub fn chrome_trace() -> FlushGuard {
    let (chrome_layer, guard) = ChromeLayerBuilder::new().include_args(true).build();
    tracing_subscriber::registry().with(chrome_layer).init();
    guard
}
