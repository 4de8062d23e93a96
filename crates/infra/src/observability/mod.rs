//! Tracing subscriber bootstrap
//!
//! Filtering follows `RUST_LOG` and defaults to `info` for the liftlog
//! crates. Initialisation happens once per process; later calls are no-ops.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "warn,liftlog_core=info,liftlog_infra=info,liftlog_common=info";

static INIT: OnceCell<LogFormat> = OnceCell::new();

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber.
///
/// Returns `true` if this call installed it. Returns `false` if tracing was
/// already initialised, here or by someone else.
pub fn init_tracing(format: LogFormat) -> bool {
    let mut installed = false;
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
        let result = match format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().with_current_span(false).try_init(),
        };
        installed = result.is_ok();
        format
    });
    installed
}
