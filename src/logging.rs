//! Diagnostic logging setup.
//!
//! Logs go to **stderr** so stdout stays clean for `docnav show` output
//! and scripts. The filter comes from `DOCNAV_LOG` (standard `EnvFilter`
//! syntax, e.g. `docnav=debug`) and defaults to `warn`, or `debug` with
//! `--verbose`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DOCNAV_LOG";

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool) {
    let default = if verbose { "docs_navigator=debug,docnav=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
