use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKKEEP_LOG";

/// Installs the stderr subscriber. `TASKKEEP_LOG` takes precedence over
/// `default_level`. Calling this again after a subscriber is set is a no-op.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
