use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV_VAR: &str = "PLUGIN_HOOK_LOG";

/// Install the stderr log subscriber.
///
/// Logging is off unless `PLUGIN_HOOK_LOG` is set, so a normal hook run
/// writes nothing besides the decision on stdout. Calling this twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("off"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
