use tracing_subscriber::{fmt, EnvFilter};

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Picks the log level: each `-v` steps up from `warn`, otherwise the
/// configured level is used.
pub fn level_for(verbose: u8, configured: Option<&str>) -> &'static str {
    match verbose {
        0 => configured
            .map(|c| c.trim().to_lowercase())
            .and_then(|c| LEVELS.iter().copied().find(|l| *l == c))
            .unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stderr subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init(level: &str) -> Result<(), String> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| format!("invalid log level '{level}': {e}"))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("failed to initialise logging: {e}"))
}
