use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// Parses a level name, accepting the Python-style `WARNING`, `CRITICAL`
/// and `NOTSET` spellings as well as tracing's own.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    let value = value.trim().to_lowercase();
    match value.as_str() {
        "warning" => Some(LevelFilter::WARN),
        "critical" | "fatal" => Some(LevelFilter::ERROR),
        "notset" => Some(LevelFilter::TRACE),
        other => LevelFilter::from_str(other).ok(),
    }
}

/// Filter for a `LOGLEVEL` value. Unset or unknown values mean `info`.
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    let level = value.and_then(parse_level).unwrap_or(LevelFilter::INFO);
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("")
}
