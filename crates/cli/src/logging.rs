use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the event feed.
pub fn init(json: bool) {
    // Fall back to `DEFAULT_LEVEL` if RUST_LOG is unset or invalid.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
}
