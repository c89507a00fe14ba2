use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: JSON lines on stdout, filtered by `RUST_LOG`
/// (default `info`). `log` records from actix and the request logger are
/// forwarded into the same pipeline.
///
/// Returns an error if a global subscriber is already set.
pub fn init_telemetry() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialization_fails() {
        // other tests in this binary may have won the race
        let _ = init_telemetry();
        assert!(init_telemetry().is_err());
    }
}
