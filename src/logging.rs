use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level` when set. Calling this more than once is a
/// no-op, which keeps tests that share a process from fighting over it.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
