use tracing_subscriber::EnvFilter;

/// Set up tracing. Everything goes to stderr: stdout belongs to the
/// JSON-RPC transport. `RUST_LOG` wins when set; otherwise the repeated
/// `-v` flags pick the filter.
pub fn setup_logging(verbose_level: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let filter_str = match verbose_level {
            0 => "warn,toolbridge=info",
            1 => "info,toolbridge=debug",
            _ => "debug,toolbridge=trace",
        };
        EnvFilter::new(filter_str)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
