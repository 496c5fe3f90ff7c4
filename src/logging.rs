use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Everything goes to stderr so stdout stays
/// usable for `list` and `metrics`.
///
/// `RUST_LOG` wins over the verbosity flags when it is set.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pubs={}", level(verbose, quiet))));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
