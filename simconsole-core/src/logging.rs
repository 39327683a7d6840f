//! Logging setup shared by front-ends

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global `tracing` subscriber
///
/// Honours `RUST_LOG` and falls back to `default_filter`. Calling it a
/// second time is harmless: the first subscriber stays in place.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(DEFAULT_FILTER);
        init("debug");
        tracing::debug!("logging initialised");
    }
}
