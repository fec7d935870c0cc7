use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};

/// Install the global subscriber. `RUST_LOG` wins over `Config::log_filter`.
/// A subscriber that is already installed is left in place.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("invalid log filter: {e}")))?;

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    Ok(())
}

/// Test-writer subscriber, installed once per process
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("longevix=debug"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let config = Config::default();
        init_tracing(&config).unwrap();
        init_tracing(&config).unwrap();
    }
}
