//! Tracing setup

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize tracing with JSON output
///
/// The filter comes from the configured log level; an unparsable level
/// falls back to `info`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Tracing initialized for service: {}", config.service.name);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_with_defaults() {
        let config = Config::default();
        // This should not panic
        let _ = init_tracing(&config);
    }
}
