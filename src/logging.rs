//! Log output setup.

use std::error::Error;
use std::io;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when it is set.
pub fn setup_logging(default_level: &str) -> Result<(), Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(default_level)?,
    };

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(io::stderr)).try_init()?;

    Ok(())
}

/// Log filter used when `RUST_LOG` is not set.
fn default_filter(level: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_levels() {
        assert!(default_filter("info").is_ok());
        assert!(default_filter("debug").is_ok());
        assert!(default_filter("lnpro=debug").is_ok());
    }

    #[test]
    fn default_filter_rejects_unknown_level() {
        assert!(default_filter("lnpro=verbose").is_err());
    }
}
