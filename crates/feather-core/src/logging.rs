//! Tracing subscriber setup shared by every Feather host.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info,feather=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `filter`. Calling this twice is harmless: the
/// second registration is ignored.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(DEFAULT_FILTER);
        init_tracing("warn");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        init_tracing("feather=[not valid");
    }
}
