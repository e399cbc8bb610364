//! Logging initialization
//!
//! `RUST_LOG` takes precedence over the default directive. Installing the
//! subscriber twice is not an error, so embedding applications and tests may
//! call [`init_logging`] freely.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when neither `RUST_LOG` nor the caller specify one
pub const DEFAULT_DIRECTIVE: &str = "appdesc=info";

/// Builds the filter: `RUST_LOG` if set and valid, else the given directive
pub fn env_filter(default_directive: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.unwrap_or(DEFAULT_DIRECTIVE)))
}

/// Installs a stderr fmt subscriber; returns false if one was already set
pub fn init_logging(default_directive: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(std::env::var_os("NO_COLOR").is_none()),
        )
        .with(env_filter(default_directive))
        .try_init()
        .is_ok()
}
