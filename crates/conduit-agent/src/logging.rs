//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt, registry};

/// Default filter used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "conduit_agent=info,conduit_tooling=info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`.
///
/// Returns `false` if a global subscriber was already installed, in which case the
/// existing one is left untouched.
pub fn init_logging(default_directive: &str) -> bool {
    registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(fmt::layer())
        .try_init()
        .is_ok()
}
