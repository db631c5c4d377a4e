/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
///
/// `log` records emitted by the codecs are forwarded through the same
/// subscriber. Returns `false` when another subscriber was already set.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() -> bool {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
}

/// Browser builds report through the panic hook and `console` only.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() -> bool {
    false
}
