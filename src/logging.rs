//! Logging initialization.
//!
//! The library itself only emits through the `log` facade. Embedders that do
//! not bring their own logger can call [`init`].

use env_logger::Env;

/// Initializes `env_logger` with an `info` default, overridable via `RUST_LOG`.
///
/// Calling it more than once is harmless; later calls are ignored.
pub fn init() {
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}
