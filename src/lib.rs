//! Cookie subsystem of the gosub browser engine.
//!
//! - [`cookies`]: records, jar, policy, persistence and the HTTP interceptor.
//! - [`config`]: where the documents live and the initial policy flags.
//! - [`net`]: navigation probes over a cookie-aware `reqwest` client.
//! - [`logging`]: optional `env_logger` setup for embedders and demos.

pub mod config;
pub mod cookies;
pub mod errors;
pub mod logging;
pub mod net;

pub use config::CookieConfig;
pub use cookies::{Cookie, CookieInterceptor, CookieManager};
pub use errors::{CookieError, SetCookieError};
