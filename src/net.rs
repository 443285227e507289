//! Navigation probes over a cookie-aware HTTP client.
mod fetch;
mod response;

pub use fetch::{client_with_cookies, fetch, ProbeMethod};
pub use response::ProbeResponse;
