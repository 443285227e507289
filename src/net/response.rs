//! Buffered result of a navigation probe.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names. `Set-Cookie` lines are still present after the cookie
//!   provider has consumed them.
//! - `body` is empty for `HEAD` probes.
use http::HeaderMap;
use url::Url;

/// Response of a [`fetch`](crate::net::fetch) probe.
#[derive(Debug)]
pub struct ProbeResponse {
    /// Final URL of the response (after redirects, if any).
    pub url: Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Reason phrase, `"Unknown"` for non-standard codes.
    pub status_text: String,

    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl ProbeResponse {
    /// Number of `Set-Cookie` headers in the response.
    pub fn set_cookie_count(&self) -> usize {
        self.headers.get_all(http::header::SET_COOKIE).iter().count()
    }
}
