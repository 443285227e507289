//! Request/response hooks between the network layer and the cookie manager.
//!
//! The interceptor is stateless apart from its [`CookieManagerHandle`]. It turns
//! outgoing URLs into `Cookie` request headers and incoming `Set-Cookie`
//! response headers into stored cookies. Nothing here returns an error:
//! unusable URLs and malformed headers are logged and skipped.
//!
//! [`CookieInterceptor`] also implements [`reqwest::cookie::CookieStore`], so a
//! client built with `cookie_provider` routes all its cookie traffic through
//! the manager:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_cookies::config::CookieConfig;
//! use gosub_cookies::cookies::{CookieInterceptor, CookieManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(CookieManager::open(&CookieConfig::default())?);
//! let interceptor = Arc::new(CookieInterceptor::new(manager));
//! let client = reqwest::Client::builder().cookie_provider(interceptor).build()?;
//! # let _ = client;
//! # Ok(()) }
//! ```
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue};
use log::{debug, warn};
use url::Url;

use crate::cookies::cookie_jar::domain_matches;
use crate::cookies::cookies::{now_millis, CookieManagerHandle};
use crate::cookies::parser::parse_set_cookie;
use crate::cookies::policy::{is_third_party, path_matches};

/// Bridges HTTP traffic and a [`CookieManager`](crate::cookies::CookieManager).
#[derive(Debug, Clone)]
pub struct CookieInterceptor {
    manager: CookieManagerHandle,
}

impl CookieInterceptor {
    pub fn new(manager: CookieManagerHandle) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &CookieManagerHandle {
        &self.manager
    }

    /// `Cookie` header for a request to `url`, or `None` when nothing applies.
    pub fn build_cookie_header(&self, url: &Url) -> Option<String> {
        self.build_cookie_header_for(url, None)
    }

    /// Like [`build_cookie_header`](Self::build_cookie_header), for a request
    /// made on behalf of the top-level document at `site_for_cookies`.
    ///
    /// With third-party blocking on, a request to another site sends nothing.
    pub fn build_cookie_header_for(&self, url: &Url, site_for_cookies: Option<&Url>) -> Option<String> {
        let Some(host) = url.host_str() else {
            warn!("Cannot attach cookies to URL without host: {url}");
            return None;
        };
        if self.blocks_third_party(host, site_for_cookies) {
            debug!("Not sending third-party cookies to {host}");
            return None;
        }

        let https = url.scheme() == "https";
        let path = url.path();
        let now = now_millis();

        let pairs: Vec<String> = self
            .manager
            .get_for_domain(host)
            .into_iter()
            .filter(|c| path_matches(path, &c.path))
            .filter(|c| https || !c.secure)
            .filter(|c| !c.is_expired_at(now))
            .map(|c| c.pair())
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Stores every `Set-Cookie` header of a response from `url`.
    ///
    /// Returns the number of header lines that parsed into a cookie, whether or
    /// not the policy then accepted it.
    pub fn extract_set_cookies(&self, url: &Url, headers: &HeaderMap) -> usize {
        self.extract_set_cookies_for(url, headers, None)
    }

    /// Like [`extract_set_cookies`](Self::extract_set_cookies), applying
    /// third-party blocking relative to `site_for_cookies`.
    pub fn extract_set_cookies_for(&self, url: &Url, headers: &HeaderMap, site_for_cookies: Option<&Url>) -> usize {
        let lines = headers.get_all(SET_COOKIE).iter().filter_map(header_str);
        self.store_lines(url, site_for_cookies, lines)
    }

    /// Same as [`extract_set_cookies`](Self::extract_set_cookies) for headers
    /// given as `(name, value)` pairs. Names are compared case-insensitively.
    pub fn extract_set_cookie_pairs<'a, I>(&self, url: &Url, headers: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let lines = headers
            .into_iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(SET_COOKIE.as_str()))
            .map(|(_, value)| value);
        self.store_lines(url, None, lines)
    }

    /// Hook for the network layer before a request is sent.
    pub fn on_outgoing_request(&self, url: &Url) -> Option<String> {
        self.build_cookie_header(url)
    }

    /// Hook for the network layer once response headers arrived.
    pub fn on_response_received(&self, url: &Url, headers: &HeaderMap) {
        self.extract_set_cookies(url, headers);
    }

    fn blocks_third_party(&self, host: &str, site_for_cookies: Option<&Url>) -> bool {
        let Some(site_host) = site_for_cookies.and_then(Url::host_str) else {
            return false;
        };
        self.manager.is_block_third_party_cookies() && is_third_party(host, site_host)
    }

    fn store_lines<'a>(&self, url: &Url, site_for_cookies: Option<&Url>, lines: impl Iterator<Item = &'a str>) -> usize {
        let Some(host) = url.host_str() else {
            warn!("Ignoring Set-Cookie from URL without host: {url}");
            return 0;
        };
        if self.blocks_third_party(host, site_for_cookies) {
            debug!("Ignoring third-party Set-Cookie from {host}");
            return 0;
        }

        let mut parsed = 0;
        for line in lines {
            let cookie = match parse_set_cookie(line, host) {
                Ok(cookie) => cookie,
                Err(e) => {
                    debug!("Ignoring Set-Cookie from {host}: {e}");
                    continue;
                }
            };
            parsed += 1;

            // A response may only scope cookies to a domain it belongs to
            if cookie.is_domain_cookie() && !domain_matches(&cookie.domain, host) {
                debug!("Ignoring cookie {} for foreign domain {} from {host}", cookie.name, cookie.domain);
                continue;
            }
            self.manager.set(cookie);
        }
        parsed
    }
}

fn header_str(value: &HeaderValue) -> Option<&str> {
    match value.to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            debug!("Skipping non-ASCII Set-Cookie header");
            None
        }
    }
}

impl reqwest::cookie::CookieStore for CookieInterceptor {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let lines = cookie_headers.filter_map(header_str);
        self.store_lines(url, None, lines);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.build_cookie_header(url)?;
        match HeaderValue::from_str(&header) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Stored cookies for {url} do not form a valid header: {e}");
                None
            }
        }
    }
}
