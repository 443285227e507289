//! Cookie core types.
//!
//! This module defines the serializable [`Cookie`] record, its [`SameSite`]
//! attribute, the [`CookieKey`] identity used by the jar, and the shared
//! [`CookieManagerHandle`].
//!
//! # Time representation
//! All instants are **epoch milliseconds** (`i64`). An `expiry_time` of `0`
//! means "no expiry" and is used for session cookies.
//!
//! The [`Cookie`] struct (de)serializes to the camelCase document format used by
//! the cookies file and by [`CookieManager::export_json`](crate::cookies::CookieManager::export_json):
//!
//! ```rust
//! use gosub_cookies::cookies::Cookie;
//!
//! let c = Cookie::new("session", "abc123", "example.com", "/");
//! let json = serde_json::to_value(&c).unwrap();
//! assert_eq!(json["httpOnly"], false);
//! assert_eq!(json["sessionOnly"], true);
//! assert_eq!(json["sameSite"], "Lax");
//! ```

use crate::cookies::CookieManager;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;

/// A handle to the cookie manager of a browser session.
///
/// The manager is internally synchronized, so the handle can be cloned freely
/// into UI code and network workers alike.
pub type CookieManagerHandle = Arc<CookieManager>;

/// Current wall clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// SameSite policy of a cookie.
///
/// Serializes as `Strict`/`Lax`/`None`. Deserializing goes through
/// [`SameSite::parse`], so documents may use any casing; unknown, empty and
/// `null` values read as `Lax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    /// Parses an attribute value case-insensitively. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<SameSite> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("strict") {
            Some(SameSite::Strict)
        } else if value.eq_ignore_ascii_case("lax") {
            Some(SameSite::Lax)
        } else if value.eq_ignore_ascii_case("none") {
            Some(SameSite::None)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl<'de> Deserialize<'de> for SameSite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(SameSite::parse).unwrap_or_default())
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cookie as stored/serialized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name (case-sensitive, never empty).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Domain scoping.
    ///
    /// A leading `.` marks a domain cookie (set through a `Domain=` attribute)
    /// that is shared with subdomains. Without it, the cookie is host-only.
    pub domain: String,

    /// Path scoping, `"/"` when not specified.
    pub path: String,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// If `true`, cookie is blocked from access by client-side scripts.
    pub http_only: bool,

    /// `true` unless an `Expires` or `Max-Age` attribute was seen.
    pub session_only: bool,

    /// Expiry in epoch milliseconds, `0` for session cookies.
    pub expiry_time: i64,

    #[serde(default)]
    pub same_site: SameSite,

    #[serde(default = "now_millis")]
    pub created_time: i64,

    #[serde(default = "now_millis")]
    pub last_accessed_time: i64,
}

impl Cookie {
    /// Creates a session cookie with default attributes.
    ///
    /// An empty `path` is normalized to `"/"`.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: normalize_path(path.into()),
            secure: false,
            http_only: false,
            session_only: true,
            expiry_time: 0,
            same_site: SameSite::Lax,
            created_time: now,
            last_accessed_time: now,
        }
    }

    /// Identity key of this cookie inside a jar.
    pub fn key(&self) -> CookieKey {
        CookieKey::new(&self.domain, &self.path, &self.name)
    }

    /// Whether the cookie has expired at the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    /// Whether the cookie has expired at `now` (epoch milliseconds).
    ///
    /// Session cookies and cookies without an expiry never expire here.
    pub fn is_expired_at(&self, now: i64) -> bool {
        if self.session_only || self.expiry_time == 0 {
            return false;
        }
        now > self.expiry_time
    }

    /// `true` when the cookie was set through a `Domain=` attribute.
    pub fn is_domain_cookie(&self) -> bool {
        self.domain.starts_with('.')
    }

    /// `name=value` pair as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Human-readable expiry, `"Session"` for cookies without one.
    pub fn expiry_display(&self) -> String {
        if self.session_only || self.expiry_time == 0 {
            return "Session".to_string();
        }
        let nanos = i128::from(self.expiry_time) * 1_000_000;
        match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            Ok(at) => at.to_string(),
            Err(_) => self.expiry_time.to_string(),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Domain={}; Path={}", self.name, self.value, self.domain, self.path)
    }
}

/// Identity of a cookie: `domain:path:name`.
///
/// Callers must normalize `domain` and `path` consistently; two cookies that
/// differ only in a leading dot are different cookies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey(String);

impl CookieKey {
    pub fn new(domain: &str, path: &str, name: &str) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        CookieKey(format!("{domain}:{path}:{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CookieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn normalize_path(path: String) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}
