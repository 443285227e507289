//! Cookie policy decisions.
//!
//! [`CookiePolicy`] holds the per-domain allow/deny overrides and the two
//! global blocking flags. Its methods and the free functions in this module are
//! pure: no I/O, no clock, no locking. The
//! [`CookieManager`](crate::cookies::CookieManager) owns the policy and
//! persists it as a [`PolicyDocument`].
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use crate::config::CookieConfig;
use crate::cookies::Cookie;
use serde::{Deserialize, Serialize};

/// Name fragments of well-known analytics and advertising cookies.
///
/// Matching is a case-insensitive substring test on the cookie name. False
/// positives and negatives are accepted; this is a heuristic.
pub const TRACKING_PATTERNS: &[&str] = &[
    "_ga",
    "_gid",
    "track",
    "analytics",
    "_utm",
    "doubleclick",
    "fbp",
    "_fbp",
    "fbsb",
    "fbcsb",
    "_ym_",
    "yandex_gid",
];

/// Policy state backing the cookie gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Explicit overrides, `domain -> allowed`. Absent means allowed.
    domain_policies: HashMap<String, bool>,
    pub block_third_party: bool,
    pub block_tracking: bool,
    /// Lower-cased patterns added on top of [`TRACKING_PATTERNS`].
    extra_tracking_patterns: Vec<String>,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            domain_policies: HashMap::new(),
            block_third_party: true,
            block_tracking: true,
            extra_tracking_patterns: Vec::new(),
        }
    }
}

impl CookiePolicy {
    /// Policy with flags and extra patterns taken from `config`.
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            domain_policies: HashMap::new(),
            block_third_party: config.block_third_party,
            block_tracking: config.block_tracking,
            extra_tracking_patterns: config
                .extra_tracking_patterns
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Overlays a persisted document onto this policy.
    pub fn apply_document(&mut self, doc: PolicyDocument) {
        if let Some(block) = doc.block_third_party_cookies {
            self.block_third_party = block;
        }
        if let Some(block) = doc.block_tracking_cookies {
            self.block_tracking = block;
        }
        self.domain_policies.extend(doc.domain_policies);
    }

    /// Document form of this policy, for persistence.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            block_third_party_cookies: Some(self.block_third_party),
            block_tracking_cookies: Some(self.block_tracking),
            domain_policies: self
                .domain_policies
                .iter()
                .map(|(d, a)| (d.clone(), *a))
                .collect(),
        }
    }

    pub fn set_domain_policy(&mut self, domain: impl Into<String>, allowed: bool) {
        self.domain_policies.insert(domain.into(), allowed);
    }

    /// Drops an explicit override. Returns the previous value, if any.
    pub fn remove_domain_policy(&mut self, domain: &str) -> Option<bool> {
        self.domain_policies.remove(domain)
    }

    /// Explicit override for `domain`, defaulting to allowed.
    pub fn is_domain_allowed(&self, domain: &str) -> bool {
        self.domain_policies.get(domain).copied().unwrap_or(true)
    }

    /// All explicit overrides, sorted by domain.
    pub fn domain_policies(&self) -> BTreeMap<String, bool> {
        self.domain_policies
            .iter()
            .map(|(d, a)| (d.clone(), *a))
            .collect()
    }

    /// Name-based tracking heuristic, see [`TRACKING_PATTERNS`].
    pub fn is_tracking(&self, cookie: &Cookie) -> bool {
        let name = cookie.name.to_ascii_lowercase();
        is_tracking_name(&name)
            || self
                .extra_tracking_patterns
                .iter()
                .any(|p| name.contains(p.as_str()))
    }

    /// Why `cookie` may not be stored, or `None` when it passes the gate.
    pub fn rejection(&self, cookie: &Cookie) -> Option<Rejection> {
        if !self.is_domain_allowed(&cookie.domain) {
            return Some(Rejection::DomainBlocked);
        }
        if self.block_tracking && self.is_tracking(cookie) {
            return Some(Rejection::Tracking);
        }
        None
    }
}

/// Reason a cookie was dropped by the policy gate.
///
/// Third-party blocking depends on the requesting document, which the gate
/// never sees; the interceptor enforces it before cookies reach the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DomainBlocked,
    Tracking,
}

/// On-disk representation of the cookie policy.
///
/// Flags are optional so that a partial document falls back to the configured
/// defaults instead of failing to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_third_party_cookies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_tracking_cookies: Option<bool>,
    #[serde(default)]
    pub domain_policies: BTreeMap<String, bool>,
}

/// Tests a lower-cased cookie name against [`TRACKING_PATTERNS`].
pub fn is_tracking_name(lower_name: &str) -> bool {
    TRACKING_PATTERNS.iter().any(|p| lower_name.contains(p))
}

/// RFC 6265 §5.1.4 path matching.
///
/// Empty paths are treated as `"/"`.
pub fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    let request_path = if request_path.is_empty() { "/" } else { request_path };
    let cookie_path = if cookie_path.is_empty() { "/" } else { cookie_path };

    if request_path == cookie_path {
        return true;
    }

    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        return cookie_path.ends_with('/') || rest.starts_with('/');
    }

    false
}

/// Site of a host: its last two labels, or the host itself for IP literals
/// and single-label hosts.
///
/// This approximates a registrable domain without a public-suffix list, so
/// all hosts under a multi-label suffix such as `co.uk` share one site.
pub fn site_of(host: &str) -> String {
    let host = host.trim_start_matches('.').trim_end_matches('.').to_ascii_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }
    labels[labels.len() - 2..].join(".")
}

/// Whether a request to `request_host` is third-party relative to the
/// top-level document on `site_for_cookies_host`.
pub fn is_third_party(request_host: &str, site_for_cookies_host: &str) -> bool {
    site_of(request_host) != site_of(site_for_cookies_host)
}
