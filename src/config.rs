//! Cookie subsystem configuration.
//!
//! `CookieConfig` tells a [`CookieManager`](crate::cookies::CookieManager) where
//! its two persisted documents live and which policy defaults apply when no
//! policy document has been written yet.
//!
//! The configuration directory itself is provided by the embedding browser;
//! this crate never decides on its own where user data goes.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_cookies::config::CookieConfig;
//! let cfg = CookieConfig::default();
//! assert!(cfg.block_tracking);
//! assert_eq!(cfg.cookies_file, "cookies.json");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use gosub_cookies::config::CookieConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CookieConfig::builder()
//!     .config_dir("/tmp/gosub-profile")
//!     .block_third_party(false)
//!     .tracking_pattern("_hj")
//!     .build()?; // returns Result<CookieConfig, CookieConfigError>
//! assert_eq!(cfg.cookies_path(), std::path::Path::new("/tmp/gosub-profile/cookies.json"));
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `config_dir`: Directory holding both documents (default: current directory).
//! - `cookies_file`: File name of the cookies document (default: `cookies.json`).
//! - `policy_file`: File name of the policy document (default: `cookie_policy.json`).
//! - `block_third_party`: Initial third-party blocking flag (default: `true`).
//! - `block_tracking`: Initial tracking-cookie blocking flag (default: `true`).
//! - `extra_tracking_patterns`: Name fragments added to the built-in tracking denylist.
//!
//! # Errors
//!
//! Builder validation returns [`CookieConfigError`] for empty or path-like file
//! names, identical file names, or empty tracking patterns.

use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_COOKIES_FILE: &str = "cookies.json";
const DEFAULT_POLICY_FILE: &str = "cookie_policy.json";

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub config_dir: PathBuf,
    pub cookies_file: String,
    pub policy_file: String,
    pub block_third_party: bool,
    pub block_tracking: bool,
    pub extra_tracking_patterns: Vec<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            cookies_file: DEFAULT_COOKIES_FILE.to_string(),
            policy_file: DEFAULT_POLICY_FILE.to_string(),
            block_third_party: true,
            block_tracking: true,
            extra_tracking_patterns: Vec::new(),
        }
    }
}

impl CookieConfig {
    pub fn builder() -> CookieConfigBuilder {
        CookieConfigBuilder::default()
    }

    /// Default configuration rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the cookies document.
    pub fn cookies_path(&self) -> PathBuf {
        self.config_dir.join(&self.cookies_file)
    }

    /// Full path of the policy document.
    pub fn policy_path(&self) -> PathBuf {
        self.config_dir.join(&self.policy_file)
    }

    pub fn validate(&self) -> Result<(), CookieConfigError> {
        validate(self)
    }
}

/// Builder for [`CookieConfig`].
#[derive(Debug, Clone, Default)]
pub struct CookieConfigBuilder {
    inner: CookieConfig,
}

impl CookieConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut CookieConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn config_dir<P: AsRef<Path>>(self, dir: P) -> Self { self.map(|c| c.config_dir = dir.as_ref().to_path_buf()) }
    pub fn cookies_file<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.cookies_file = name.into()) }
    pub fn policy_file<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.policy_file = name.into()) }
    pub fn block_third_party(self, on: bool) -> Self { self.map(|c| c.block_third_party = on) }
    pub fn block_tracking(self, on: bool) -> Self { self.map(|c| c.block_tracking = on) }
    pub fn tracking_pattern<S: Into<String>>(self, pattern: S) -> Self { self.map(|c| c.extra_tracking_patterns.push(pattern.into())) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut CookieConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<CookieConfig, CookieConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieConfigError {
    EmptyFileName,
    NotAFileName(String),
    SameFileName(String),
    EmptyTrackingPattern,
}

impl fmt::Display for CookieConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieConfigError::EmptyFileName =>
                write!(f, "cookie and policy file names must not be empty"),
            CookieConfigError::NotAFileName(name) =>
                write!(f, "{name:?} is a path, expected a plain file name"),
            CookieConfigError::SameFileName(name) =>
                write!(f, "cookies and policy documents both use {name:?}"),
            CookieConfigError::EmptyTrackingPattern =>
                write!(f, "tracking patterns must not be empty"),
        }
    }
}
impl std::error::Error for CookieConfigError {}

fn validate(c: &CookieConfig) -> Result<(), CookieConfigError> {
    for name in [&c.cookies_file, &c.policy_file] {
        if name.trim().is_empty() {
            return Err(CookieConfigError::EmptyFileName);
        }
        if name.contains('/') || name.contains('\\') {
            return Err(CookieConfigError::NotAFileName(name.clone()));
        }
    }
    if c.cookies_file == c.policy_file {
        return Err(CookieConfigError::SameFileName(c.cookies_file.clone()));
    }
    if c.extra_tracking_patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(CookieConfigError::EmptyTrackingPattern);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CookieConfig::default().validate().is_ok());
    }

    #[test]
    fn paths_are_joined_onto_config_dir() {
        let cfg = CookieConfig::with_dir("/profiles/default");
        assert_eq!(cfg.cookies_path(), PathBuf::from("/profiles/default/cookies.json"));
        assert_eq!(cfg.policy_path(), PathBuf::from("/profiles/default/cookie_policy.json"));
    }

    #[test]
    fn builder_rejects_bad_file_names() {
        let err = CookieConfig::builder().cookies_file("").build().unwrap_err();
        assert_eq!(err, CookieConfigError::EmptyFileName);

        let err = CookieConfig::builder().policy_file("a/b.json").build().unwrap_err();
        assert_eq!(err, CookieConfigError::NotAFileName("a/b.json".into()));

        let err = CookieConfig::builder()
            .cookies_file("state.json")
            .policy_file("state.json")
            .build()
            .unwrap_err();
        assert_eq!(err, CookieConfigError::SameFileName("state.json".into()));
    }

    #[test]
    fn builder_collects_tracking_patterns() {
        let cfg = CookieConfig::builder()
            .tracking_pattern("_hj")
            .tracking_pattern("mixpanel")
            .block_tracking(false)
            .build()
            .unwrap();
        assert_eq!(cfg.extra_tracking_patterns, vec!["_hj", "mixpanel"]);
        assert!(!cfg.block_tracking);

        let err = CookieConfig::builder().tracking_pattern("  ").build().unwrap_err();
        assert_eq!(err, CookieConfigError::EmptyTrackingPattern);
    }
}
