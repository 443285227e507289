//! JSON-backed cookie store.
//!
//! `JsonCookieStore` keeps the cookies document and the policy document as two
//! pretty-printed JSON files, normally `cookies.json` and `cookie_policy.json`
//! inside the browser's configuration directory.
//!
//! ### I/O characteristics
//! - Every save rewrites the whole document. Cookie jars are small and writes
//!   are rare compared to reads.
//! - Writes are atomic: the document is written to a temporary file in the
//!   same directory and then renamed over the target, so a crash mid-write
//!   leaves the previous document intact.
//! - The directory is created on first save.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::CookieConfig;
use crate::cookies::policy::PolicyDocument;
use crate::cookies::store::CookieStore;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// A JSON-based cookie store that persists cookies across sessions.
#[derive(Debug, Clone)]
pub struct JsonCookieStore {
    /// Path to the cookies document.
    cookies_path: PathBuf,
    /// Path to the policy document.
    policy_path: PathBuf,
}

impl JsonCookieStore {
    pub fn new(cookies_path: impl Into<PathBuf>, policy_path: impl Into<PathBuf>) -> Self {
        Self {
            cookies_path: cookies_path.into(),
            policy_path: policy_path.into(),
        }
    }

    /// Store using the document paths of `config`.
    pub fn from_config(config: &CookieConfig) -> Self {
        Self::new(config.cookies_path(), config.policy_path())
    }

    pub fn cookies_path(&self) -> &Path {
        &self.cookies_path
    }

    pub fn policy_path(&self) -> &Path {
        &self.policy_path
    }
}

/// Reads and deserializes `path`, `None` if the file does not exist.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CookieError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CookieError::io(path, e)),
    };

    Ok(Some(serde_json::from_str(&contents)?))
}

/// Serializes `value` and atomically replaces `path` with it.
fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CookieError> {
    let contents = serde_json::to_vec_pretty(value)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| CookieError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CookieError::io(dir, e))?;
    tmp.write_all(&contents).map_err(|e| CookieError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| CookieError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| CookieError::io(path, e.error))?;
    Ok(())
}

impl CookieStore for JsonCookieStore {
    fn load_cookies(&self) -> Result<Vec<Cookie>, CookieError> {
        match read_document::<Vec<serde_json::Value>>(&self.cookies_path)? {
            Some(records) => {
                // One unreadable record must not cost the rest of the jar
                let cookies: Vec<Cookie> = records
                    .into_iter()
                    .enumerate()
                    .filter_map(|(idx, record)| match serde_json::from_value(record) {
                        Ok(cookie) => Some(cookie),
                        Err(e) => {
                            warn!("Skipping unreadable cookie record {idx} in {}: {e}", self.cookies_path.display());
                            None
                        }
                    })
                    .collect();
                info!("Loaded {} cookies from {}", cookies.len(), self.cookies_path.display());
                Ok(cookies)
            }
            None => {
                debug!("Cookies file {} not found, starting with empty cookie store", self.cookies_path.display());
                Ok(Vec::new())
            }
        }
    }

    fn save_cookies(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        write_document(&self.cookies_path, cookies)?;
        info!("Saved {} cookies to {}", cookies.len(), self.cookies_path.display());
        Ok(())
    }

    fn load_policy(&self) -> Result<Option<PolicyDocument>, CookieError> {
        read_document(&self.policy_path)
    }

    fn save_policy(&self, policy: &PolicyDocument) -> Result<(), CookieError> {
        write_document(&self.policy_path, policy)?;
        debug!("Saved cookie policy to {}", self.policy_path.display());
        Ok(())
    }
}
