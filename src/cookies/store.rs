//! Cookie store infrastructure.
//!
//! A **cookie store** is the persistence layer behind a
//! [`CookieManager`](crate::cookies::CookieManager). It loads the two documents
//! once when the manager is created and rewrites them after each mutation:
//!
//! - the **cookies document**, a JSON array of [`Cookie`] records in jar order;
//! - the **policy document**, see [`PolicyDocument`].
//!
//! This module exports two reference implementations:
//! - [`JsonCookieStore`]: file-backed JSON documents in a configuration directory.
//! - [`InMemoryCookieStore`]: keeps the last saved documents in memory (private
//!   sessions, tests).
//!
//! ## Design notes
//! - Stores receive full snapshots. They never see the live jar and hold no
//!   reference back to the manager.
//! - Implementations must be `Send + Sync`; the manager calls them from
//!   whichever thread performed the mutation, one write at a time.
//! - A missing document is not an error: `load_*` returns an empty result.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_cookies::cookies::{CookieManager, JsonCookieStore};
//! use gosub_cookies::config::CookieConfig;
//!
//! let config = CookieConfig::with_dir("/home/user/.config/gosub");
//! let store = Arc::new(JsonCookieStore::from_config(&config));
//! let manager = CookieManager::with_store(&config, store);
//! println!("{} cookies loaded", manager.len());
//! ```
mod in_memory;
mod json;

use std::sync::Arc;

use crate::cookies::policy::PolicyDocument;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// In-memory cookie store.
pub use in_memory::InMemoryCookieStore;
/// File-backed JSON cookie store.
pub use json::JsonCookieStore;

/// A handle to a cookie store trait.
pub type CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>;

/// Durable storage for the cookies and policy documents.
pub trait CookieStore: Send + Sync {
    /// Reads all persisted cookies in their stored order.
    fn load_cookies(&self) -> Result<Vec<Cookie>, CookieError>;

    /// Replaces the persisted cookies with `cookies`.
    fn save_cookies(&self, cookies: &[Cookie]) -> Result<(), CookieError>;

    /// Reads the persisted policy, `None` when none was ever written.
    fn load_policy(&self) -> Result<Option<PolicyDocument>, CookieError>;

    /// Replaces the persisted policy.
    fn save_policy(&self, policy: &PolicyDocument) -> Result<(), CookieError>;
}
