//! In-memory cookie jar.
//!
//! A **cookie jar** is the ordered arena holding every cookie of a browser
//! session, keyed by [`CookieKey`]. It performs no I/O and no locking; the
//! [`CookieManager`](crate::cookies::CookieManager) wraps it in a lock and
//! persists it after each mutation.
//!
//! ## Ordering
//! Records keep their insertion order. Updating an existing key keeps its
//! position, so exports and `Cookie` headers are deterministic.
//!
//! ## Generations
//! Every mutation bumps [`CookieJar::generation`]. The manager tags snapshots
//! with it so that a slow writer can never overwrite a newer file on disk.
//!
//! See also: RFC 6265 §5.1.3 (domain matching).
use std::collections::{BTreeSet, HashMap};

use crate::cookies::cookies::{normalize_path, Cookie, CookieKey};
use serde::Serialize;

/// Outcome of [`CookieJar::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Counters shown by cookie management UIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieStatistics {
    pub total: usize,
    pub session: usize,
    pub persistent: usize,
    pub secure: usize,
    pub http_only: usize,
    pub unique_domains: usize,
}

/// Ordered collection of cookies with O(1) lookup by identity key.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    /// Records in insertion order.
    entries: Vec<Cookie>,
    /// Key -> position in `entries`.
    index: HashMap<CookieKey, usize>,
    generation: u64,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a jar from persisted records, keeping their order.
    ///
    /// Later duplicates of a key replace earlier ones wholesale, since a
    /// document is trusted to describe the exact stored state.
    pub fn from_cookies(cookies: impl IntoIterator<Item = Cookie>) -> Self {
        let mut jar = CookieJar::new();
        for mut cookie in cookies {
            cookie.path = normalize_path(cookie.path);
            let key = cookie.key();
            match jar.index.get(&key) {
                Some(&pos) => jar.entries[pos] = cookie,
                None => {
                    jar.index.insert(key, jar.entries.len());
                    jar.entries.push(cookie);
                }
            }
        }
        jar
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutation counter, increases on every change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Inserts `cookie` or updates the record with the same key.
    ///
    /// An update only touches `value`, `expiry_time` and `last_accessed_time`
    /// (set to `now`); every other attribute of the stored record stays.
    pub fn upsert(&mut self, mut cookie: Cookie, now: i64) -> Upsert {
        cookie.path = normalize_path(cookie.path);
        let key = cookie.key();
        self.generation += 1;

        if let Some(&pos) = self.index.get(&key) {
            let existing = &mut self.entries[pos];
            existing.value = cookie.value;
            existing.expiry_time = cookie.expiry_time;
            existing.last_accessed_time = now;
            return Upsert::Updated;
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(cookie);
        Upsert::Inserted
    }

    pub fn get(&self, key: &CookieKey) -> Option<&Cookie> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, key: &CookieKey) -> bool {
        self.index.contains_key(key)
    }

    /// Removes the record stored under `key`.
    pub fn remove(&mut self, key: &CookieKey) -> Option<Cookie> {
        let pos = self.index.remove(key)?;
        let removed = self.entries.remove(pos);
        self.reindex_from(pos);
        self.generation += 1;
        Some(removed)
    }

    /// Keeps only the records for which `keep` returns `true`.
    ///
    /// Returns the number of removed records. The generation only moves when
    /// something was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Cookie) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|c| keep(c));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.reindex_from(0);
            self.generation += 1;
        }
        removed
    }

    /// Removes all records, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.index.clear();
        self.generation += 1;
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries.iter()
    }

    /// Clones all records in insertion order.
    pub fn snapshot(&self) -> Vec<Cookie> {
        self.entries.clone()
    }

    /// Non-expired records visible to `domain` (see [`domain_matches`]).
    pub fn matching_domain(&self, domain: &str, now: i64) -> Vec<Cookie> {
        self.entries
            .iter()
            .filter(|c| domain_matches(&c.domain, domain))
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// All non-expired records.
    pub fn valid(&self, now: i64) -> Vec<Cookie> {
        self.entries
            .iter()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Sorted, de-duplicated list of stored domains.
    pub fn domains(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|c| c.domain.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn statistics(&self) -> CookieStatistics {
        let mut stats = CookieStatistics {
            total: self.entries.len(),
            unique_domains: self.domains().len(),
            ..CookieStatistics::default()
        };
        for c in &self.entries {
            if c.session_only {
                stats.session += 1;
            } else {
                stats.persistent += 1;
            }
            if c.secure {
                stats.secure += 1;
            }
            if c.http_only {
                stats.http_only += 1;
            }
        }
        stats
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, cookie) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(cookie.key(), pos);
        }
    }
}

/// Checks whether a cookie stored for `cookie_domain` is visible to `domain`.
///
/// - Domain cookies (leading `.`) match their bare domain and any subdomain of it.
/// - Host-only cookies match their exact host only, never subdomains.
///
/// Comparison is ASCII case-insensitive.
pub fn domain_matches(cookie_domain: &str, domain: &str) -> bool {
    if cookie_domain.eq_ignore_ascii_case(domain) {
        return true;
    }

    let Some(bare) = cookie_domain.strip_prefix('.') else {
        return false;
    };
    if bare.is_empty() {
        return false;
    }
    if domain.eq_ignore_ascii_case(bare) {
        return true;
    }

    // Subdomain: `domain` must end with ".{bare}"
    if domain.len() <= bare.len() {
        return false;
    }
    let dot = domain.len() - bare.len() - 1;
    domain.as_bytes()[dot] == b'.' && domain[dot + 1..].eq_ignore_ascii_case(bare)
}
