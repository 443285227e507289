//! Cookie manager.
//!
//! [`CookieManager`] is the shared entry point of the cookie subsystem. It owns
//! the [`CookieJar`] and the [`CookiePolicy`] behind a single lock and writes
//! both back to its [`CookieStore`](crate::cookies::CookieStore) after every
//! mutation.
//!
//! # Locking
//! All state lives in one `RwLock`. Mutations take it exclusively, reads take it
//! shared, so a reader never sees a half-applied change.
//!
//! The lock is never held during store I/O. A mutation clones the records it
//! wants persisted together with the jar generation, releases the lock and
//! then hands the snapshot to the writer. The writer side has its own mutex and
//! remembers the last generation written, so when two threads race a slower,
//! older snapshot is dropped instead of overwriting a newer document.
//!
//! # Failures
//! Persistence errors are logged and swallowed. The in-memory state stays
//! authoritative and the next successful write catches the store up.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, error, info};
use parking_lot::{Mutex, RwLock};

use crate::config::CookieConfig;
use crate::cookies::cookie_jar::{CookieJar, CookieStatistics, Upsert};
use crate::cookies::cookies::{now_millis, Cookie, CookieKey};
use crate::cookies::policy::{CookiePolicy, PolicyDocument, Rejection};
use crate::cookies::store::{CookieStoreHandle, InMemoryCookieStore, JsonCookieStore};
use crate::errors::CookieError;

struct State {
    jar: CookieJar,
    policy: CookiePolicy,
    /// Bumped on every policy change, same role as the jar generation.
    policy_generation: u64,
}

/// Data cloned under the state lock, tagged with the generation it reflects.
struct Snapshot<T> {
    generation: u64,
    data: T,
}

/// Thread-safe cookie storage with policy enforcement and persistence.
pub struct CookieManager {
    state: RwLock<State>,
    store: CookieStoreHandle,
    /// Generation of the last cookies document handed to the store.
    cookies_written: Mutex<u64>,
    /// Generation of the last policy document handed to the store.
    policy_written: Mutex<u64>,
}

impl fmt::Debug for CookieManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("CookieManager")
            .field("cookies", &state.jar.len())
            .field("policy", &state.policy)
            .finish()
    }
}

impl CookieManager {
    /// Opens the JSON documents described by `config`.
    ///
    /// Missing documents are not an error; the manager starts empty with the
    /// configured policy defaults.
    pub fn open(config: &CookieConfig) -> Result<Self, CookieError> {
        config.validate()?;
        let store = Arc::new(JsonCookieStore::from_config(config));
        Ok(Self::with_store(config, store))
    }

    /// Manager without durable storage.
    pub fn in_memory(config: &CookieConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryCookieStore::new()))
    }

    /// Builds a manager on top of `store`, loading both documents once.
    ///
    /// A document that fails to load is logged and treated as empty. Loaded
    /// records are trusted as-is and do not pass through the policy gate.
    pub fn with_store(config: &CookieConfig, store: CookieStoreHandle) -> Self {
        let mut policy = CookiePolicy::from_config(config);
        match store.load_policy() {
            Ok(Some(doc)) => policy.apply_document(doc),
            Ok(None) => {}
            Err(e) => debug!("Failed to load cookie policy: {e}"),
        }

        let jar = match store.load_cookies() {
            Ok(cookies) => CookieJar::from_cookies(cookies),
            Err(e) => {
                error!("Failed to load cookies: {e}");
                CookieJar::new()
            }
        };

        let cookies_generation = jar.generation();
        Self {
            state: RwLock::new(State {
                jar,
                policy,
                policy_generation: 0,
            }),
            store,
            cookies_written: Mutex::new(cookies_generation),
            policy_written: Mutex::new(0),
        }
    }

    // ---------- Cookies ----------

    /// Stores `cookie` unless the policy rejects it, then persists.
    ///
    /// Returns `false` when the cookie was dropped by the policy gate. A dropped
    /// update leaves an existing record with the same key untouched.
    pub fn set(&self, cookie: Cookie) -> bool {
        let snapshot = {
            let mut state = self.state.write();
            if !Self::apply(&mut state, cookie, now_millis()) {
                return false;
            }
            Self::cookies_snapshot(&state)
        };
        self.write_cookies(snapshot);
        true
    }

    /// Runs the policy gate and upserts. Caller holds the write lock.
    fn apply(state: &mut State, cookie: Cookie, now: i64) -> bool {
        if cookie.name.trim().is_empty() {
            debug!("Cookie without name dropped for domain: {}", cookie.domain);
            return false;
        }
        if let Some(reason) = state.policy.rejection(&cookie) {
            match reason {
                Rejection::DomainBlocked => debug!("Cookie blocked for domain: {}", cookie.domain),
                Rejection::Tracking => debug!("Tracking cookie blocked: {}", cookie.name),
            }
            return false;
        }

        let key = cookie.key();
        match state.jar.upsert(cookie, now) {
            Upsert::Inserted => debug!("Cookie stored: {key}"),
            Upsert::Updated => debug!("Cookie updated: {key}"),
        }
        true
    }

    /// Looks up a single cookie.
    ///
    /// An expired record is deleted (and the deletion persisted) and reported
    /// as absent.
    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<Cookie> {
        let key = CookieKey::new(domain, path, name);
        let now = now_millis();

        {
            let state = self.state.read();
            let cookie = state.jar.get(&key)?;
            if !cookie.is_expired_at(now) {
                return Some(cookie.clone());
            }
        }

        let snapshot = {
            let mut state = self.state.write();
            // Re-check: another thread may have refreshed or removed it meanwhile
            match state.jar.get(&key) {
                Some(cookie) if !cookie.is_expired_at(now) => return Some(cookie.clone()),
                Some(_) => {}
                None => return None,
            }
            state.jar.remove(&key);
            debug!("Expired cookie removed: {key}");
            Self::cookies_snapshot(&state)
        };
        self.write_cookies(snapshot);
        None
    }

    /// Non-expired cookies visible to `domain`, in insertion order.
    ///
    /// Domain cookies match their bare domain and its subdomains, host-only
    /// cookies match their exact host. Path and scheme are not checked here.
    pub fn get_for_domain(&self, domain: &str) -> Vec<Cookie> {
        self.state.read().jar.matching_domain(domain, now_millis())
    }

    /// All non-expired cookies.
    pub fn get_all_valid(&self) -> Vec<Cookie> {
        self.state.read().jar.valid(now_millis())
    }

    /// All stored cookies, expired ones included.
    pub fn get_all(&self) -> Vec<Cookie> {
        self.state.read().jar.snapshot()
    }

    /// Deletes the cookie with the given identity. Returns the number removed.
    ///
    /// When nothing matched the jar is unchanged and the store is not
    /// rewritten.
    pub fn delete(&self, domain: &str, path: &str, name: &str) -> usize {
        let key = CookieKey::new(domain, path, name);
        let (removed, snapshot) = {
            let mut state = self.state.write();
            let removed = usize::from(state.jar.remove(&key).is_some());
            (removed, Self::cookies_snapshot(&state))
        };
        self.write_cookies(snapshot);
        removed
    }

    /// Deletes every cookie whose stored domain is exactly `domain`.
    ///
    /// Like [`delete`](Self::delete), persists only when something was removed.
    pub fn delete_for_domain(&self, domain: &str) -> usize {
        self.delete_where(|c| c.domain == domain)
    }

    pub fn delete_all(&self) -> usize {
        let (removed, snapshot) = {
            let mut state = self.state.write();
            let removed = state.jar.clear();
            (removed, Self::cookies_snapshot(&state))
        };
        self.write_cookies(snapshot);
        info!("Deleted all {removed} cookies");
        removed
    }

    /// Deletes all session cookies, as on browser shutdown.
    pub fn delete_session_only(&self) -> usize {
        self.delete_where(|c| c.session_only)
    }

    /// Deletes expired cookies. Persists only when something was removed.
    pub fn delete_expired(&self) -> usize {
        let now = now_millis();
        let (removed, snapshot) = {
            let mut state = self.state.write();
            let removed = state.jar.retain(|c| !c.is_expired_at(now));
            (removed, Self::cookies_snapshot(&state))
        };
        if removed > 0 {
            info!("Deleted {removed} expired cookies");
            self.write_cookies(snapshot);
        }
        removed
    }

    fn delete_where(&self, mut doomed: impl FnMut(&Cookie) -> bool) -> usize {
        let (removed, snapshot) = {
            let mut state = self.state.write();
            let removed = state.jar.retain(|c| !doomed(c));
            (removed, Self::cookies_snapshot(&state))
        };
        self.write_cookies(snapshot);
        removed
    }

    // ---------- Policy ----------

    /// Sets an explicit allow/deny override for `domain` and persists it.
    pub fn set_domain_policy(&self, domain: &str, allowed: bool) {
        self.update_policy(|policy| {
            policy.set_domain_policy(domain, allowed);
            true
        });
    }

    /// Drops the override for `domain`. Returns the previous value, if any.
    pub fn remove_domain_policy(&self, domain: &str) -> Option<bool> {
        let mut previous = None;
        self.update_policy(|policy| {
            previous = policy.remove_domain_policy(domain);
            previous.is_some()
        });
        previous
    }

    pub fn is_domain_allowed(&self, domain: &str) -> bool {
        self.state.read().policy.is_domain_allowed(domain)
    }

    /// All explicit overrides, sorted by domain.
    pub fn domain_policies(&self) -> BTreeMap<String, bool> {
        self.state.read().policy.domain_policies()
    }

    pub fn set_block_third_party_cookies(&self, block: bool) {
        self.update_policy(|policy| {
            let changed = policy.block_third_party != block;
            policy.block_third_party = block;
            changed
        });
    }

    pub fn is_block_third_party_cookies(&self) -> bool {
        self.state.read().policy.block_third_party
    }

    pub fn set_block_tracking_cookies(&self, block: bool) {
        self.update_policy(|policy| {
            let changed = policy.block_tracking != block;
            policy.block_tracking = block;
            changed
        });
    }

    pub fn is_block_tracking_cookies(&self) -> bool {
        self.state.read().policy.block_tracking
    }

    /// Copy of the current policy.
    pub fn policy(&self) -> CookiePolicy {
        self.state.read().policy.clone()
    }

    /// Applies `change` under the lock; persists when it reports a change.
    fn update_policy(&self, change: impl FnOnce(&mut CookiePolicy) -> bool) {
        let snapshot = {
            let mut state = self.state.write();
            if !change(&mut state.policy) {
                return;
            }
            state.policy_generation += 1;
            Snapshot {
                generation: state.policy_generation,
                data: state.policy.to_document(),
            }
        };
        self.write_policy(snapshot);
    }

    // ---------- Import / export ----------

    /// Pretty-printed JSON array of all stored cookies, in insertion order.
    pub fn export_json(&self) -> Result<String, CookieError> {
        let cookies = self.state.read().jar.snapshot();
        Ok(serde_json::to_string_pretty(&cookies)?)
    }

    /// Imports a JSON array of cookies through the policy gate.
    ///
    /// Returns the number of records in the document, including the ones the
    /// policy dropped. A malformed record aborts the import with
    /// [`CookieError::Import`]; records before it stay applied.
    pub fn import_json(&self, json: &str) -> Result<usize, CookieError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let count = records.len();
        let now = now_millis();

        let mut failure = None;
        let snapshot = {
            let mut state = self.state.write();
            let before = state.jar.generation();
            for (idx, record) in records.into_iter().enumerate() {
                match serde_json::from_value::<Cookie>(record) {
                    Ok(cookie) => {
                        Self::apply(&mut state, cookie, now);
                    }
                    Err(e) => {
                        failure = Some(CookieError::Import(format!("record {idx}: {e}")));
                        break;
                    }
                }
            }
            (state.jar.generation() != before).then(|| Self::cookies_snapshot(&state))
        };

        if let Some(snapshot) = snapshot {
            self.write_cookies(snapshot);
        }
        match failure {
            Some(e) => Err(e),
            None => {
                info!("Imported {count} cookies");
                Ok(count)
            }
        }
    }

    // ---------- Inspection ----------

    pub fn statistics(&self) -> CookieStatistics {
        self.state.read().jar.statistics()
    }

    /// Sorted, de-duplicated list of stored domains.
    pub fn domains(&self) -> Vec<String> {
        self.state.read().jar.domains()
    }

    pub fn len(&self) -> usize {
        self.state.read().jar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().jar.is_empty()
    }

    // ---------- Persistence ----------

    fn cookies_snapshot(state: &State) -> Snapshot<Vec<Cookie>> {
        Snapshot {
            generation: state.jar.generation(),
            data: state.jar.snapshot(),
        }
    }

    fn write_cookies(&self, snapshot: Snapshot<Vec<Cookie>>) {
        let mut written = self.cookies_written.lock();
        if snapshot.generation <= *written {
            debug!("Skipping cookies snapshot {} (already at {})", snapshot.generation, *written);
            return;
        }
        match self.store.save_cookies(&snapshot.data) {
            Ok(()) => *written = snapshot.generation,
            Err(e) => error!("Failed to save cookies: {e}"),
        }
    }

    fn write_policy(&self, snapshot: Snapshot<PolicyDocument>) {
        let mut written = self.policy_written.lock();
        if snapshot.generation <= *written {
            debug!("Skipping policy snapshot {} (already at {})", snapshot.generation, *written);
            return;
        }
        match self.store.save_policy(&snapshot.data) {
            Ok(()) => *written = snapshot.generation,
            Err(e) => error!("Failed to save cookie policy: {e}"),
        }
    }
}
