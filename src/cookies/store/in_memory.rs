use parking_lot::Mutex;

use crate::cookies::policy::PolicyDocument;
use crate::cookies::store::CookieStore;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// Cookie store without durable storage.
///
/// Remembers the last saved documents so that a manager re-created on the same
/// store sees them again, which is what private windows and tests need.
#[derive(Debug, Default)]
pub struct InMemoryCookieStore {
    cookies: Mutex<Vec<Cookie>>,
    policy: Mutex<Option<PolicyDocument>>,
    saves: Mutex<usize>,
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `cookies`, as if they had been saved before.
    pub fn with_cookies(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies: Mutex::new(cookies),
            ..Self::default()
        }
    }

    /// The last saved cookies document.
    pub fn saved_cookies(&self) -> Vec<Cookie> {
        self.cookies.lock().clone()
    }

    /// The last saved policy document.
    pub fn saved_policy(&self) -> Option<PolicyDocument> {
        self.policy.lock().clone()
    }

    /// Number of successful `save_*` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl CookieStore for InMemoryCookieStore {
    fn load_cookies(&self) -> Result<Vec<Cookie>, CookieError> {
        Ok(self.cookies.lock().clone())
    }

    fn save_cookies(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        *self.cookies.lock() = cookies.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }

    fn load_policy(&self) -> Result<Option<PolicyDocument>, CookieError> {
        Ok(self.policy.lock().clone())
    }

    fn save_policy(&self, policy: &PolicyDocument) -> Result<(), CookieError> {
        *self.policy.lock() = Some(policy.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}
