//! Cookies: [`Cookie`] records, the [`CookieJar`], the [`CookieManager`] on top
//! of a [`CookieStore`] backend, and the [`CookieInterceptor`] for HTTP traffic.

mod cookies;
mod cookie_jar;
mod interceptor;
mod manager;
mod parser;
mod policy;
mod store;

pub use cookies::now_millis;
pub use cookies::Cookie;
pub use cookies::CookieKey;
pub use cookies::CookieManagerHandle;
pub use cookies::SameSite;

pub use cookie_jar::domain_matches;
pub use cookie_jar::CookieJar;
pub use cookie_jar::CookieStatistics;
pub use cookie_jar::Upsert;

pub use parser::{parse_http_date, parse_set_cookie, parse_set_cookie_at};

pub use policy::{is_third_party, is_tracking_name, path_matches, site_of};
pub use policy::{CookiePolicy, PolicyDocument, Rejection, TRACKING_PATTERNS};

pub use store::CookieStore;
pub use store::CookieStoreHandle;
pub use store::InMemoryCookieStore;
pub use store::JsonCookieStore;

pub use manager::CookieManager;

pub use interceptor::CookieInterceptor;
