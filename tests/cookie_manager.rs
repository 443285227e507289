use std::fs;
use std::sync::Arc;
use std::thread;

use gosub_cookies::config::CookieConfig;
use gosub_cookies::cookies::{Cookie, CookieInterceptor, CookieManager, JsonCookieStore};
use gosub_cookies::errors::CookieError;
use tempfile::tempdir;
use url::Url;

fn persistent(name: &str, domain: &str, expiry_time: i64) -> Cookie {
    let mut c = Cookie::new(name, "v", domain, "/");
    c.session_only = false;
    c.expiry_time = expiry_time;
    c
}

#[test]
fn cookies_survive_reopen() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());

    {
        let manager = CookieManager::open(&config).unwrap();
        manager.set(Cookie::new("sid", "abc", "example.com", "/"));
        manager.set(persistent("remember", ".example.com", i64::MAX));
    }
    assert!(config.cookies_path().exists());

    let manager = CookieManager::open(&config).unwrap();
    let names: Vec<_> = manager.get_all().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["sid", "remember"]);
    assert_eq!(manager.get("example.com", "/", "sid").unwrap().value, "abc");
}

#[test]
fn policy_document_overrides_config_defaults() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());

    {
        let manager = CookieManager::open(&config).unwrap();
        manager.set_block_tracking_cookies(false);
        manager.set_domain_policy("ads.test", false);
    }

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.policy_path()).unwrap()).unwrap();
    assert_eq!(raw["blockTrackingCookies"], false);
    assert_eq!(raw["blockThirdPartyCookies"], true);
    assert_eq!(raw["domainPolicies"]["ads.test"], false);

    let manager = CookieManager::open(&config).unwrap();
    assert!(!manager.is_block_tracking_cookies());
    assert!(!manager.is_domain_allowed("ads.test"));
    assert!(manager.set(Cookie::new("_ga", "1", "a.com", "/")));
}

#[test]
fn corrupt_cookies_file_starts_empty() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());
    fs::write(config.cookies_path(), "[{ broken").unwrap();

    let manager = CookieManager::open(&config).unwrap();
    assert!(manager.is_empty());

    manager.set(Cookie::new("a", "1", "a.com", "/"));
    let reloaded = CookieManager::open(&config).unwrap();
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn open_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let config = CookieConfig {
        cookies_file: "nested/cookies.json".into(),
        ..CookieConfig::with_dir(dir.path())
    };

    assert!(matches!(CookieManager::open(&config), Err(CookieError::Config(_))));
}

#[test]
fn legacy_documents_without_optional_fields_load() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());
    fs::write(
        config.cookies_path(),
        r#"[{"name":"a","value":"1","domain":"a.com","path":"/","secure":false,
             "httpOnly":true,"sessionOnly":true,"expiryTime":0}]"#,
    )
    .unwrap();

    let manager = CookieManager::open(&config).unwrap();
    let cookie = manager.get("a.com", "/", "a").unwrap();
    assert!(cookie.http_only);
    assert!(cookie.created_time > 0);
}

#[test]
fn export_from_one_profile_import_into_another() {
    let source_dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();

    let source = CookieManager::open(&CookieConfig::with_dir(source_dir.path())).unwrap();
    source.set(Cookie::new("a", "1", "a.com", "/"));
    source.set(persistent("b", ".b.com", i64::MAX));
    let json = source.export_json().unwrap();

    let target_config = CookieConfig::with_dir(target_dir.path());
    let target = CookieManager::open(&target_config).unwrap();
    assert_eq!(target.import_json(&json).unwrap(), 2);
    assert_eq!(target.get_all(), source.get_all());

    let store = JsonCookieStore::from_config(&target_config);
    let on_disk: Vec<Cookie> = serde_json::from_str(&fs::read_to_string(store.cookies_path()).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 2);
}

#[test]
fn expired_cookies_are_cleaned_up() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());
    let manager = CookieManager::open(&config).unwrap();
    manager.set(persistent("old", "a.com", 1));
    manager.set(persistent("new", "a.com", i64::MAX));

    assert_eq!(manager.get_all_valid().len(), 1);
    assert_eq!(manager.delete_expired(), 1);

    let reloaded = CookieManager::open(&config).unwrap();
    let names: Vec<_> = reloaded.get_all().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["new"]);
}

#[test]
fn statistics_and_domains() {
    let manager = CookieManager::in_memory(&CookieConfig::default());
    let mut secure = Cookie::new("s", "1", "a.com", "/");
    secure.secure = true;
    manager.set(secure);
    manager.set(persistent("p", ".b.com", i64::MAX));

    let stats = manager.statistics();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.secure, 1);
    assert_eq!(stats.persistent, 1);
    assert_eq!(stats.unique_domains, 2);
    assert_eq!(manager.domains(), [".b.com", "a.com"]);
}

#[test]
fn concurrent_traffic_leaves_consistent_file() {
    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());
    let manager = Arc::new(CookieManager::open(&config).unwrap());
    let interceptor = Arc::new(CookieInterceptor::new(manager.clone()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let interceptor = interceptor.clone();
            thread::spawn(move || {
                let url = Url::parse(&format!("https://site{t}.test/")).unwrap();
                for i in 0..25 {
                    let line = format!("c{i}={t}");
                    interceptor.extract_set_cookie_pairs(&url, [("Set-Cookie", line.as_str())]);
                    assert!(interceptor.build_cookie_header(&url).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.len(), 100);
    let reloaded = CookieManager::open(&config).unwrap();
    assert_eq!(reloaded.get_all(), manager.get_all());
}
