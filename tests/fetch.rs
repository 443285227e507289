use std::sync::Arc;

use gosub_cookies::config::CookieConfig;
use gosub_cookies::cookies::{CookieInterceptor, CookieManager};
use gosub_cookies::net::{client_with_cookies, fetch, ProbeMethod};
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{p}", server.uri())).unwrap()
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn set_cookie_is_stored_and_sent_back() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .append_header("set-cookie", "_ga=GA1.1.123; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = CookieConfig::with_dir(dir.path());
    let manager = Arc::new(CookieManager::open(&config).unwrap());
    let client = client_with_cookies(Arc::new(CookieInterceptor::new(manager.clone()))).unwrap();

    let login = fetch(&client, &url(&server, "/login"), ProbeMethod::Get).await.unwrap();
    assert_eq!(login.status, 200);
    assert_eq!(login.set_cookie_count(), 2);

    // Tracking cookie never reaches the jar
    let names: Vec<_> = manager.get_all().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["sid"]);

    let account = fetch(&client, &url(&server, "/account"), ProbeMethod::Get).await.unwrap();
    assert_eq!(account.status, 200);
    assert_eq!(account.body, b"welcome");

    assert!(config.cookies_path().exists());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn head_probe_stores_cookies_without_body() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(204).append_header("set-cookie", "probe=1; Max-Age=60"))
        .mount(&server)
        .await;

    let manager = Arc::new(CookieManager::in_memory(&CookieConfig::default()));
    let client = client_with_cookies(Arc::new(CookieInterceptor::new(manager.clone()))).unwrap();

    let response = fetch(&client, &url(&server, "/ping"), ProbeMethod::Head).await.unwrap();
    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());

    let cookie = manager.get("127.0.0.1", "/", "probe").unwrap();
    assert!(!cookie.session_only);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn cookies_set_during_redirect_are_kept() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/landing")
                .append_header("set-cookie", "flow=1"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header("cookie", "flow=1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let manager = Arc::new(CookieManager::in_memory(&CookieConfig::default()));
    let client = client_with_cookies(Arc::new(CookieInterceptor::new(manager.clone()))).unwrap();

    let response = fetch(&client, &url(&server, "/start"), ProbeMethod::Get).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.url.path(), "/landing");
    assert_eq!(manager.len(), 1);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn secure_cookie_is_not_sent_over_plain_http() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/set"))
        .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "s=1; Secure"))
        .mount(&server)
        .await;

    let manager = Arc::new(CookieManager::in_memory(&CookieConfig::default()));
    let interceptor = CookieInterceptor::new(manager.clone());
    let client = client_with_cookies(Arc::new(interceptor.clone())).unwrap();

    fetch(&client, &url(&server, "/set"), ProbeMethod::Get).await.unwrap();
    assert_eq!(manager.len(), 1);
    assert_eq!(interceptor.build_cookie_header(&url(&server, "/set")), None);
}
