//! Fetches a URL with a cookie-aware client and prints what ended up in the jar.
//!
//! ```text
//! cargo run --example probe -- https://example.com/ [profile-dir]
//! ```
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use gosub_cookies::config::CookieConfig;
use gosub_cookies::cookies::{CookieInterceptor, CookieManager};
use gosub_cookies::logging;
use gosub_cookies::net::{client_with_cookies, fetch, ProbeMethod};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://example.com/".to_string());
    let url = Url::parse(&url).with_context(|| format!("invalid URL {url}"))?;

    let profile: PathBuf = match args.next() {
        Some(dir) => dir.into(),
        None => std::env::temp_dir().join("gosub-cookie-probe"),
    };
    let config = CookieConfig::builder().config_dir(&profile).build()?;

    let manager = Arc::new(CookieManager::open(&config)?);
    let interceptor = Arc::new(CookieInterceptor::new(manager.clone()));
    let client = client_with_cookies(interceptor)?;

    let response = fetch(&client, &url, ProbeMethod::Get).await?;
    println!("{} {} ({})", response.status, response.status_text, response.url);
    println!("Set-Cookie headers: {}", response.set_cookie_count());

    for cookie in manager.get_for_domain(url.host_str().unwrap_or_default()) {
        println!("  {cookie} (expires: {})", cookie.expiry_display());
    }

    let stats = manager.statistics();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("Profile: {}", profile.display());
    Ok(())
}
