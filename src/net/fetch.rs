use std::sync::Arc;

use log::debug;
use reqwest::{Client, Method};
use url::Url;

use crate::cookies::CookieInterceptor;
use crate::net::ProbeResponse;

/// Request method of a navigation probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMethod {
    Head,
    #[default]
    Get,
}

impl From<ProbeMethod> for Method {
    fn from(method: ProbeMethod) -> Self {
        match method {
            ProbeMethod::Head => Method::HEAD,
            ProbeMethod::Get => Method::GET,
        }
    }
}

/// Client that sends and stores cookies through `interceptor`.
pub fn client_with_cookies(interceptor: Arc<CookieInterceptor>) -> Result<Client, reqwest::Error> {
    Client::builder().cookie_provider(interceptor).build()
}

// Performs a probe request and buffers the response. Cookie handling happens
// inside the client's cookie provider, never across this await.
pub async fn fetch(client: &Client, url: &Url, method: ProbeMethod) -> Result<ProbeResponse, reqwest::Error> {
    let res = client.request(method.into(), url.clone()).send().await?;

    let final_url = res.url().clone();
    let status = res.status().as_u16();
    let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
    let headers = res.headers().clone();
    debug!("{method:?} {url} -> {status} ({final_url})");

    // Fetch body. We don't do streaming yet
    let body = match method {
        ProbeMethod::Head => Vec::new(),
        ProbeMethod::Get => res.bytes().await?.to_vec(),
    };

    Ok(ProbeResponse {
        url: final_url,
        status,
        status_text,
        headers,
        body,
    })
}
