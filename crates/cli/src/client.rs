use std::time::Duration;

use reqwest::{IntoUrl, Method, RequestBuilder};
use url::Url;

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(120);
static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A thin wrapper over `reqwest` for talking to a Packetframe RPC surface
/// (the orchestrator's or an edge agent's), which both answer in plain text
/// rather than a JSON API.
#[derive(Clone)]
pub struct RpcClient {
    base_uri: Url,
}

impl RpcClient {
    pub fn new(base_uri: impl IntoUrl) -> Self {
        RpcClient { base_uri: base_uri.into_url().unwrap() }
    }

    pub fn base_uri(&self) -> &str {
        self.base_uri.as_str()
    }

    pub fn request(&self, method: Method, s: &str) -> RequestBuilder {
        let path = self.base_uri.join(s).unwrap();

        let client = reqwest::ClientBuilder::new()
            .user_agent(APP_USER_AGENT)
            .timeout(HTTP_CLIENT_TIMEOUT)
            .build()
            .unwrap();

        tracing::debug!("sending HTTP {method} request to '{path}'");
        client.request(method, path)
    }

    pub fn get(&self, s: &str) -> RequestBuilder {
        self.request(Method::GET, s)
    }

    pub fn post(&self, s: &str) -> RequestBuilder {
        self.request(Method::POST, s)
    }
}

pub fn format_http_error(err: reqwest::Error) -> String {
    format!("HTTP request failed: {err}")
}
