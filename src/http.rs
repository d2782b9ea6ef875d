//! HTTP client construction for the engine connection
//!
//! Builds a reqwest::Client from `EngineConfig` timeouts and honors the usual proxy env vars

use crate::config::EngineConfig;
use crate::error::SearchError;
use reqwest::{Client, Proxy};
use url::Url;

/// Build the reqwest Client used for every engine request.
///
/// Proxy selection honors HTTPS_PROXY / HTTP_PROXY / ALL_PROXY and NO_PROXY
/// (upper or lower case). Engines on localhost are typically listed in NO_PROXY.
pub fn engine_client(config: &EngineConfig) -> Result<Client, SearchError> {
    let mut builder = Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout());

    let env = ProxyEnv::from_env();
    if let Some(proxy) = env.into_proxy() {
        builder = builder.proxy(proxy);
    }

    builder
        .user_agent(concat!("searchforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SearchError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[derive(Debug, Clone, Default)]
struct ProxyEnv {
    https: Option<String>,
    http: Option<String>,
    bypass: Vec<BypassRule>,
}

impl ProxyEnv {
    fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .find(|v| !v.trim().is_empty())
        };
        let all = first(&["ALL_PROXY", "all_proxy"]);
        Self {
            https: first(&["HTTPS_PROXY", "https_proxy"]).or_else(|| all.clone()),
            http: first(&["HTTP_PROXY", "http_proxy"]).or(all),
            bypass: parse_bypass_rules(&first(&["NO_PROXY", "no_proxy"]).unwrap_or_default()),
        }
    }

    /// Pick the proxy for a URL, or None when it should go direct
    fn select(&self, url: &Url) -> Option<String> {
        let host = url.host_str().unwrap_or("");
        if bypasses(host, &self.bypass) {
            return None;
        }
        match url.scheme() {
            "https" => self.https.clone().or_else(|| self.http.clone()),
            "http" => self.http.clone().or_else(|| self.https.clone()),
            _ => None,
        }
    }

    fn into_proxy(self) -> Option<Proxy> {
        if self.https.is_none() && self.http.is_none() {
            return None;
        }
        Some(Proxy::custom(move |url: &Url| self.select(url)))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BypassRule {
    Everything,
    Suffix(String),
    Host(String),
}

fn parse_bypass_rules(val: &str) -> Vec<BypassRule> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|token| {
            if token == "*" {
                return BypassRule::Everything;
            }
            if let Some(domain) = token.strip_prefix('.') {
                return BypassRule::Suffix(domain.to_ascii_lowercase());
            }
            let t = token.to_ascii_lowercase();
            if t == "localhost" || t.parse::<std::net::IpAddr>().is_ok() {
                BypassRule::Host(t)
            } else {
                BypassRule::Suffix(t)
            }
        })
        .collect()
}

fn bypasses(host: &str, rules: &[BypassRule]) -> bool {
    if host.is_empty() {
        return false;
    }
    let host = host.to_ascii_lowercase();
    rules.iter().any(|rule| match rule {
        BypassRule::Everything => true,
        BypassRule::Host(h) => &host == h,
        BypassRule::Suffix(suffix) => host == *suffix || host.ends_with(&format!(".{}", suffix)),
    })
}
