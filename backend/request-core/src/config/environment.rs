use crate::{BACKEND_LOAD_BALANCER_HOST, LOCAL_DEVELOPMENT_HOST, LOOPBACK_HOST, PRODUCTION_DOMAIN};

use serde::{Deserialize, Serialize};

const LOOPBACK_HOSTS: &[&str] = &[LOCAL_DEVELOPMENT_HOST, LOOPBACK_HOST, "::1", "[::1]"];

/// Trust context every URL decision is made against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Development build. Relaxes the localhost rule of the redirect detector,
    /// adds `X-Development-Mode: 1` and turns on per-request debug logging.
    #[serde(default)]
    pub development: bool,

    /// Host the application itself is served from, if any. Treated like
    /// loopback by the development override.
    #[serde(default)]
    pub origin_host: Option<String>,

    /// Exact hosts whose absolute URLs are rewritten to root-relative paths.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Domains no request or response URL may mention.
    #[serde(default = "default_disallowed_domains")]
    pub disallowed_domains: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            development: false,
            origin_host: None,
            trusted_hosts: default_trusted_hosts(),
            disallowed_domains: default_disallowed_domains(),
        }
    }
}

impl EnvironmentConfig {
    pub fn development() -> Self {
        Self {
            development: true,
            ..Self::default()
        }
    }

    pub fn production() -> Self {
        Self::default()
    }

    /// Exact, case-insensitive match against the allow-list.
    pub fn is_trusted_host(&self, host: &str) -> bool {
        self.trusted_hosts
            .iter()
            .any(|trusted| trusted.eq_ignore_ascii_case(host))
    }

    pub fn is_loopback_host(host: &str) -> bool {
        LOOPBACK_HOSTS
            .iter()
            .any(|loopback| loopback.eq_ignore_ascii_case(host))
    }

    /// Loopback or the configured origin host.
    pub fn is_development_host(&self, host: &str) -> bool {
        Self::is_loopback_host(host)
            || self
                .origin_host
                .as_deref()
                .is_some_and(|origin| origin.eq_ignore_ascii_case(host))
    }

    /// First disallowed domain mentioned anywhere in `url`.
    pub fn disallowed_domain_in(&self, url: &str) -> Option<&str> {
        let lowered = url.to_ascii_lowercase();
        self.disallowed_domains
            .iter()
            .find(|domain| lowered.contains(&domain.to_ascii_lowercase()))
            .map(String::as_str)
    }
}

fn default_trusted_hosts() -> Vec<String> {
    vec![
        LOCAL_DEVELOPMENT_HOST.to_string(),
        LOOPBACK_HOST.to_string(),
        BACKEND_LOAD_BALANCER_HOST.to_string(),
    ]
}

fn default_disallowed_domains() -> Vec<String> {
    vec![PRODUCTION_DOMAIN.to_string()]
}
