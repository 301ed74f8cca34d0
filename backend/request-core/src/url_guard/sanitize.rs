use crate::API_PROXY_PREFIX;
use crate::config::EnvironmentConfig;

use std::borrow::Cow;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const API_PATH_MARKER: &str = "/api/";

static ABSOLUTE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[^/?#]+(?P<path>/.*)?$").expect("valid absolute URL pattern")
});

/// `http://` or `https://`, case-insensitive.
pub fn is_absolute(url: &str) -> bool {
    let head = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    head.starts_with("http://") || head.starts_with("https://")
}

/// Host of an absolute URL, lower-cased. `None` for relative or unparsable input.
pub fn host_of(url: &str) -> Option<String> {
    if !is_absolute(url) {
        return None;
    }
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
}

/// Reduce a URL to a root-relative path + query.
///
/// Already-relative input comes back untouched. Absolute URLs on a trusted
/// host, or carrying an `/api/` segment, lose their scheme, host and leading
/// proxy prefix. Anything else is returned as is, for the detector to judge.
pub fn sanitize<'a>(url: &'a str, environment: &EnvironmentConfig) -> Cow<'a, str> {
    if url.starts_with('/') || !is_absolute(url) {
        return Cow::Borrowed(url);
    }

    match Url::parse(url) {
        Ok(parsed) => {
            let trusted = parsed
                .host_str()
                .is_some_and(|host| environment.is_trusted_host(host));

            if !trusted && !url.contains(API_PATH_MARKER) {
                return Cow::Borrowed(url);
            }

            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }

            let relative = strip_path_prefix(&path, API_PROXY_PREFIX);
            debug!("Converted absolute URL to relative: {} -> {}", url, relative);
            Cow::Owned(relative)
        }
        Err(e) if url.contains(API_PATH_MARKER) => {
            warn!("Falling back to pattern extraction for unparsable URL ({}): {}", e, url);
            let path = ABSOLUTE_URL_REGEX
                .captures(url)
                .and_then(|captures| captures.name("path"))
                .map_or("/", |m| m.as_str());
            Cow::Owned(strip_path_prefix(path, API_PROXY_PREFIX))
        }
        Err(_) => Cow::Borrowed(url),
    }
}

/// Remove one leading `prefix` segment. `/api` → `/`, `/api/x` → `/x`,
/// `/api?x` → `/?x`; `/apiary` is left alone.
pub fn strip_path_prefix(path: &str, prefix: &str) -> String {
    match path.strip_prefix(prefix) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        Some(rest) if rest.starts_with('?') => format!("/{}", rest),
        _ => path.to_string(),
    }
}

/// A root-relative path whose path component hides an absolute or
/// protocol-relative URL, such as `/http://host/x`, `/api/https://host/x` or
/// `//host/x`. Joined onto a base URL these replace the base host.
pub fn embeds_absolute_url(path: &str) -> bool {
    let path_only = path.split(['?', '#']).next().unwrap_or_default();
    if path_only.starts_with("//") || path_only.contains("://") {
        return true;
    }

    [path_only.to_string(), strip_path_prefix(path_only, API_PROXY_PREFIX)]
        .iter()
        .any(|candidate| Url::parse(candidate.trim_start_matches('/')).is_ok())
}

/// Leading `/`, no trailing slashes (the root stays `/`).
pub fn normalize_api_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
