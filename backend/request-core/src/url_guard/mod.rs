//! URL hardening: rewrite absolute URLs to root-relative paths and classify
//! anything that looks like a redirect or exfiltration attempt.

pub mod detect;
pub mod sanitize;

pub use detect::{ClassificationResult, RedirectDetector, SuspicionReason, validate_ml_endpoint};
pub use sanitize::{
    embeds_absolute_url, host_of, is_absolute, normalize_api_path, sanitize, strip_path_prefix,
};
