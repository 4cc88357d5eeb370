//! Post URL checks.

use crate::VerifyError;
use url::Url;

/// Whether `raw` is an `https` URL on `domain` or one of its subdomains.
pub fn has_root_domain_and_https(raw: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(raw) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let domain = domain.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Account handle from a `.../<handle>/status/<id>` post URL.
pub fn extract_username(raw: &str) -> Result<String, VerifyError> {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    let not_found = || VerifyError::UsernameNotFound(raw.to_string());

    if segments.len() < 3 || segments[segments.len() - 2] != "status" {
        return Err(not_found());
    }
    let handle = segments[segments.len() - 3];
    let valid = !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(not_found());
    }
    Ok(handle.to_string())
}
