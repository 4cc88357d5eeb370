//! Query parameters sent to the rendering proxy.

use rand::seq::SliceRandom;
use std::time::Duration;

/// Exit countries the proxy rotates through. Social networks rate-limit per
/// region, so spreading requests keeps any one region under the limit.
pub const PROXY_COUNTRIES: [&str; 5] = ["us", "gb", "de", "fr", "ca"];

/// Ordered key/value parameters with replace-by-key semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// The rendering defaults every scrape starts from.
    pub fn defaults(render_timeout: Duration) -> Self {
        let country = PROXY_COUNTRIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PROXY_COUNTRIES[0]);
        let mut params = Self::default();
        params.set("render_js", "true");
        params.set("device", "mobile");
        params.set("proxy_type", "residential");
        params.set("timeout", render_timeout.as_millis().to_string());
        params.set("wait_until", "networkidle");
        params.set("country", country);
        params
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_rendering() {
        let params = QueryParams::defaults(Duration::from_secs(30));
        assert_eq!(params.get("render_js"), Some("true"));
        assert_eq!(params.get("device"), Some("mobile"));
        assert_eq!(params.get("proxy_type"), Some("residential"));
        assert_eq!(params.get("timeout"), Some("30000"));
        assert_eq!(params.get("wait_until"), Some("networkidle"));
        let country = params.get("country").unwrap();
        assert!(PROXY_COUNTRIES.contains(&country));
    }

    #[test]
    fn set_replaces_existing_keys_in_place() {
        let mut params = QueryParams::defaults(Duration::from_secs(30));
        params.set("device", "desktop");
        params.set("extra", "1");
        assert_eq!(params.get("device"), Some("desktop"));
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys.iter().filter(|k| **k == "device").count(), 1);
        assert_eq!(keys.last(), Some(&"extra"));
    }
}
