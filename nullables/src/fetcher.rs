//! Nullable page fetcher: canned markup instead of the rendering proxy.

use async_trait::async_trait;
use socialkyc_fetch::{FetchError, PageFetcher};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug)]
enum Canned {
    Body(String),
    Unreachable,
    Unreadable,
}

/// Serves configured bodies by target URL. Unknown URLs fail as if the proxy
/// were unreachable.
pub struct NullFetcher {
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<String>>,
}

impl NullFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, target_url: &str, body: impl Into<String>) {
        self.insert(target_url, Canned::Body(body.into()));
    }

    /// Make `target_url` exhaust its retries.
    pub fn fail(&self, target_url: &str) {
        self.insert(target_url, Canned::Unreachable);
    }

    /// Make `target_url` answer but fail while reading the body.
    pub fn fail_read(&self, target_url: &str) {
        self.insert(target_url, Canned::Unreadable);
    }

    /// Every URL fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn insert(&self, target_url: &str, canned: Canned) {
        self.responses
            .lock()
            .unwrap()
            .insert(target_url.to_string(), canned);
    }
}

impl Default for NullFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for NullFetcher {
    async fn fetch(&self, target_url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(target_url.to_string());
        let canned = self.responses.lock().unwrap().get(target_url).cloned();
        match canned {
            Some(Canned::Body(body)) => Ok(body),
            Some(Canned::Unreadable) => Err(FetchError::FetchReadFailed(
                "connection reset while reading body".into(),
            )),
            Some(Canned::Unreachable) | None => Err(FetchError::FetchFailed {
                attempts: 3,
                reason: "proxy unreachable".into(),
            }),
        }
    }
}
