//! In-memory transport with scripted responses per path.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use toolbox_transport::{FetchError, FetchResult, Transport};

struct Route {
    responses: Vec<FetchResult>,
    delay: Duration,
}

/// Replays the `n`th scripted response on the `n`th call to a path; the last
/// response repeats. Unknown paths answer 404. A delay longer than the
/// attempt budget behaves like a real timeout.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: HashMap<String, Route>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, path: &str, responses: Vec<FetchResult>) -> Self {
        self.delayed(path, Duration::ZERO, responses)
    }

    pub(crate) fn ok(self, path: &str, doc: Value) -> Self {
        self.route(path, vec![Ok(doc)])
    }

    pub(crate) fn failing(self, path: &str, err: FetchError) -> Self {
        self.route(path, vec![Err(err)])
    }

    pub(crate) fn delayed(mut self, path: &str, delay: Duration, responses: Vec<FetchResult>) -> Self {
        self.routes
            .insert(path.to_string(), Route { responses, delay });
        self
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_once(&self, path: &str, timeout: Duration) -> FetchResult {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(path.to_string()).or_default();
            *count += 1;
            *count
        };

        let Some(route) = self.routes.get(path) else {
            return Err(FetchError::HttpStatus(404));
        };

        if route.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(FetchError::Timeout(timeout));
        }
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        route
            .responses
            .get(call - 1)
            .or(route.responses.last())
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus(404)))
    }
}

/// Assert a paused-clock elapsed time, allowing for millisecond tick rounding.
pub(crate) fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed <= expected + Duration::from_millis(5),
        "expected ~{expected:?}, got {elapsed:?}"
    );
}
