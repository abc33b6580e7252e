//! Bounded retry around a single-attempt transport.
//!
//! [`Loader::load`] is the boundary where fetch failures stop being errors:
//! it always returns a [`LoadOutcome`], never `Err`, and never panics on a
//! transport failure.

use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use toolbox_shared::{Document, LoaderConfig};
use toolbox_transport::{FetchError, Transport};

/// Final result of loading one path.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The document was fetched and parsed.
    Success(Document),
    /// Every attempt failed; carries the last observed failure.
    Unavailable(FetchError),
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<Document, FetchError> {
        match self {
            Self::Success(doc) => Ok(doc),
            Self::Unavailable(err) => Err(err),
        }
    }
}

/// Retrying loader. Stateless between calls, so one instance can serve any
/// number of concurrent `load`s.
#[derive(Debug, Clone)]
pub struct Loader<T> {
    transport: T,
    config: LoaderConfig,
}

impl<T: Transport> Loader<T> {
    pub fn new(transport: T, config: LoaderConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Load `path`, retrying every failure kind up to `max_attempts` times.
    ///
    /// Each attempt gets the full timeout. After failed attempt `n` (except
    /// the last) the loader waits `n * backoff_base`.
    #[instrument(skip(self), fields(transport = self.transport.name()))]
    pub async fn load(&self, path: &str) -> LoadOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.fetch_once(path, self.config.timeout).await {
                Ok(doc) => {
                    debug!(attempt, "document loaded");
                    return LoadOutcome::Success(doc);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        kind = err.kind(),
                        error = %err,
                        "fetch attempt failed"
                    );

                    if attempt >= max_attempts {
                        warn!(error = %err, "document unavailable, giving up");
                        return LoadOutcome::Unavailable(err);
                    }

                    let wait = self.config.backoff_for(attempt);
                    debug!(wait_ms = wait.as_millis() as u64, "backing off before retry");
                    sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
