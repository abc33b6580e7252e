//! Primary transport: HTTP GET via `reqwest`.

use std::time::Duration;

use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use toolbox_shared::{Result, ToolboxError};
use tracing::debug;
use url::Url;

use crate::{FetchError, FetchResult, Transport, relative};

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for document requests.
const USER_AGENT: &str = concat!("toolbox/", env!("CARGO_PKG_VERSION"));

/// Fetches documents relative to an HTTP(S) serving root.
///
/// The per-attempt timeout is set on each request, so an expired budget
/// cancels that request and nothing else sharing the client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport rooted at `base`.
    pub fn new(mut base: Url) -> Result<Self> {
        // Without a trailing slash, `join` would replace the last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: build_client()?,
            base,
        })
    }

    /// The normalized serving root.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, path: &str) -> std::result::Result<Url, FetchError> {
        self.base
            .join(relative(path))
            .map_err(|e| FetchError::Network(format!("invalid path {path}: {e}")))
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_once(&self, path: &str, timeout: Duration) -> FetchResult {
        let url = self.resolve(path)?;
        debug!(%url, timeout_ms = timeout.as_millis() as u64, "http fetch");

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&url, e, timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&url, e, timeout))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Parse(format!("{url}: {e}")))
    }
}

/// Build a reqwest client with JSON-oriented default headers.
fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| ToolboxError::Network(format!("failed to build HTTP client: {e}")))
}

fn classify(url: &Url, err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Network(format!("{url}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[test]
    fn base_gets_trailing_slash() {
        let t = HttpTransport::new(Url::parse("http://localhost:5000/site").unwrap()).unwrap();
        assert_eq!(t.base().as_str(), "http://localhost:5000/site/");
        assert_eq!(
            t.resolve("/tools/config.json").unwrap().as_str(),
            "http://localhost:5000/site/tools/config.json"
        );
    }

    #[tokio::test]
    async fn fetches_and_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tools/config.json"))
            .and(header("accept", "application/json"))
            .and(header("cache-control", "no-cache"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"categories": []}"#),
            )
            .mount(&server)
            .await;

        let t = transport_for(&server).await;
        let doc = t
            .fetch_once("tools/config.json", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(doc, serde_json::json!({"categories": []}));
    }

    #[tokio::test]
    async fn non_200_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(path("/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/created.json"))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .mount(&server)
            .await;

        let t = transport_for(&server).await;
        let err = t
            .fetch_once("missing.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(404));

        // Only 200 counts as success.
        let err = t
            .fetch_once("created.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(201));
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(path("/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"categories": ["#))
            .mount(&server)
            .await;

        let t = transport_for(&server).await;
        let err = t
            .fetch_once("broken.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let t = transport_for(&server).await;
        let budget = Duration::from_millis(200);
        let started = Instant::now();
        let err = t.fetch_once("slow.json", budget).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout(budget));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        // Grab a free port, then release it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let t = HttpTransport::new(base).unwrap();

        let err = t
            .fetch_once("tools/config.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
