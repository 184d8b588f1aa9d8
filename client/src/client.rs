use crate::{Error, Result};
use cardscore_types::{
    api::{ErrorResponse, Rotate, Round, Setup},
    Ledger, PlayerId, SESSION_HEADER,
};
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// Timeout for connections and requests
const TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for transient HTTP failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request (including the first attempt).
    pub max_attempts: usize,
    /// Initial backoff delay after the first retryable failure.
    pub initial_backoff: Duration,
    /// Maximum backoff delay between attempts.
    pub max_backoff: Duration,
    /// Whether non-idempotent requests (e.g., POST) may be retried.
    ///
    /// Replaying a round settles it twice, so leave this off unless the
    /// server is known not to have seen the first attempt.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            retry_non_idempotent: false,
        }
    }
}

/// Card score API client
#[derive(Clone)]
pub struct Client {
    pub base_url: Url,
    pub http_client: HttpClient,

    session: Option<String>,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a new client addressing the default session.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }

        let http_client = HttpClient::builder()
            .timeout(TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            session: None,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Returns a client that addresses `session` instead of the default one.
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Returns a copy of the current retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Sets the retry policy for subsequent HTTP requests.
    pub fn set_retry_policy(&mut self, retry_policy: RetryPolicy) {
        self.retry_policy = retry_policy;
    }

    /// Returns a new client with the provided retry policy.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Current snapshot of the session's ledger.
    pub async fn game(&self) -> Result<Ledger> {
        let url = self.base_url.join("api/game")?;
        let response = self
            .send_with_retry(reqwest::Method::GET, || self.request(reqwest::Method::GET, &url))
            .await?;
        decode(response).await
    }

    /// Starts a new game.
    pub async fn setup(&self, setup: &Setup) -> Result<Ledger> {
        self.post("api/game/setup", setup).await
    }

    /// Settles a round won by `winner`.
    pub async fn round(&self, winner: PlayerId) -> Result<Ledger> {
        self.post(
            "api/game/round",
            &Round {
                winner_player_id: winner,
            },
        )
        .await
    }

    /// Benches and/or seats players between rounds.
    pub async fn rotate(&self, rotate: &Rotate) -> Result<Ledger> {
        self.post("api/game/rotate", rotate).await
    }

    /// Returns the session to setup, discarding the table.
    pub async fn back(&self) -> Result<Ledger> {
        self.post("api/game/back", &serde_json::json!({})).await
    }

    /// Zeroes every score, keeping the table.
    pub async fn clear(&self) -> Result<Ledger> {
        self.post("api/game/clear", &serde_json::json!({})).await
    }

    /// Themed names for auto-assigning `count` players.
    pub async fn names(&self, count: usize) -> Result<Vec<String>> {
        let mut url = self.base_url.join("api/names")?;
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        let response = self
            .send_with_retry(reqwest::Method::GET, || self.request(reqwest::Method::GET, &url))
            .await?;
        decode(response).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Ledger> {
        let url = self.base_url.join(path)?;
        debug!(%url, session = ?self.session, "posting");
        let response = self
            .send_with_retry(reqwest::Method::POST, || {
                self.request(reqwest::Method::POST, &url).json(body)
            })
            .await?;
        decode(response).await
    }

    fn request(&self, method: reqwest::Method, url: &Url) -> reqwest::RequestBuilder {
        let request = self.http_client.request(method, url.clone());
        match &self.session {
            Some(session) => request.header(SESSION_HEADER, session),
            None => request,
        }
    }

    async fn send_with_retry(
        &self,
        method: reqwest::Method,
        make_request: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let max_attempts =
            if method == reqwest::Method::GET || self.retry_policy.retry_non_idempotent {
                self.retry_policy.max_attempts.max(1)
            } else {
                1
            };

        let mut attempt = 0usize;
        let mut backoff = self.retry_policy.initial_backoff;
        loop {
            attempt += 1;
            let result = make_request().send().await;
            match result {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || attempt >= max_attempts {
                        return Ok(response);
                    }
                    debug!(%status, attempt, "retrying request");
                }
                Err(err) => {
                    if attempt >= max_attempts || !is_retryable_error(&err) {
                        return Err(Error::Reqwest(err));
                    }
                    debug!(?err, attempt, "retrying request");
                }
            }

            if backoff > Duration::ZERO {
                sleep(backoff).await;
                backoff = std::cmp::min(backoff.saturating_mul(2), self.retry_policy.max_backoff);
            }
        }
    }
}

/// Decodes a successful response, or turns an error response into [Error::Failed].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|err| err.error)
        .unwrap_or(body);
    Err(Error::Failed(status, message))
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    use reqwest::StatusCode;
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
