//! Minimal GitHub API client

use super::LOG_TARGET;
use crate::sources::SourceError;
use chrono::{DateTime, Utc};
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use seatbelt::ResilienceContext;
use seatbelt::timeout::Timeout;
use serde::de::DeserializeOwned;
use tick::Clock;

/// Upper bound on a single API call, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    Success(T),

    /// Rate limited (429, or 403 with an exhausted quota or a `Retry-After` header).
    /// The reset time is known only when the headers carried it.
    RateLimited(Option<RateLimitInfo>),

    /// The server had a problem (5xx), couldn't be reached at all, or didn't answer in time
    Unreachable(ohno::AppError),

    /// Any other non-success status; retrying won't change the answer
    Failed(ohno::AppError),
}

/// A response read to completion.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl Client {
    /// Create a new API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> crate::Result<Self> {
        use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder().user_agent("prime").default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, path_and_query: &str) -> HostingApiResult<Vec<u8>> {
        let url = format!("{}{path_and_query}", self.base_url);

        let resp = match self.send(url.clone()).await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Unreachable(app_err!("request to '{url}' failed: {e}")),
        };

        let status = resp.status;
        if status.is_success() {
            return HostingApiResult::Success(resp.body);
        }

        if is_rate_limited(status, &resp.headers) {
            return HostingApiResult::RateLimited(extract_rate_limit_from_headers(&resp.headers));
        }

        if status.is_server_error() {
            return HostingApiResult::Unreachable(app_err!("'{url}' answered with HTTP {status}"));
        }

        HostingApiResult::Failed(app_err!("'{url}' answered with HTTP {status}"))
    }

    /// Sends a GET request and reads the whole body, bounded by the request timeout.
    async fn send(&self, url: String) -> crate::Result<RawResponse> {
        let clock = Clock::new_tokio();
        let context = ResilienceContext::new(&clock).name("github_api");

        let client = self.client.clone();
        let service = (
            Timeout::layer("timeout", &context)
                .timeout_error(|_| app_err!("request timed out"))
                .timeout(self.request_timeout),
            Execute::new(move |url: String| {
                let client = client.clone();
                async move {
                    let resp = client.get(&url).send().await?;
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    let body = resp.bytes().await?.to_vec();
                    Ok::<_, ohno::AppError>(RawResponse { status, headers, body })
                }
            }),
        )
            .into_service();

        service.execute(url).await
    }

    /// Fetch and decode a JSON document, mapping failures onto [`SourceError`].
    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, SourceError> {
        let body = match self.api_call(path_and_query).await {
            HostingApiResult::Success(body) => body,
            HostingApiResult::RateLimited(info) => {
                let detail = info.map_or_else(String::new, |i| format!(" ({} requests left, resets at {})", i.remaining, i.reset_at));
                log::warn!(target: LOG_TARGET, "Rate limited while fetching '{path_and_query}'{detail}");
                return Err(SourceError::unavailable(app_err!("rate limited by GitHub{detail}")));
            }
            HostingApiResult::Unreachable(e) => return Err(SourceError::Unavailable(e)),
            HostingApiResult::Failed(e) => return Err(SourceError::Parse(e)),
        };

        serde_json::from_slice(&body)
            .into_app_err_with(|| format!("could not decode response for '{path_and_query}'"))
            .map_err(SourceError::Parse)
    }
}

/// A 429 is always a rate limit. A 403 is one only when the quota is exhausted or the
/// server asks to come back later; otherwise it's a permission problem.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            headers.contains_key(RETRY_AFTER)
                || headers
                    .get("x-ratelimit-remaining")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<usize>().ok())
                    == Some(0)
        }
        _ => false,
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
