//! Shared HTTP client for upstream listing endpoints.

use agora_core::SourceError;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

/// Longest upstream error body kept in a `RequestFailed` message.
const MAX_ERROR_BODY: usize = 300;

/// How a request authenticates.
#[derive(Clone, Default)]
pub enum Auth {
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// HTTP basic auth.
    Basic { username: String, password: String },
    /// A custom header, e.g. GitLab's `PRIVATE-TOKEN`.
    Header { name: &'static str, value: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Auth::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", &"[REDACTED]")
                .finish(),
        }
    }
}

impl Auth {
    /// Bearer auth when a token is present.
    pub fn bearer_opt(token: Option<&str>) -> Self {
        token.map_or(Auth::None, |t| Auth::Bearer(t.to_string()))
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Header { name, value } => request.header(*name, value),
        }
    }
}

/// One GET request against a provider's listing endpoint.
#[derive(Debug, Clone)]
pub struct ListingRequest<'a> {
    pub provider: &'a str,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub auth: Auth,
    pub accept: Option<&'static str>,
}

impl<'a> ListingRequest<'a> {
    pub fn new(provider: &'a str, url: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            accept: None,
        }
    }

    pub fn with_query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// Thin wrapper over `reqwest::Client` that maps upstream failures onto
/// [`SourceError`]. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// GET a JSON document.
    pub async fn get_json(&self, request: ListingRequest<'_>) -> Result<Value, SourceError> {
        let provider = request.provider;
        let mut builder = self.client.get(&request.url).query(&request.query);
        if let Some(accept) = request.accept {
            builder = builder.header(ACCEPT, accept);
        }
        builder = request.auth.apply(builder);

        let response = builder.send().await.map_err(|e| SourceError::RequestFailed {
            provider: provider.to_string(),
            status: e.status().map_or(0, |s| s.as_u16()),
            message: format!("HTTP request failed: {e}"),
        })?;

        let response = check_status(provider, response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::InvalidResponse {
                provider: provider.to_string(),
                reason: format!("Failed to parse response: {e}"),
            })
    }
}

async fn check_status(provider: &str, response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if let Some(retry_after_secs) = rate_limit_delay(status, response.headers()) {
        return Err(SourceError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs,
        });
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(SourceError::RequestFailed {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Seconds to wait if the response signals rate limiting.
///
/// 429 always counts. GitHub signals an exhausted quota with a 403 and
/// `x-ratelimit-remaining: 0`.
fn rate_limit_delay(status: StatusCode, headers: &HeaderMap) -> Option<u64> {
    let exhausted = status == StatusCode::FORBIDDEN
        && header_str(headers, "x-ratelimit-remaining") == Some("0");
    if status != StatusCode::TOO_MANY_REQUESTS && !exhausted {
        return None;
    }
    Some(parse_retry_after_secs(headers).unwrap_or(0))
}

fn parse_retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, "retry-after")
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs.ceil() as u64)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Prefer a JSON `message`/`error` field, else the raw body, truncated.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.chars().count() > MAX_ERROR_BODY {
        message.chars().take(MAX_ERROR_BODY).collect::<String>() + "..."
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_429_is_rate_limited_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("2.5"));
        assert_eq!(rate_limit_delay(StatusCode::TOO_MANY_REQUESTS, &headers), Some(3));
    }

    #[test]
    fn test_429_without_header_waits_zero() {
        assert_eq!(
            rate_limit_delay(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new()),
            Some(0)
        );
    }

    #[test]
    fn test_github_exhausted_quota_is_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("retry-after", HeaderValue::from_static("60"));
        assert_eq!(rate_limit_delay(StatusCode::FORBIDDEN, &headers), Some(60));
    }

    #[test]
    fn test_plain_403_is_not_rate_limited() {
        assert_eq!(rate_limit_delay(StatusCode::FORBIDDEN, &HeaderMap::new()), None);
        assert_eq!(rate_limit_delay(StatusCode::BAD_GATEWAY, &HeaderMap::new()), None);
    }

    #[test]
    fn test_error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"message":"Bad credentials"}"#), "Bad credentials");
        assert_eq!(error_message(r#"{"error":"invalid token"}"#), "invalid token");
        assert_eq!(error_message("  upstream down \n"), "upstream down");
    }

    #[test]
    fn test_error_message_is_truncated() {
        let long = "x".repeat(1000);
        let message = error_message(&long);
        assert_eq!(message.len(), MAX_ERROR_BODY + 3);
    }

    #[test]
    fn test_auth_debug_is_redacted() {
        let auth = Auth::Basic {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = format!("{auth:?}");
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter2"));
        assert!(!format!("{:?}", Auth::Bearer("tok".into())).contains("tok"));
    }
}
