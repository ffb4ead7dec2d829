//! Media upload API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! POST commands go out as a URL-encoded form, GET commands as a query
//! string, both to `{base_url}/{endpoint}.json`.

use std::collections::BTreeMap;

use mediadrop_protocol::{ApiResponse, HttpMethod, RawResponse};
use mediadrop_uploader::{Transport, TransportError, TransportFuture};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://upload.twitter.com/1.1";

/// Errors building the client.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid bearer token")]
    InvalidToken,
}

/// Upload API client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a new client that authenticates with `token`.
    pub fn new(token: &str) -> Result<Self, HttpError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| HttpError::InvalidToken)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("mediadrop/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `endpoint`, e.g. `media/upload` becomes
    /// `{base_url}/media/upload.json`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &serde_json::Value,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(endpoint);
        let fields = build_params(params);

        let request = match method {
            HttpMethod::Get => self.http.get(&url).query(&fields),
            HttpMethod::Post => self.http.post(&url).form(&fields),
        };
        let resp = request.send().await.map_err(http_error)?;

        let status = resp.status();
        let headers = collect_headers(resp.headers());
        let body = resp.bytes().await.map_err(http_error)?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(%method, %url, status = status.as_u16(), "request rejected");
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "request ok");

        let body = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))?
        };

        Ok(ApiResponse::new(
            body,
            RawResponse {
                status: status.as_u16(),
                headers,
            },
        ))
    }
}

impl Transport for HttpTransport {
    fn get(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        let endpoint = endpoint.to_string();
        let params = params.clone();
        Box::pin(async move { self.send(HttpMethod::Get, &endpoint, &params).await })
    }

    fn post(&self, endpoint: &str, params: &serde_json::Value) -> TransportFuture<'_> {
        let endpoint = endpoint.to_string();
        let params = params.clone();
        Box::pin(async move { self.send(HttpMethod::Post, &endpoint, &params).await })
    }
}

fn http_error(e: reqwest::Error) -> TransportError {
    TransportError::Http(e.to_string())
}

/// Flattens a JSON object into form/query pairs.
///
/// Strings are sent as-is, nulls are dropped, everything else uses its
/// JSON text. Non-object values produce no pairs.
fn build_params(params: &serde_json::Value) -> Vec<(String, String)> {
    let Some(obj) = params.as_object() else {
        return Vec::new();
    };

    obj.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
