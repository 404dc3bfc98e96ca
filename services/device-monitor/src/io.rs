//! HTTP client abstraction for testability

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A streamed response body, read chunk by chunk
#[async_trait]
pub trait ByteStream: Send {
    /// Next body chunk, or `None` at end of stream
    async fn next_chunk(&mut self) -> crate::Result<Option<Vec<u8>>>;
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a PUT request with a JSON body
    async fn put_json(&self, url: &str, body: &Value) -> crate::Result<HttpResponse>;

    /// Send a POST request with form-encoded body
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse>;

    /// Open a `text/event-stream` GET request, failing on a non-2xx status
    async fn open_event_stream(&self, url: &str) -> crate::Result<Box<dyn ByteStream>>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

struct ReqwestByteStream {
    response: reqwest::Response,
}

#[async_trait]
impl ByteStream for ReqwestByteStream {
    async fn next_chunk(&mut self) -> crate::Result<Option<Vec<u8>>> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|e| crate::MonitorError::Http(format!("Reading event stream: {}", e.without_url())))?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn put_json(&self, url: &str, body: &Value) -> crate::Result<HttpResponse> {
        tracing::debug!("PUT {}", redact(url));
        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                crate::MonitorError::Http(format!("PUT {} failed: {}", redact(url), e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::MonitorError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("PUT {} -> {} ({} bytes)", redact(url), status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", redact(url));
        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                crate::MonitorError::Http(format!("POST {} failed: {}", redact(url), e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::MonitorError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("POST {} -> {} ({} bytes)", redact(url), status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn open_event_stream(&self, url: &str) -> crate::Result<Box<dyn ByteStream>> {
        tracing::debug!("GET {} (event stream)", redact(url));
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| {
                crate::MonitorError::Http(format!("GET {} failed: {}", redact(url), e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::MonitorError::Http(format!(
                "GET {} returned status {}: {}",
                redact(url),
                status.as_u16(),
                body
            )));
        }

        Ok(Box::new(ReqwestByteStream { response }))
    }
}

/// Strip the query string so auth tokens never reach the logs
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
