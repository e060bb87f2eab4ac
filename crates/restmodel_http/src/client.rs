//! reqwest-backed transport.

use crate::config::HttpConfig;
use crate::error::{HttpError, HttpResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use restmodel_core::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError};
use serde_json::Value;
use tracing::debug;

/// HTTP client that sends JSON requests with [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ReqwestClient {
    /// Builds a client from its configuration.
    pub fn new(config: HttpConfig) -> HttpResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.append(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout.unwrap_or(config.timeout))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    async fn dispatch(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let url = self.config.url_for(&request.url)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(to_method(request.method), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(status, bytes = bytes.len(), %url, "received response");

        Ok(HttpResponse::new(status, decode_body(&bytes)))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(self.dispatch(request).await?)
    }
}

fn to_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Decodes a response body. Empty and non-JSON bodies become `Null`.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "response body is not JSON");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_bodies() {
        assert_eq!(decode_body(br#"{"ID": 1}"#), json!({"ID": 1}));
        assert_eq!(decode_body(b"[1, 2]"), json!([1, 2]));
    }

    #[test]
    fn empty_and_text_bodies_are_null() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(b"<html>oops</html>"), Value::Null);
    }

    #[test]
    fn maps_methods() {
        assert_eq!(to_method(HttpMethod::Put), reqwest::Method::PUT);
        assert_eq!(to_method(HttpMethod::Delete), reqwest::Method::DELETE);
    }

    #[test]
    fn rejects_bad_headers() {
        let err = ReqwestClient::new(HttpConfig::default().with_header("bad header", "x"))
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader { name, .. } if name == "bad header"));
    }

    #[tokio::test]
    async fn relative_url_without_base_fails_before_sending() {
        let client = ReqwestClient::new(HttpConfig::default()).unwrap();
        let err = client.get("/users").await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("/users"));
    }

    #[test]
    fn rejects_relative_base_url() {
        let err = ReqwestClient::new(HttpConfig::new("example.com")).unwrap_err();
        assert!(matches!(err, HttpError::InvalidBaseUrl(_)));
    }
}
