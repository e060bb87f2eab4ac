//! HTTP transport abstraction.
//!
//! The core never talks to the network directly. Everything goes through an
//! [`HttpClient`], which lets callers plug in `reqwest`, an in-memory backend
//! for tests, or anything else that can answer GET/POST/PUT/DELETE with a
//! decoded JSON body.

use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;

/// HTTP methods used by the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Returns the method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL (endpoint plus optional query string).
    pub url: String,
    /// JSON body for POST/PUT.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a request without a body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body. Empty bodies decode to `Value::Null`.
    pub body: Value,
}

impl HttpResponse {
    /// Creates a response with the given status.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Creates a `204 No Content` response.
    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous HTTP client capability.
///
/// Implement [`send`](HttpClient::send); the verb helpers are provided.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the decoded response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Sends a `GET`.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new(HttpMethod::Get, url)).await
    }

    /// Sends a `POST` with a JSON body.
    async fn post(&self, url: &str, body: Value) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new(HttpMethod::Post, url).with_body(body))
            .await
    }

    /// Sends a `PUT` with a JSON body.
    async fn put(&self, url: &str, body: Value) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new(HttpMethod::Put, url).with_body(body))
            .await
    }

    /// Sends a `DELETE`.
    async fn delete(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::new(HttpMethod::Delete, url)).await
    }
}

/// A scripted client for testing.
///
/// Responses are handed out in the order they were queued. Every request is
/// recorded. When paused, requests block until [`release`](MockClient::release)
/// is called, which lets tests observe a model while its sync is in flight.
#[derive(Debug)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    paused: AtomicBool,
    gate: Semaphore,
}

impl MockClient {
    /// Creates a mock client with no queued responses.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            paused: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Makes subsequent requests wait for [`release`](MockClient::release).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Lets `count` waiting requests complete.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Returns all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);

        if self.paused.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| TransportError::fatal(e.to_string()))?;
            permit.forget();
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::fatal("no mock response queued")))
    }
}
