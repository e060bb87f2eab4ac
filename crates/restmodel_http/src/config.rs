//! Configuration for the HTTP client.

use crate::error::{HttpError, HttpResult};
use std::time::Duration;
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("restmodel/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`ReqwestClient`](crate::ReqwestClient).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Prefix prepended to every relative request URL.
    pub base_url: String,
    /// Total request timeout.
    pub timeout: Duration,
    /// Connect timeout. Falls back to `timeout` when unset.
    pub connect_timeout: Option<Duration>,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
}

impl HttpConfig {
    /// Creates a configuration rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            headers: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Adds a default header. Later values for the same name are appended.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks that the base URL is usable.
    ///
    /// An empty base URL is allowed; requests must then carry absolute URLs.
    pub fn validate(&self) -> HttpResult<()> {
        self.parsed_base().map(|_| ())
    }

    /// Parses the base URL, normalised to end with `/` so joins append to its path.
    pub fn parsed_base(&self) -> HttpResult<Option<Url>> {
        if self.base_url.is_empty() {
            return Ok(None);
        }
        let mut base = Url::parse(&self.base_url)
            .map_err(|_| HttpError::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(HttpError::InvalidBaseUrl(self.base_url.clone()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Some(base))
    }

    /// Resolves a request URL against the base URL.
    ///
    /// Relative paths extend the base path; absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> HttpResult<Url> {
        let invalid = |err: url::ParseError| HttpError::InvalidUrl {
            url: path.to_string(),
            reason: err.to_string(),
        };
        match self.parsed_base()? {
            Some(base) => base.join(path.trim_start_matches('/')).map_err(invalid),
            None => Url::parse(path).map_err(invalid),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new("")
    }
}
