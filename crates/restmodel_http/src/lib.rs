//! # restmodel HTTP
//!
//! A [`reqwest`]-backed implementation of [`restmodel_core::HttpClient`].
//!
//! This crate provides:
//! - `HttpConfig` for the base URL, timeouts, default headers, and user agent
//! - `ReqwestClient`, which sends JSON bodies and decodes JSON responses
//! - `HttpError`, which maps into the core `TransportError`
//!
//! ## Example
//!
//! ```rust,ignore
//! use restmodel_core::{Model, ResourceDef, SyncOptions};
//! use restmodel_http::{HttpConfig, ReqwestClient};
//! use std::sync::Arc;
//!
//! let client = ReqwestClient::new(HttpConfig::new("https://api.example.com"))?;
//! let users = Arc::new(ResourceDef::new("user", "/users"));
//! let user = Model::from_id(users, Arc::new(client), 7);
//! user.load(SyncOptions::default()).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::{HttpConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::{HttpError, HttpResult};
