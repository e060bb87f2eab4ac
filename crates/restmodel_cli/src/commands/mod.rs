//! CLI command implementations.
//!
//! Each command returns the JSON it would print so it can be driven against
//! any [`HttpClient`].

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use restmodel_core::{Attributes, HttpClient, Model, ModelId, Resource};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for commands.
pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Invalid command-line input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    /// A `--query` argument without `=`.
    #[error("query parameter {0:?} must look like key=value")]
    InvalidQuery(String),

    /// A `--header` argument without `:`.
    #[error("header {0:?} must look like Name: value")]
    InvalidHeader(String),

    /// The data argument is not a JSON object.
    #[error("data must be a JSON object: {0}")]
    InvalidData(String),
}

/// What every command operates on.
pub struct Context {
    /// The resource named on the command line.
    pub resource: Arc<dyn Resource>,
    /// Transport used by models and collections.
    pub client: Arc<dyn HttpClient>,
}

impl Context {
    /// Creates a context.
    pub fn new(resource: Arc<dyn Resource>, client: Arc<dyn HttpClient>) -> Self {
        Self { resource, client }
    }

    /// Creates a reference to the entity with the given id.
    pub fn model(&self, id: &str) -> Model {
        Model::from_id(
            Arc::clone(&self.resource),
            Arc::clone(&self.client),
            parse_id(id),
        )
    }

    /// Creates a new, unsaved model.
    pub fn new_model(&self) -> Model {
        Model::new(Arc::clone(&self.resource), Arc::clone(&self.client))
    }
}

/// Integer-looking ids are sent as numbers, everything else as strings.
pub fn parse_id(raw: &str) -> ModelId {
    raw.parse::<i64>()
        .map(ModelId::Int)
        .unwrap_or_else(|_| ModelId::Str(raw.to_string()))
}

/// Parses a JSON object argument.
pub fn parse_data(raw: &str) -> Result<Attributes, InputError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(InputError::InvalidData(format!("got {other}"))),
        Err(err) => Err(InputError::InvalidData(err.to_string())),
    }
}

/// Splits a `key=value` argument.
pub fn parse_query(raw: &str) -> Result<(String, String), InputError> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| InputError::InvalidQuery(raw.to_string()))
}

/// Splits a `Name: value` argument.
pub fn parse_header(raw: &str) -> Result<(String, String), InputError> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| InputError::InvalidHeader(raw.to_string()))
}

pub(crate) fn model_json(model: &Model) -> Value {
    Value::Object(model.attributes())
}
