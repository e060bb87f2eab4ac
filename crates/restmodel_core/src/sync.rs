//! Sync protocol: verb mapping, per-model state and the engine that runs a
//! single request/response round trip.

use crate::error::{SyncError, SyncResult};
use crate::events;
use crate::model::Model;
use crate::transport::{HttpMethod, HttpResponse};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sync state of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No request outstanding.
    #[default]
    Idle,
    /// A request has been issued and has not completed.
    InFlight,
}

impl SyncState {
    /// Returns true if a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SyncState::InFlight)
    }
}

/// Semantic sync operation, distinct from the HTTP method it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncVerb {
    /// Fetch an existing entity.
    Load,
    /// Update an existing entity.
    Save,
    /// Persist a new entity.
    Create,
    /// Remove an existing entity.
    Delete,
}

impl SyncVerb {
    /// HTTP method for this verb.
    pub fn method(&self) -> HttpMethod {
        match self {
            SyncVerb::Load => HttpMethod::Get,
            SyncVerb::Save => HttpMethod::Put,
            SyncVerb::Create => HttpMethod::Post,
            SyncVerb::Delete => HttpMethod::Delete,
        }
    }

    /// True if the request targets the root endpoint rather than the entity.
    pub fn targets_root(&self) -> bool {
        matches!(self, SyncVerb::Create)
    }

    /// True if the request carries the model attributes as its body.
    pub fn sends_body(&self) -> bool {
        matches!(self, SyncVerb::Save | SyncVerb::Create)
    }

    /// Event fired on the model after a successful round trip.
    pub fn completion_event(&self) -> &'static str {
        match self {
            SyncVerb::Delete => events::DELETE,
            _ => events::SYNC,
        }
    }

    /// Lowercase verb name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncVerb::Load => "load",
            SyncVerb::Save => "save",
            SyncVerb::Create => "create",
            SyncVerb::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type CompleteFn = Arc<dyn Fn(&Model, &SyncResult<HttpResponse>) + Send + Sync>;

/// Per-call options for model sync verbs.
#[derive(Clone, Default)]
pub struct SyncOptions {
    on_complete: Option<CompleteFn>,
}

impl SyncOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked once the request completes, whether it
    /// succeeded or failed.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Model, &SyncResult<HttpResponse>) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Stateless driver translating `(model, verb)` into a request and folding
/// the response back into the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncEngine;

impl SyncEngine {
    /// Runs one sync round trip.
    ///
    /// If the model already has a request in flight this resolves immediately
    /// to the model without touching the network.
    pub async fn execute(model: &Model, verb: SyncVerb, options: SyncOptions) -> SyncResult<Model> {
        let Some(request) = model.begin_sync(verb)? else {
            debug!(
                resource = model.resource().name(),
                verb = verb.as_str(),
                "sync already in flight, skipping"
            );
            return Ok(model.clone());
        };

        let guard = InFlightGuard::new(model, verb);

        debug!(
            resource = model.resource().name(),
            verb = verb.as_str(),
            method = %request.method,
            url = %request.url,
            "issuing sync request"
        );

        let outcome = match model.client().send(request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(SyncError::status(response.status, response.body)),
            Err(err) => Err(SyncError::from(err)),
        };

        let result = model.finish_sync(verb, outcome);
        guard.disarm();

        match &result {
            Ok(_) => {
                model.emit(verb.completion_event());
            }
            Err(err) => {
                warn!(
                    resource = model.resource().name(),
                    verb = verb.as_str(),
                    error = %err,
                    "sync failed"
                );
                model.emit(events::ERROR);
            }
        }

        if let Some(callback) = &options.on_complete {
            callback(model, &result);
        }

        result.map(|_| model.clone())
    }
}

/// Puts a model back to `Idle` if its sync future is dropped before the
/// response is folded in.
struct InFlightGuard<'a> {
    model: &'a Model,
    verb: SyncVerb,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(model: &'a Model, verb: SyncVerb) -> Self {
        Self {
            model,
            verb,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(
                resource = self.model.resource().name(),
                verb = self.verb.as_str(),
                "sync cancelled before completion"
            );
            self.model.abandon_sync();
        }
    }
}
