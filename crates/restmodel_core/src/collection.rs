//! Ordered groups of models backed by a REST listing endpoint.

use crate::collection_type::{CollectionDef, CollectionType, ExtendedCollection};
use crate::error::{ConfigError, SyncError, SyncResult};
use crate::events::{self, EventEmitter, ListenerId};
use crate::id::ModelId;
use crate::model::{json_kind, Model};
use crate::query::{QueryParams, QueryValue};
use crate::resource::Resource;
use crate::transport::HttpClient;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Shared handle to a collection.
///
/// Members are kept in insertion order. A model instance appears at most once;
/// distinct instances with the same identifier are allowed. When a member
/// fires `delete` the collection drops it.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    kind: Arc<dyn CollectionType>,
    client: Arc<dyn HttpClient>,
    state: Mutex<CollectionState>,
    events: EventEmitter<Model>,
}

#[derive(Default)]
struct CollectionState {
    members: Vec<Member>,
    query: QueryParams,
}

struct Member {
    model: Model,
    listener: ListenerId,
}

impl CollectionInner {
    fn remove(&self, model: &Model) {
        let removed = {
            let mut state = self.state.lock();
            state
                .members
                .iter()
                .position(|m| m.model.ptr_eq(model))
                .map(|index| state.members.remove(index))
        };

        if let Some(member) = removed {
            member.model.off(events::DELETE, Some(member.listener));
            debug!(
                resource = self.kind.resource().name(),
                "removed deleted model from collection"
            );
        }
    }
}

impl Collection {
    /// Creates a collection of `resource` models.
    pub fn new(resource: Arc<dyn Resource>, client: Arc<dyn HttpClient>) -> Self {
        Self::assemble(Arc::new(CollectionDef::new(resource)), client)
    }

    /// Creates a collection whose endpoint and member construction come from
    /// `kind`.
    pub fn with_type(kind: Arc<dyn CollectionType>, client: Arc<dyn HttpClient>) -> Self {
        Self::assemble(kind, client)
    }

    /// Starts building a collection.
    pub fn builder() -> CollectionBuilder {
        CollectionBuilder::default()
    }

    fn assemble(kind: Arc<dyn CollectionType>, client: Arc<dyn HttpClient>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<CollectionInner>| {
            let emitter = EventEmitter::<Model>::new();
            emitter.on_with_context(events::MODEL_DELETE, weak.clone(), |weak, model| {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(model);
                }
            });
            CollectionInner {
                kind,
                client,
                state: Mutex::new(CollectionState::default()),
                events: emitter,
            }
        });
        Self { inner }
    }

    /// Returns the element resource.
    pub fn resource(&self) -> &Arc<dyn Resource> {
        self.inner.kind.resource()
    }

    /// Returns the collection type.
    pub fn collection_type(&self) -> &Arc<dyn CollectionType> {
        &self.inner.kind
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.inner.client
    }

    /// Returns the member at `index`.
    pub fn at(&self, index: usize) -> Option<Model> {
        self.inner
            .state
            .lock()
            .members
            .get(index)
            .map(|m| m.model.clone())
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.inner.state.lock().members.len()
    }

    /// Returns true if there are no members.
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().members.is_empty()
    }

    /// Returns handles to all members in order.
    pub fn models(&self) -> Vec<Model> {
        self.inner
            .state
            .lock()
            .members
            .iter()
            .map(|m| m.model.clone())
            .collect()
    }

    /// Returns true if this exact instance is a member.
    pub fn contains(&self, model: &Model) -> bool {
        self.inner
            .state
            .lock()
            .members
            .iter()
            .any(|m| m.model.ptr_eq(model))
    }

    /// Returns the first member with the given identifier.
    pub fn get(&self, id: &ModelId) -> Option<Model> {
        self.inner
            .state
            .lock()
            .members
            .iter()
            .find(|m| m.model.id().as_ref() == Some(id))
            .map(|m| m.model.clone())
    }

    /// Appends a model and starts watching it for deletion.
    ///
    /// Adding an instance that is already a member does nothing.
    pub fn add(&self, model: Model) -> &Self {
        {
            let mut state = self.inner.state.lock();
            if state.members.iter().any(|m| m.model.ptr_eq(&model)) {
                return self;
            }
            // Model listeners live behind their own lock, so subscribing
            // here cannot reenter this one.
            let weak = Arc::downgrade(&self.inner);
            let listener = model.on(events::DELETE, move |deleted| {
                if let Some(inner) = weak.upgrade() {
                    inner.events.emit(events::MODEL_DELETE, deleted);
                }
            });
            state.members.push(Member {
                model: model.clone(),
                listener,
            });
        }

        self.inner.events.emit(events::ADD, &model);
        self
    }

    /// Removes every member.
    pub fn empty(&self) -> &Self {
        let members = std::mem::take(&mut self.inner.state.lock().members);
        for member in members {
            member.model.off(events::DELETE, Some(member.listener));
        }
        self
    }

    /// Merges query parameters used by [`load`](Collection::load).
    pub fn query<I, K, V>(&self, parts: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        self.inner.state.lock().query.extend(parts);
        self
    }

    /// Clears query parameters.
    pub fn reset_query(&self) -> &Self {
        self.inner.state.lock().query.clear();
        self
    }

    /// Returns a copy of the current query parameters.
    pub fn query_params(&self) -> QueryParams {
        self.inner.state.lock().query.clone()
    }

    /// Returns `?k=v&...`, or an empty string without parameters.
    pub fn query_string(&self) -> String {
        self.inner.state.lock().query.to_query_string()
    }

    /// Returns the listing endpoint of the collection type.
    pub fn endpoint(&self) -> String {
        self.inner.kind.endpoint().to_string()
    }

    /// Fetches the listing and replaces all members with the result.
    ///
    /// On failure the current members are kept.
    pub async fn load(&self) -> SyncResult<Collection> {
        let url = format!("{}{}", self.endpoint(), self.query_string());
        debug!(resource = self.resource().name(), url = %url, "loading collection");

        let response = self.inner.client.get(&url).await?;
        if !response.is_success() {
            return Err(SyncError::status(response.status, response.body));
        }

        let items = match response.body {
            Value::Array(items) => items,
            other => {
                return Err(SyncError::Protocol(format!(
                    "expected an array body for collection listing, got {}",
                    json_kind(&other)
                )))
            }
        };

        self.empty();
        for item in items {
            let model = self.inner.kind.build_member(&self.inner.client, item);
            self.add(model);
        }

        debug!(
            resource = self.resource().name(),
            count = self.len(),
            "collection loaded"
        );
        Ok(self.clone())
    }

    /// Registers an event listener on the collection.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&Model) + Send + Sync + 'static,
    {
        self.inner.events.on(name, handler)
    }

    /// Removes listeners; see [`EventEmitter::off`].
    ///
    /// Clearing with the wildcard also drops the collection's own deletion
    /// listener, after which deleted members are no longer pruned.
    pub fn off(&self, name: &str, id: Option<ListenerId>) -> usize {
        self.inner.events.off(name, id)
    }

    /// Emits an event on the collection.
    pub fn emit(&self, name: &str, model: &Model) -> usize {
        self.inner.events.emit(name, model)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Collection")
            .field("resource", &self.resource().name())
            .field("endpoint", &self.inner.kind.endpoint())
            .field("len", &state.members.len())
            .field("query", &state.query)
            .finish()
    }
}

/// Builder for [`Collection`]. A client and either a resource or a
/// collection type are required.
#[derive(Default)]
pub struct CollectionBuilder {
    resource: Option<Arc<dyn Resource>>,
    kind: Option<Arc<dyn CollectionType>>,
    client: Option<Arc<dyn HttpClient>>,
    endpoint: Option<String>,
}

impl CollectionBuilder {
    /// Sets the element resource.
    pub fn resource(mut self, resource: Arc<dyn Resource>) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Sets the collection type; its resource becomes the element resource.
    pub fn collection_type(mut self, kind: Arc<dyn CollectionType>) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the HTTP client.
    pub fn client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the listing endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Builds the collection.
    pub fn build(self) -> Result<Collection, ConfigError> {
        let kind: Arc<dyn CollectionType> = match (self.kind, self.resource) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingResource),
            (Some(kind), None) => kind,
            (None, Some(resource)) => Arc::new(CollectionDef::new(resource)),
            (None, None) => return Err(ConfigError::MissingResource),
        };
        let client = self.client.ok_or(ConfigError::MissingClient)?;
        let kind = match self.endpoint {
            Some(endpoint) if endpoint.trim().is_empty() => {
                return Err(ConfigError::InvalidEndpoint(endpoint))
            }
            Some(endpoint) => ExtendedCollection::new(kind).endpoint(endpoint).build(),
            None => kind,
        };
        Ok(Collection::assemble(kind, client))
    }
}
