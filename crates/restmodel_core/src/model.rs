//! A single REST entity with dirty tracking and a sync state machine.

use crate::error::{SyncError, SyncResult};
use crate::events::{self, EventEmitter, ListenerId};
use crate::id::ModelId;
use crate::resource::{Attributes, Resource};
use crate::sync::{SyncEngine, SyncOptions, SyncState, SyncVerb};
use crate::transport::{HttpClient, HttpRequest, HttpResponse};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a model.
///
/// Cloning is cheap and yields another handle to the same instance. Equality
/// is instance identity, not attribute equality.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    resource: Arc<dyn Resource>,
    client: Arc<dyn HttpClient>,
    state: Mutex<ModelState>,
    events: EventEmitter<Model>,
}

#[derive(Debug, Default)]
struct ModelState {
    id: Option<ModelId>,
    attributes: Attributes,
    previous_attributes: Attributes,
    defaults: Attributes,
    sync_state: SyncState,
}

impl ModelState {
    fn fill_defaults(&mut self, defaults: &Attributes) {
        for (key, value) in defaults {
            if !self.attributes.contains_key(key) {
                self.attributes.insert(key.clone(), value.clone());
            }
        }
    }

    fn snapshot(&mut self) {
        self.previous_attributes = self.attributes.clone();
    }

    fn clear(&mut self) {
        self.id = None;
        self.attributes.clear();
        self.previous_attributes.clear();
    }
}

impl Model {
    /// Creates a new, unsaved model.
    pub fn new(resource: Arc<dyn Resource>, client: Arc<dyn HttpClient>) -> Self {
        Self::with_state(resource, client, None, Attributes::new())
    }

    /// Hydrates a model from a payload.
    ///
    /// The payload goes through [`Resource::parse`]; if the result carries the
    /// identifier key the model is considered persisted.
    pub fn from_payload(
        resource: Arc<dyn Resource>,
        client: Arc<dyn HttpClient>,
        payload: Attributes,
    ) -> Self {
        let attributes = resource.parse(payload);
        let id = attributes
            .get(resource.id_attribute())
            .and_then(ModelId::from_value);
        Self::with_state(resource, client, id, attributes)
    }

    /// Creates a reference to an existing entity that has not been loaded.
    pub fn from_id(
        resource: Arc<dyn Resource>,
        client: Arc<dyn HttpClient>,
        id: impl Into<ModelId>,
    ) -> Self {
        Self::with_state(resource, client, Some(id.into()), Attributes::new())
    }

    /// Builds a model from an arbitrary JSON value: objects hydrate as
    /// payloads, scalars as bare identifiers, `null` as a new model.
    pub fn from_value(resource: Arc<dyn Resource>, client: Arc<dyn HttpClient>, value: Value) -> Self {
        match value {
            Value::Object(payload) => Self::from_payload(resource, client, payload),
            other => match ModelId::from_value(&other) {
                Some(id) => Self::from_id(resource, client, id),
                None => Self::new(resource, client),
            },
        }
    }

    fn with_state(
        resource: Arc<dyn Resource>,
        client: Arc<dyn HttpClient>,
        id: Option<ModelId>,
        attributes: Attributes,
    ) -> Self {
        let mut state = ModelState {
            id,
            attributes,
            defaults: resource.defaults().clone(),
            ..ModelState::default()
        };
        let defaults = state.defaults.clone();
        state.fill_defaults(&defaults);
        state.snapshot();

        Self {
            inner: Arc::new(ModelInner {
                resource,
                client,
                state: Mutex::new(state),
                events: EventEmitter::new(),
            }),
        }
    }

    /// Returns the model's resource.
    pub fn resource(&self) -> &Arc<dyn Resource> {
        &self.inner.resource
    }

    /// Returns the HTTP client this model syncs through.
    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.inner.client
    }

    /// Returns the identifier, if the entity has been persisted.
    pub fn id(&self) -> Option<ModelId> {
        self.inner.state.lock().id.clone()
    }

    /// Returns true if the entity has never been persisted.
    pub fn is_new(&self) -> bool {
        self.inner.state.lock().id.is_none()
    }

    /// Returns the current sync state.
    pub fn sync_state(&self) -> SyncState {
        self.inner.state.lock().sync_state
    }

    /// Returns an attribute value.
    pub fn get(&self, attr: &str) -> Option<Value> {
        self.inner.state.lock().attributes.get(attr).cloned()
    }

    /// Sets an attribute.
    pub fn set(&self, attr: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner
            .state
            .lock()
            .attributes
            .insert(attr.into(), value.into());
        self
    }

    /// Returns a copy of the current attributes.
    pub fn attributes(&self) -> Attributes {
        self.inner.state.lock().attributes.clone()
    }

    /// Returns a copy of the last synced snapshot.
    pub fn previous_attributes(&self) -> Attributes {
        self.inner.state.lock().previous_attributes.clone()
    }

    /// Returns true if local edits differ from the last snapshot.
    pub fn has_changed(&self) -> bool {
        let state = self.inner.state.lock();
        state.attributes != state.previous_attributes
    }

    /// Returns attributes that were added or modified since the last snapshot.
    pub fn changed_attributes(&self) -> Attributes {
        let state = self.inner.state.lock();
        state
            .attributes
            .iter()
            .filter(|(key, value)| state.previous_attributes.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Discards unsaved edits.
    pub fn undo_changes(&self) -> &Self {
        let mut state = self.inner.state.lock();
        state.attributes = state.previous_attributes.clone();
        self
    }

    /// Stores `defaults` and fills in any attribute that is not already set.
    pub fn set_defaults(&self, defaults: Attributes) -> &Self {
        let mut state = self.inner.state.lock();
        state.fill_defaults(&defaults);
        state.defaults = defaults;
        self
    }

    /// Returns the defaults applied to this model.
    pub fn defaults(&self) -> Attributes {
        self.inner.state.lock().defaults.clone()
    }

    /// Runs a payload through the resource's `parse`.
    pub fn parse(&self, payload: Attributes) -> Attributes {
        self.inner.resource.parse(payload)
    }

    /// Returns the collection-level endpoint.
    pub fn root_endpoint(&self) -> String {
        self.inner.resource.endpoint_root().to_string()
    }

    /// Returns the entity endpoint, or `None` for a new model.
    pub fn endpoint(&self) -> Option<String> {
        let state = self.inner.state.lock();
        state.id.as_ref().map(|id| self.entity_url(id))
    }

    fn entity_url(&self, id: &ModelId) -> String {
        format!("{}/{}", self.inner.resource.endpoint_root(), id)
    }

    /// Persists the model: `create` when new, `save` otherwise.
    pub async fn save(&self, options: SyncOptions) -> SyncResult<Model> {
        let verb = if self.is_new() {
            SyncVerb::Create
        } else {
            SyncVerb::Save
        };
        SyncEngine::execute(self, verb, options).await
    }

    /// Refreshes the model from the server. New models resolve immediately.
    pub async fn load(&self, options: SyncOptions) -> SyncResult<Model> {
        if self.is_new() {
            return Ok(self.clone());
        }
        SyncEngine::execute(self, SyncVerb::Load, options).await
    }

    /// Deletes the model.
    ///
    /// New models are cleared locally without a request. Either way the
    /// `delete` event fires once the model is gone.
    pub async fn delete(&self, options: SyncOptions) -> SyncResult<Model> {
        if self.is_new() {
            if self.sync_state().is_in_flight() {
                return Ok(self.clone());
            }
            self.inner.state.lock().clear();
            self.emit(events::DELETE);
            return Ok(self.clone());
        }
        SyncEngine::execute(self, SyncVerb::Delete, options).await
    }

    /// Registers an event listener on this model.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&Model) + Send + Sync + 'static,
    {
        self.inner.events.on(name, handler)
    }

    /// Removes listeners; see [`EventEmitter::off`].
    pub fn off(&self, name: &str, id: Option<ListenerId>) -> usize {
        self.inner.events.off(name, id)
    }

    /// Emits an event with this model as the argument.
    pub fn emit(&self, name: &str) -> usize {
        self.inner.events.emit(name, self)
    }

    /// Returns the model's event emitter.
    pub fn events(&self) -> &EventEmitter<Model> {
        &self.inner.events
    }

    /// Returns true if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Marks the model in flight and builds the request for `verb`.
    ///
    /// Returns `Ok(None)` when another request is already outstanding.
    pub(crate) fn begin_sync(&self, verb: SyncVerb) -> SyncResult<Option<HttpRequest>> {
        let mut state = self.inner.state.lock();
        if state.sync_state.is_in_flight() {
            return Ok(None);
        }

        let url = if verb.targets_root() {
            self.inner.resource.endpoint_root().to_string()
        } else {
            match &state.id {
                Some(id) => self.entity_url(id),
                None => {
                    return Err(SyncError::Protocol(format!(
                        "cannot {verb} a model without an identifier"
                    )))
                }
            }
        };

        let mut request = HttpRequest::new(verb.method(), url);
        if verb.sends_body() {
            request = request.with_body(Value::Object(state.attributes.clone()));
        }

        state.sync_state = SyncState::InFlight;
        Ok(Some(request))
    }

    /// Returns the model to `Idle` without touching attributes or identifier.
    pub(crate) fn abandon_sync(&self) {
        self.inner.state.lock().sync_state = SyncState::Idle;
    }

    /// Returns the model to `Idle` and folds a successful response into it.
    ///
    /// Failures leave attributes and identifier untouched.
    pub(crate) fn finish_sync(
        &self,
        verb: SyncVerb,
        outcome: SyncResult<HttpResponse>,
    ) -> SyncResult<HttpResponse> {
        let mut state = self.inner.state.lock();
        state.sync_state = SyncState::Idle;
        let response = outcome?;

        if verb == SyncVerb::Delete {
            state.clear();
            return Ok(response);
        }

        match &response.body {
            Value::Object(body) => {
                state.attributes = self.inner.resource.parse(body.clone());
                state.snapshot();
                if let Some(id) = body
                    .get(self.inner.resource.id_attribute())
                    .and_then(ModelId::from_value)
                {
                    state.id = Some(id);
                }
            }
            // Empty body: the server accepted what we sent.
            Value::Null => state.snapshot(),
            other => {
                return Err(SyncError::Protocol(format!(
                    "expected an object body for {verb}, got {}",
                    json_kind(other)
                )))
            }
        }

        Ok(response)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Model")
            .field("resource", &self.inner.resource.name())
            .field("id", &state.id)
            .field("attributes", &state.attributes)
            .field("sync_state", &state.sync_state)
            .finish()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.state.lock().attributes.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::resource::ResourceDef;
    use crate::transport::{HttpMethod, MockClient};
    use serde_json::json;

    fn widgets() -> Arc<dyn Resource> {
        Arc::new(ResourceDef::new("widget", "/api/widgets"))
    }

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn setup() -> (Arc<MockClient>, Arc<dyn HttpClient>) {
        let mock = Arc::new(MockClient::new());
        let client: Arc<dyn HttpClient> = mock.clone();
        (mock, client)
    }

    #[test]
    fn construct_from_payload() {
        let (_, client) = setup();
        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 7, "name": "x"})));

        assert_eq!(model.id(), Some(ModelId::Int(7)));
        assert!(!model.is_new());
        assert_eq!(model.get("name"), Some(json!("x")));
        assert_eq!(model.get("missing"), None);
    }

    #[test]
    fn construct_from_bare_id() {
        let (_, client) = setup();
        let model = Model::from_id(widgets(), client, 7);

        assert_eq!(model.id(), Some(ModelId::Int(7)));
        assert!(model.attributes().is_empty());
        assert_eq!(model.endpoint().as_deref(), Some("/api/widgets/7"));
    }

    #[test]
    fn new_model_has_no_endpoint() {
        let (_, client) = setup();
        let model = Model::new(widgets(), client);

        assert!(model.is_new());
        assert_eq!(model.id(), None);
        assert_eq!(model.endpoint(), None);
        assert_eq!(model.root_endpoint(), "/api/widgets");
    }

    #[test]
    fn custom_id_attribute() {
        let (_, client) = setup();
        let resource: Arc<dyn Resource> =
            Arc::new(ResourceDef::new("user", "/users").with_id_attribute("uuid"));
        let model = Model::from_payload(resource, client, attrs(json!({"uuid": "u-1", "ID": 9})));

        assert_eq!(model.id(), Some(ModelId::from("u-1")));
    }

    #[test]
    fn set_is_chainable_and_tracks_changes() {
        let (_, client) = setup();
        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 1, "name": "a"})));

        model.set("name", "b").set("color", "red");
        assert!(model.has_changed());
        assert_eq!(
            model.changed_attributes(),
            attrs(json!({"name": "b", "color": "red"}))
        );

        model.undo_changes();
        assert!(!model.has_changed());
        assert_eq!(model.get("name"), Some(json!("a")));
        assert_eq!(model.get("color"), None);
        assert_eq!(model.id(), Some(ModelId::Int(1)));
    }

    #[test]
    fn resource_defaults_fill_missing_attributes() {
        let (_, client) = setup();
        let resource: Arc<dyn Resource> = Arc::new(
            ResourceDef::new("widget", "/api/widgets")
                .with_default("color", "red")
                .with_default("size", 1),
        );
        let model = Model::from_payload(resource, client, attrs(json!({"size": 5})));

        assert_eq!(model.get("color"), Some(json!("red")));
        assert_eq!(model.get("size"), Some(json!(5)));
        assert!(!model.has_changed());
    }

    #[test]
    fn set_defaults_after_construction() {
        let (_, client) = setup();
        let model = Model::new(widgets(), client);
        model.set("a", 1);
        model.set_defaults(attrs(json!({"a": 2, "b": 3})));

        assert_eq!(model.get("a"), Some(json!(1)));
        assert_eq!(model.get("b"), Some(json!(3)));
        assert_eq!(model.defaults(), attrs(json!({"a": 2, "b": 3})));
    }

    #[test]
    fn equality_is_identity() {
        let (_, client) = setup();
        let a = Model::from_id(widgets(), Arc::clone(&client), 1);
        let b = Model::from_id(widgets(), client, 1);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_attributes() {
        let (_, client) = setup();
        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 2, "n": "z"})));
        assert_eq!(serde_json::to_value(&model).unwrap(), json!({"ID": 2, "n": "z"}));
    }

    #[tokio::test]
    async fn save_new_model_posts_to_root() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": 11, "name": "w"})));

        let model = Model::new(widgets(), client);
        model.set("name", "w");
        model.save(SyncOptions::default()).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "/api/widgets");
        assert_eq!(request.body, Some(json!({"name": "w"})));
        assert_eq!(model.id(), Some(ModelId::Int(11)));
        assert_eq!(model.sync_state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn save_existing_model_puts_to_entity() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": 3, "name": "server"})));

        let model = Model::from_id(widgets(), client, 3);
        model.set("name", "local");
        model.save(SyncOptions::default()).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.url, "/api/widgets/3");
        assert_eq!(request.body, Some(json!({"name": "local"})));
        assert_eq!(model.get("name"), Some(json!("server")));
        assert_eq!(model.previous_attributes(), model.attributes());
    }

    #[tokio::test]
    async fn response_without_id_keeps_identifier() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"name": "renamed"})));

        let model = Model::from_id(widgets(), client, 5);
        model.load(SyncOptions::default()).await.unwrap();

        assert_eq!(model.id(), Some(ModelId::Int(5)));
        assert_eq!(model.get("name"), Some(json!("renamed")));
    }

    #[tokio::test]
    async fn null_id_in_response_keeps_identifier() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": null, "name": "x"})));

        let model = Model::from_id(widgets(), client, 5);
        model.save(SyncOptions::default()).await.unwrap();

        assert_eq!(model.id(), Some(ModelId::Int(5)));
        assert_eq!(model.get("ID"), Some(Value::Null));
    }

    #[tokio::test]
    async fn null_body_snapshots_sent_attributes() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::no_content());

        let model = Model::from_id(widgets(), client, 5);
        model.set("name", "kept");
        model.save(SyncOptions::default()).await.unwrap();

        assert!(!model.has_changed());
        assert_eq!(model.get("name"), Some(json!("kept")));
    }

    #[tokio::test]
    async fn load_new_model_skips_network() {
        let (mock, client) = setup();
        let model = Model::new(widgets(), client);

        model.load(SyncOptions::default()).await.unwrap();
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn undo_after_sync_restores_snapshot() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": 4, "name": "synced"})));

        let model = Model::from_id(widgets(), client, 4);
        model.load(SyncOptions::default()).await.unwrap();
        model.set("name", "edited").set("extra", true);
        model.undo_changes();

        assert_eq!(model.attributes(), attrs(json!({"ID": 4, "name": "synced"})));
        assert_eq!(model.id(), Some(ModelId::Int(4)));
    }

    #[tokio::test]
    async fn failed_sync_leaves_attributes_untouched() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::new(500, json!({"error": "boom"})));

        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 2, "name": "a"})));
        model.set("name", "b");

        let errors = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&errors);
        model.on(events::ERROR, move |_| *counter.lock() += 1);

        let err = model.save(SyncOptions::default()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(model.get("name"), Some(json!("b")));
        assert_eq!(model.previous_attributes(), attrs(json!({"ID": 2, "name": "a"})));
        assert_eq!(model.sync_state(), SyncState::Idle);
        assert_eq!(*errors.lock(), 1);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_to_caller() {
        let (mock, client) = setup();
        mock.push_error(TransportError::Timeout);

        let model = Model::from_id(widgets(), client, 2);
        let err = model.load(SyncOptions::default()).await.unwrap_err();

        assert!(matches!(err, SyncError::Transport(TransportError::Timeout)));
        assert!(model.attributes().is_empty());
    }

    #[tokio::test]
    async fn non_object_body_is_protocol_error() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!([1, 2])));

        let model = Model::from_id(widgets(), client, 2);
        let err = model.load(SyncOptions::default()).await.unwrap_err();

        assert!(matches!(err, SyncError::Protocol(_)));
        assert_eq!(model.sync_state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn sync_event_fires_on_success() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": 1})));

        let model = Model::from_id(widgets(), client, 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        model.on(events::SYNC, move |m| sink.lock().push(m.id()));

        model.load(SyncOptions::default()).await.unwrap();
        assert_eq!(*seen.lock(), vec![Some(ModelId::Int(1))]);
    }

    #[tokio::test]
    async fn on_complete_runs_for_success_and_failure() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::ok(json!({"ID": 1})));
        mock.push_response(HttpResponse::new(404, Value::Null));

        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outcomes);
        let options = SyncOptions::new().on_complete(move |_, result| {
            sink.lock().push(result.is_ok());
        });

        let model = Model::from_id(widgets(), client, 1);
        model.load(options.clone()).await.unwrap();
        model.load(options).await.unwrap_err();

        assert_eq!(*outcomes.lock(), vec![true, false]);
    }

    #[tokio::test]
    async fn delete_persisted_model() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::no_content());

        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 8, "name": "gone"})));
        let deletes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&deletes);
        model.on(events::DELETE, move |_| *counter.lock() += 1);

        model.delete(SyncOptions::default()).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.url, "/api/widgets/8");
        assert!(model.is_new());
        assert!(model.attributes().is_empty());
        assert!(model.previous_attributes().is_empty());
        assert_eq!(*deletes.lock(), 1);
    }

    #[tokio::test]
    async fn delete_new_model_is_local() {
        let (mock, client) = setup();
        let model = Model::new(widgets(), client);
        model.set("draft", true);

        let deletes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&deletes);
        model.on(events::DELETE, move |_| *counter.lock() += 1);

        model.delete(SyncOptions::default()).await.unwrap();

        assert_eq!(mock.request_count(), 0);
        assert!(model.attributes().is_empty());
        assert_eq!(*deletes.lock(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_model() {
        let (mock, client) = setup();
        mock.push_response(HttpResponse::new(409, Value::Null));

        let model = Model::from_payload(widgets(), client, attrs(json!({"ID": 8})));
        let deletes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&deletes);
        model.on(events::DELETE, move |_| *counter.lock() += 1);

        assert!(model.delete(SyncOptions::default()).await.is_err());
        assert_eq!(model.id(), Some(ModelId::Int(8)));
        assert_eq!(*deletes.lock(), 0);
    }

    #[tokio::test]
    async fn dropped_sync_returns_to_idle() {
        let (mock, client) = setup();
        mock.pause();
        mock.push_response(HttpResponse::ok(json!({"ID": 6, "name": "loaded"})));

        let model = Model::from_id(widgets(), client, 6);
        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            model.load(SyncOptions::default()),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(model.sync_state(), SyncState::Idle);
        assert!(model.attributes().is_empty());

        mock.release(1);
        model.load(SyncOptions::default()).await.unwrap();

        assert_eq!(mock.request_count(), 2);
        assert_eq!(model.get("name"), Some(json!("loaded")));
        assert_eq!(model.sync_state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn aborted_task_releases_in_flight_state() {
        let (mock, client) = setup();
        mock.pause();

        let model = Model::from_id(widgets(), client, 6);
        let pending = tokio::spawn({
            let model = model.clone();
            async move { model.load(SyncOptions::default()).await }
        });
        while mock.request_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(model.sync_state(), SyncState::InFlight);

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        assert_eq!(model.sync_state(), SyncState::Idle);
    }

    #[tokio::test]
    async fn in_flight_sync_short_circuits() {
        let (mock, client) = setup();
        mock.pause();
        mock.push_response(HttpResponse::ok(json!({"ID": 6, "name": "loaded"})));

        let model = Model::from_id(widgets(), client, 6);
        let pending = tokio::spawn({
            let model = model.clone();
            async move { model.load(SyncOptions::default()).await }
        });

        while mock.request_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(model.sync_state(), SyncState::InFlight);

        let same = model.save(SyncOptions::default()).await.unwrap();
        assert!(same.ptr_eq(&model));
        model.delete(SyncOptions::default()).await.unwrap();
        assert_eq!(mock.request_count(), 1);
        assert_eq!(model.sync_state(), SyncState::InFlight);

        mock.release(1);
        pending.await.unwrap().unwrap();

        assert_eq!(model.sync_state(), SyncState::Idle);
        assert_eq!(model.get("name"), Some(json!("loaded")));
    }
}
