//! Test fixtures and backend helpers.
//!
//! Provides a ready-made widget resource and an in-memory backend wired up
//! as the HTTP client for models and collections.

use crate::server::InMemoryServer;
use restmodel_core::{Attributes, Collection, HttpClient, Model, Resource, ResourceDef};
use serde_json::Value;
use std::sync::Arc;

/// Endpoint root used by [`widget_resource`].
pub const WIDGETS: &str = "/api/widgets";

/// A plain resource rooted at [`WIDGETS`].
pub fn widget_resource() -> Arc<dyn Resource> {
    Arc::new(ResourceDef::new("widget", WIDGETS))
}

/// Converts a JSON object literal into attributes.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A backend plus the resource under test.
pub struct TestBackend {
    /// The in-memory server.
    pub server: Arc<InMemoryServer>,
    /// The resource models are created with.
    pub resource: Arc<dyn Resource>,
}

impl TestBackend {
    /// Creates a backend with the widget resource registered.
    pub fn widgets() -> Self {
        Self::with_resource(widget_resource())
    }

    /// Creates a backend for an arbitrary resource.
    pub fn with_resource(resource: Arc<dyn Resource>) -> Self {
        let server = Arc::new(InMemoryServer::with_id_attribute(resource.id_attribute()));
        server.register(resource.endpoint_root());
        Self { server, resource }
    }

    /// Returns the server as a client handle.
    pub fn client(&self) -> Arc<dyn HttpClient> {
        self.server.clone()
    }

    /// Seeds `count` records named `item-0`, `item-1`, ...
    pub fn seeded(self, count: usize) -> Self {
        for i in 0..count {
            let mut record = Attributes::new();
            record.insert("name".into(), Value::from(format!("item-{i}")));
            record.insert("index".into(), Value::from(i));
            self.server.seed(self.resource.endpoint_root(), record);
        }
        self
    }

    /// Creates a new model.
    pub fn new_model(&self) -> Model {
        Model::new(Arc::clone(&self.resource), self.client())
    }

    /// Hydrates a model from a payload.
    pub fn model(&self, payload: Value) -> Model {
        Model::from_payload(Arc::clone(&self.resource), self.client(), attrs(payload))
    }

    /// Creates a reference to an existing record.
    pub fn model_ref(&self, id: i64) -> Model {
        Model::from_id(Arc::clone(&self.resource), self.client(), id)
    }

    /// Creates an empty collection of the resource.
    pub fn collection(&self) -> Collection {
        Collection::new(Arc::clone(&self.resource), self.client())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeded_backend() {
        let backend = TestBackend::widgets().seeded(3);
        assert_eq!(backend.server.count(WIDGETS), 3);
        assert_eq!(
            backend.server.record(WIDGETS, 2).unwrap().get("name"),
            Some(&json!("item-1"))
        );
    }

    #[test]
    fn models_share_the_backend() {
        let backend = TestBackend::widgets();
        let model = backend.model(json!({"ID": 1, "name": "a"}));
        assert_eq!(model.root_endpoint(), WIDGETS);
        assert!(!model.is_new());
        assert!(backend.new_model().is_new());
    }
}
