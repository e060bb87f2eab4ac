//! Resource definitions: the "type" of a model.
//!
//! A [`Resource`] tells a model where it lives on the server, which payload
//! key carries its identifier, which defaults to fill in and how to reshape
//! server payloads. Specialised resources embed a [`ResourceDef`] by value and
//! override only what they need:
//!
//! ```
//! use restmodel_core::{Attributes, Resource, ResourceDef};
//!
//! struct Widget {
//!     base: ResourceDef,
//! }
//!
//! impl Resource for Widget {
//!     fn base(&self) -> &ResourceDef {
//!         &self.base
//!     }
//!
//!     fn parse(&self, mut payload: Attributes) -> Attributes {
//!         payload.remove("_links");
//!         payload
//!     }
//! }
//!
//! let widget = Widget { base: ResourceDef::new("widget", "/api/widgets") };
//! assert_eq!(widget.endpoint_root(), "/api/widgets");
//! assert_eq!(widget.id_attribute(), "ID");
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Attribute bag of a model.
pub type Attributes = Map<String, Value>;

/// Default payload key carrying the model identifier.
pub const DEFAULT_ID_ATTRIBUTE: &str = "ID";

/// Behaviour shared by every model of one type.
pub trait Resource: Send + Sync {
    /// The embedded base definition that supplies default behaviour.
    fn base(&self) -> &ResourceDef;

    /// Human-readable resource name, used in logs.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Collection-level endpoint, e.g. `/api/widgets`.
    fn endpoint_root(&self) -> &str {
        self.base().endpoint_root()
    }

    /// Payload key that carries the identifier.
    fn id_attribute(&self) -> &str {
        self.base().id_attribute()
    }

    /// Attributes filled in at construction when missing.
    fn defaults(&self) -> &Attributes {
        self.base().defaults()
    }

    /// Reshapes a server payload into model attributes. Identity by default.
    fn parse(&self, payload: Attributes) -> Attributes {
        payload
    }
}

/// Plain resource definition, usable directly or embedded in a custom type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDef {
    name: String,
    endpoint_root: String,
    id_attribute: String,
    defaults: Attributes,
}

impl ResourceDef {
    /// Creates a definition rooted at `endpoint_root`.
    pub fn new(name: impl Into<String>, endpoint_root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint_root: endpoint_root.into(),
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            defaults: Attributes::new(),
        }
    }

    /// Sets the identifier key.
    pub fn with_id_attribute(mut self, id_attribute: impl Into<String>) -> Self {
        self.id_attribute = id_attribute.into();
        self
    }

    /// Sets the defaults applied to new models.
    pub fn with_defaults(mut self, defaults: Attributes) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets a single default attribute.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection-level endpoint.
    pub fn endpoint_root(&self) -> &str {
        &self.endpoint_root
    }

    /// Returns the identifier key.
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Returns the defaults.
    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }

    /// Starts deriving a new resource from this one.
    pub fn extend(self) -> Extended {
        Extended::new(Arc::new(self))
    }
}

impl Resource for ResourceDef {
    fn base(&self) -> &ResourceDef {
        self
    }
}

type ParseFn = Arc<dyn Fn(&dyn Resource, Attributes) -> Attributes + Send + Sync>;

/// A resource derived from a parent, overriding selected members.
///
/// Anything not overridden is delegated to the parent. Parse overrides get
/// the parent as their first argument so they can build on its behaviour:
///
/// ```
/// use restmodel_core::{Resource, ResourceDef};
/// use serde_json::json;
///
/// let derived = ResourceDef::new("user", "/api/users")
///     .extend()
///     .endpoint_root("/api/admins")
///     .default("role", "admin")
///     .parse(|parent, payload| {
///         let mut attrs = parent.parse(payload);
///         attrs.insert("admin".into(), json!(true));
///         attrs
///     });
/// assert_eq!(derived.parent().endpoint_root(), "/api/users");
///
/// let admins = derived.build();
/// assert_eq!(admins.endpoint_root(), "/api/admins");
/// assert_eq!(admins.id_attribute(), "ID");
/// ```
pub struct Extended {
    parent: Arc<dyn Resource>,
    name: Option<String>,
    endpoint_root: Option<String>,
    id_attribute: Option<String>,
    defaults: Option<Attributes>,
    parse: Option<ParseFn>,
}

impl Extended {
    /// Starts a derivation of `parent` with no overrides.
    pub fn new(parent: Arc<dyn Resource>) -> Self {
        Self {
            parent,
            name: None,
            endpoint_root: None,
            id_attribute: None,
            defaults: None,
            parse: None,
        }
    }

    /// Overrides the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the collection-level endpoint.
    pub fn endpoint_root(mut self, endpoint_root: impl Into<String>) -> Self {
        self.endpoint_root = Some(endpoint_root.into());
        self
    }

    /// Overrides the identifier key.
    pub fn id_attribute(mut self, id_attribute: impl Into<String>) -> Self {
        self.id_attribute = Some(id_attribute.into());
        self
    }

    /// Adds a default on top of the parent's defaults.
    pub fn default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults
            .get_or_insert_with(|| self.parent.defaults().clone())
            .insert(key.into(), value.into());
        self
    }

    /// Overrides `parse`.
    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&dyn Resource, Attributes) -> Attributes + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Finishes the derivation.
    pub fn build(self) -> Arc<dyn Resource> {
        Arc::new(self)
    }

    /// Returns the parent resource.
    pub fn parent(&self) -> &Arc<dyn Resource> {
        &self.parent
    }
}

impl Resource for Extended {
    fn base(&self) -> &ResourceDef {
        self.parent.base()
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.parent.name())
    }

    fn endpoint_root(&self) -> &str {
        self.endpoint_root
            .as_deref()
            .unwrap_or_else(|| self.parent.endpoint_root())
    }

    fn id_attribute(&self) -> &str {
        self.id_attribute
            .as_deref()
            .unwrap_or_else(|| self.parent.id_attribute())
    }

    fn defaults(&self) -> &Attributes {
        self.defaults
            .as_ref()
            .unwrap_or_else(|| self.parent.defaults())
    }

    fn parse(&self, payload: Attributes) -> Attributes {
        match &self.parse {
            Some(parse) => parse(self.parent.as_ref(), payload),
            None => self.parent.parse(payload),
        }
    }
}

impl fmt::Debug for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extended")
            .field("parent", &self.parent.name())
            .field("name", &self.name)
            .field("endpoint_root", &self.endpoint_root)
            .field("id_attribute", &self.id_attribute)
            .field("overrides_parse", &self.parse.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn resource_def_defaults() {
        let def = ResourceDef::new("widget", "/api/widgets");
        assert_eq!(def.id_attribute(), "ID");
        assert!(def.defaults().is_empty());
        assert_eq!(def.parse(attrs(json!({"a": 1}))), attrs(json!({"a": 1})));
    }

    #[test]
    fn extended_delegates_unset_members() {
        let parent = ResourceDef::new("widget", "/api/widgets")
            .with_id_attribute("widgetId")
            .with_default("color", "red");
        let child = parent.extend().name("gadget").build();

        assert_eq!(child.name(), "gadget");
        assert_eq!(child.endpoint_root(), "/api/widgets");
        assert_eq!(child.id_attribute(), "widgetId");
        assert_eq!(child.defaults().get("color"), Some(&json!("red")));
    }

    #[test]
    fn extended_defaults_merge_with_parent() {
        let child = ResourceDef::new("widget", "/api/widgets")
            .with_default("color", "red")
            .extend()
            .default("size", 3)
            .build();

        assert_eq!(child.defaults(), &attrs(json!({"color": "red", "size": 3})));
    }

    #[test]
    fn parse_override_can_call_parent() {
        let unwrap_data = ResourceDef::new("envelope", "/api/things")
            .extend()
            .parse(|_, mut payload| match payload.remove("data") {
                Some(Value::Object(inner)) => inner,
                _ => payload,
            })
            .build();

        let tagged = Extended::new(unwrap_data)
            .parse(|parent, payload| {
                let mut out = parent.parse(payload);
                out.insert("tagged".into(), json!(true));
                out
            })
            .build();

        let parsed = tagged.parse(attrs(json!({"data": {"ID": 4}})));
        assert_eq!(parsed, attrs(json!({"ID": 4, "tagged": true})));
    }
}
