//! Per-collection configuration and derivation.
//!
//! A [`CollectionType`] decides where a collection lists from and how each
//! listed item becomes a member model. [`CollectionDef`] is the plain base;
//! [`ExtendedCollection`] derives from any parent the same way
//! [`Extended`](crate::Extended) derives resources.

use crate::model::Model;
use crate::resource::Resource;
use crate::transport::HttpClient;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Collection behaviour that can be overridden per type.
pub trait CollectionType: Send + Sync {
    /// Returns the base configuration every other member defaults to.
    fn base(&self) -> &CollectionDef;

    /// Element resource of the members.
    fn resource(&self) -> &Arc<dyn Resource> {
        self.base().resource()
    }

    /// Listing endpoint, without query string.
    fn endpoint(&self) -> &str {
        self.base().endpoint()
    }

    /// Turns one listed item into a member.
    fn build_member(&self, client: &Arc<dyn HttpClient>, item: Value) -> Model {
        Model::from_value(Arc::clone(self.resource()), Arc::clone(client), item)
    }
}

/// Plain collection configuration: an element resource and an optional
/// listing endpoint that replaces the resource root.
#[derive(Clone)]
pub struct CollectionDef {
    resource: Arc<dyn Resource>,
    endpoint: Option<String>,
}

impl CollectionDef {
    /// Lists `resource` models from the resource root.
    pub fn new(resource: Arc<dyn Resource>) -> Self {
        Self {
            resource,
            endpoint: None,
        }
    }

    /// Lists from `endpoint` instead of the resource root.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the element resource.
    pub fn resource(&self) -> &Arc<dyn Resource> {
        &self.resource
    }

    /// Returns the listing endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.resource.endpoint_root())
    }

    /// Starts a derivation of this definition.
    pub fn extend(self) -> ExtendedCollection {
        ExtendedCollection::new(Arc::new(self))
    }
}

impl CollectionType for CollectionDef {
    fn base(&self) -> &CollectionDef {
        self
    }
}

impl fmt::Debug for CollectionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionDef")
            .field("resource", &self.resource.name())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

type BuildMemberFn =
    Arc<dyn Fn(&dyn CollectionType, &Arc<dyn HttpClient>, Value) -> Model + Send + Sync>;

/// A collection type derived from a parent, overriding selected members.
///
/// Member construction overrides get the parent as their first argument:
///
/// ```
/// use restmodel_core::{CollectionDef, CollectionType, ResourceDef};
/// use std::sync::Arc;
///
/// let derived = CollectionDef::new(Arc::new(ResourceDef::new("post", "/api/posts")))
///     .extend()
///     .endpoint("/api/posts/recent")
///     .build_member(|parent, client, item| {
///         let post = parent.build_member(client, item);
///         post.set("listed", true);
///         post
///     });
/// assert_eq!(derived.parent().endpoint(), "/api/posts");
///
/// let recent = derived.build();
/// assert_eq!(recent.endpoint(), "/api/posts/recent");
/// ```
pub struct ExtendedCollection {
    parent: Arc<dyn CollectionType>,
    endpoint: Option<String>,
    build_member: Option<BuildMemberFn>,
}

impl ExtendedCollection {
    /// Starts a derivation of `parent` with no overrides.
    pub fn new(parent: Arc<dyn CollectionType>) -> Self {
        Self {
            parent,
            endpoint: None,
            build_member: None,
        }
    }

    /// Overrides the listing endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Overrides member construction.
    pub fn build_member<F>(mut self, build_member: F) -> Self
    where
        F: Fn(&dyn CollectionType, &Arc<dyn HttpClient>, Value) -> Model + Send + Sync + 'static,
    {
        self.build_member = Some(Arc::new(build_member));
        self
    }

    /// Finishes the derivation.
    pub fn build(self) -> Arc<dyn CollectionType> {
        Arc::new(self)
    }

    /// Returns the parent type.
    pub fn parent(&self) -> &Arc<dyn CollectionType> {
        &self.parent
    }
}

impl CollectionType for ExtendedCollection {
    fn base(&self) -> &CollectionDef {
        self.parent.base()
    }

    fn resource(&self) -> &Arc<dyn Resource> {
        self.parent.resource()
    }

    fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.parent.endpoint())
    }

    fn build_member(&self, client: &Arc<dyn HttpClient>, item: Value) -> Model {
        match &self.build_member {
            Some(build) => build(self.parent.as_ref(), client, item),
            None => self.parent.build_member(client, item),
        }
    }
}

impl fmt::Debug for ExtendedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedCollection")
            .field("parent_endpoint", &self.parent.endpoint())
            .field("endpoint", &self.endpoint)
            .field("overrides_build_member", &self.build_member.is_some())
            .finish()
    }
}
