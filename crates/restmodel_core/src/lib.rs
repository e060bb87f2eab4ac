//! # restmodel core
//!
//! Active-record style models and collections synchronized with a REST
//! backend.
//!
//! This crate provides:
//! - `Model`: an entity with identity, attributes, dirty tracking and a sync
//!   state machine (idle → in flight → idle)
//! - `Collection`: an ordered group of models loaded from a listing endpoint
//! - `SyncEngine`: verb → HTTP method/URL mapping and response reconciliation
//! - `EventEmitter`: named listeners shared by models and collections
//! - `Resource`: the per-type configuration (endpoint, id key, defaults, parse)
//! - `CollectionType`: the per-collection configuration (endpoint, member
//!   construction)
//! - `HttpClient`: the transport abstraction
//!
//! ## Protocol
//!
//! | verb   | method | URL           |
//! |--------|--------|---------------|
//! | load   | GET    | `{root}/{id}` |
//! | save   | PUT    | `{root}/{id}` |
//! | create | POST   | `{root}`      |
//! | delete | DELETE | `{root}/{id}` |
//!
//! ## Key Invariants
//!
//! - A model with no identifier has never been created on the server
//! - At most one request is in flight per model; extra requests resolve
//!   immediately to the unchanged model
//! - Failed requests never overwrite attributes
//! - The last successful response wins
//! - Collections learn about deletions only through model events

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod collection_type;
mod error;
pub mod events;
mod id;
mod model;
mod query;
mod resource;
mod sync;
mod transport;

pub use collection::{Collection, CollectionBuilder};
pub use collection_type::{CollectionDef, CollectionType, ExtendedCollection};
pub use error::{ConfigError, SyncError, SyncResult, TransportError};
pub use events::{EventEmitter, ListenerId};
pub use id::ModelId;
pub use model::Model;
pub use query::{encode_component, QueryParams, QueryValue};
pub use resource::{Attributes, Extended, Resource, ResourceDef, DEFAULT_ID_ATTRIBUTE};
pub use sync::{SyncEngine, SyncOptions, SyncState, SyncVerb};
pub use transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MockClient};

pub use async_trait::async_trait;
