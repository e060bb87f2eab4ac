//! # restmodel testkit
//!
//! Test utilities for restmodel.
//!
//! This crate provides:
//! - An in-memory REST backend that implements `HttpClient`
//! - Fixtures wiring models and collections to that backend
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use restmodel_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn saves_widget() {
//!     let backend = TestBackend::widgets();
//!     let widget = backend.new_model();
//!     widget.set("name", "sprocket");
//!     widget.save(Default::default()).await.unwrap();
//!     assert_eq!(backend.server.count(WIDGETS), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::server::*;
}

pub use fixtures::*;
pub use generators::*;
pub use server::*;
