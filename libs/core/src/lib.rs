//! Core contracts for the verdin edge data layer.
//!
//! This crate holds the dependency-light building blocks shared by every
//! backend: entity models, object identifiers, and timestamp helpers.
//! Nothing here knows about storage; the `verdin_db` crate maps these
//! models onto a primitive key-value keyspace.

pub mod id;
pub mod models;
pub mod time;

pub use id::{IdError, ObjectId};
pub use time::timestamp_ms;
