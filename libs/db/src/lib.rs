//! Document-database behavior over a primitive key-value store.
//!
//! The store underneath speaks four shapes (blobs, sorted sets, sets,
//! hashes) and nothing else; this crate synthesizes collections,
//! secondary indexes, business-key uniqueness, reference integrity,
//! and delete cascades on top of it.
//!
//! Entry point is [`Client`], which owns a connection pool and
//! implements every contract trait in [`provider`]. The key layout in
//! [`schema`] is the stable compatibility surface: another process
//! using the same layout reads the same data.

pub mod kv;
pub mod provider;
pub mod schema;

mod client;
mod document;
mod error;
mod mutation;
mod ops;
mod query;
mod records;
mod resolver;

pub use client::{Client, ClientConfig};
pub use error::{Error, Result};
pub use provider::{
    CoreDataStore, DataStore, ExportStore, MetadataStore, NotificationsStore, SchedulerStore,
};
