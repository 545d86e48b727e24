//! # engine_world
//!
//! World state storage for the ECS runtime: the concurrent [`EntityStore`]
//! and the [`ComponentIndex`] it maintains.
//!
//! The store is handed to systems as an `Arc<EntityStore>` at construction
//! time; there is no process-wide instance, so tests can build isolated
//! worlds.

pub mod error;
pub mod index;
pub mod store;

pub use error::StoreError;
pub use index::ComponentIndex;
pub use store::{EntityStore, QueryResult};
