//! # engine_component
//!
//! The "C" in ECS: defines what a component is, how entities are identified,
//! and how component requirements are expressed.
//!
//! This crate provides:
//!
//! - [`Component`] trait, the contract all ECS data must satisfy.
//! - [`ComponentTypeId`] / [`GenericTypeId`], closed and open type identity.
//! - [`Entity`], 128-bit entity identifiers.
//! - [`ComponentSet`] / [`TypeSet`], immutable per-entity snapshots.
//! - [`QueryDescriptor`], declarative component requirements for queries.

pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod set;

pub use component::{Component, ComponentInfo, ComponentTypeId, GenericTypeId};
pub use entity::Entity;
pub use error::ComponentError;
pub use query::{QueryDescriptor, TypeFilter};
pub use set::{Bundle, ComponentSet, StoredComponent, TypeSet};
