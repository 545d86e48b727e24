//! # engine_math
//!
//! Math types for the ECS runtime. Re-exports [`glam`] for linear algebra
//! and defines spatial components that implement
//! [`Component`](engine_component::Component).

pub mod motion;

pub use glam::{Vec2, Vec3};

pub use motion::{Position, Velocity};
