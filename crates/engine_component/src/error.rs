//! Component access error types.

/// Errors raised by non-optional component accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// A required component was not present in the set.
    #[error("component {0} is not present")]
    Missing(&'static str),

    /// The set already holds a component of this type.
    #[error("component {0} is already present")]
    Duplicate(&'static str),

    /// Two different Rust types report the same component name, so they
    /// share a type identifier.
    #[error("component name {0} is used by two different types")]
    TypeCollision(&'static str),
}
