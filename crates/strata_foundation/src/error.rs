//! Error types for the Strata system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::Entity;

/// The main error type for Strata operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity: Entity) -> Self {
        Self::new(ErrorKind::EntityNotFound(entity))
    }

    /// Creates a component not found error.
    #[must_use]
    pub fn component_not_found(entity: Entity, component: &'static str) -> Self {
        Self::new(ErrorKind::ComponentNotFound { entity, component })
    }

    /// Creates an out-of-bounds row access error.
    #[must_use]
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds { index, length })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a capacity limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: CapacityLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal invariant error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error reports a missing entity or component.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::EntityNotFound(_) | ErrorKind::ComponentNotFound { .. }
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity does not exist in the world.
    #[error("entity not found: {0:?}")]
    EntityNotFound(Entity),

    /// Component not present on an entity.
    #[error("component not found: {component} on entity {entity:?}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: Entity,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Row index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The row that was accessed.
        index: usize,
        /// The actual length of the column.
        length: usize,
    },

    /// A type-erased column was handed a value of the wrong type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The column's element type.
        expected: &'static str,
        /// The type that was supplied.
        actual: &'static str,
    },

    /// A configured capacity bound would be exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(CapacityLimit),

    /// A reference handle was requested from a world that does not track references.
    #[error("reference tracking is disabled for this world")]
    ReferencesDisabled,

    /// A mutable query named the same component type more than once.
    #[error("component {0} requested more than once in a mutable query")]
    DuplicateQueryComponent(&'static str),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Capacity bounds that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityLimit {
    /// Too many component types in one archetype.
    MaxComponentsPerArchetype {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxComponentsPerArchetype { limit } => {
                write!(f, "max components per archetype ({limit}) exceeded")
            }
        }
    }
}

/// Result type for Strata operations.
pub type Result<T> = std::result::Result<T, Error>;
