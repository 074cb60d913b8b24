//! Strata - Archetype-based entity-component storage
//!
//! This crate re-exports both layers of the Strata system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: strata_storage    — Archetypes, columns, queries, references
//! Layer 0: strata_foundation — Core types (Entity, ComponentId, Signal, Error)
//! ```
//!
//! # Example
//!
//! ```
//! use strata::World;
//!
//! struct Position(f32, f32);
//! struct Velocity(f32, f32);
//!
//! let mut world = World::new();
//! let e = world.create();
//! world.insert_component(e, Position(0.0, 0.0));
//! world.insert_component(e, Velocity(1.0, 2.0));
//!
//! for (_, position, velocity) in world.iter_mut::<(Position, Velocity)>().unwrap() {
//!     position.0 += velocity.0;
//!     position.1 += velocity.1;
//! }
//!
//! let position = world.get_component::<Position>(e).unwrap();
//! assert_eq!((position.0, position.1), (1.0, 2.0));
//! ```

pub use strata_foundation as foundation;
pub use strata_storage as storage;

pub use strata_foundation::{Component, ComponentId, Entity, Error, ErrorKind, Result, Signal};
pub use strata_storage::{Ref, World, WorldConfig};
