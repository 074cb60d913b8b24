//! Archetype storage, queries, and stable references for Strata.
//!
//! This crate provides:
//! - [`World`] - Entity directory, archetype table, and removal signals
//! - [`Archetype`] / [`Column`] - Dense per-type component columns
//! - [`Signature`] / [`FastSignature`] - Exact and bitset component sets
//! - [`Query`] / [`QueryMut`] - Typed iteration over matching archetypes
//! - [`Ref`] - Component handles that survive row moves
//! - [`WorldConfig`] - Tuning and feature switches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod archetype;
pub mod column;
pub mod config;
pub mod query;
pub mod reference;
pub mod signature;
pub mod world;

pub use archetype::{Archetype, Migration, OnRemoveSignals, RowRemoval};
pub use column::{Column, TypedColumn};
pub use config::WorldConfig;
pub use query::{ComponentSet, Query, QueryIter, QueryIterMut, QueryMut};
pub use reference::{Ref, ReferenceTable, SlotKey};
pub use signature::{FastSignature, Signature};
pub use world::{World, WorldId};
