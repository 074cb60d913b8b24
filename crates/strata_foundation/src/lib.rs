//! Core types for Strata.
//!
//! This crate provides:
//! - [`Entity`] - Monotonic entity identifiers with a reserved null value
//! - [`ComponentId`] / [`TypeRegistry`] - Per-type component ids assigned on first use
//! - [`Signal`] - Identity-deduplicated multi-subscriber dispatch
//! - [`Error`] - Error types shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod entity;
pub mod error;
pub mod signal;

pub use component::{Component, ComponentId, ComponentInfo, TypeRegistry, component_info};
pub use entity::{Entity, EntityAllocator};
pub use error::{CapacityLimit, Error, ErrorKind, Result};
pub use signal::Signal;
