//! Component type identifiers.
//!
//! Every component type gets a small integer id the first time it is seen.
//! Ids are handed out by a [`TypeRegistry`]: the process-wide instance behind
//! [`ComponentId::of`] is created lazily on first use and is the only global
//! mutable state in Strata. Ids are unique per type within one run; their
//! exact numbering depends on first-use order and is not stable across runs.

use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Marker trait for types that can be stored as components.
///
/// Implemented for every `'static` type.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Numeric identifier of a component type.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Returns the id of `T` in the process-wide registry, registering it on first use.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        let key = TypeId::of::<T>();
        if let Some(id) = LOCAL_IDS.with(|ids| ids.borrow().get(&key).copied()) {
            return id;
        }
        let id = TypeRegistry::with_global(TypeRegistry::id_of::<T>);
        LOCAL_IDS.with(|ids| ids.borrow_mut().insert(key, id));
        id
    }

    /// Creates a component id from a raw index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Metadata recorded when a component type is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Assigned id.
    pub id: ComponentId,
    /// Rust type name, for diagnostics.
    pub name: &'static str,
    /// `size_of` the component type.
    pub size: usize,
}

impl ComponentInfo {
    /// Describes `T` under the given id.
    #[must_use]
    pub fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            name: type_name::<T>(),
            size: size_of::<T>(),
        }
    }
}

/// Assigns component ids in first-use order.
///
/// Most code goes through [`ComponentId::of`], which uses the global
/// registry. A standalone registry can be created for isolated numbering.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    ids: HashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

static GLOBAL: OnceLock<Mutex<TypeRegistry>> = OnceLock::new();

thread_local! {
    // Read-through cache in front of GLOBAL; entries never change once assigned.
    static LOCAL_IDS: RefCell<HashMap<TypeId, ComponentId>> = RefCell::new(HashMap::new());
}

impl TypeRegistry {
    /// Creates an empty registry; the first id it assigns is `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the process-wide registry.
    pub fn with_global<R>(f: impl FnOnce(&mut TypeRegistry) -> R) -> R {
        let registry = GLOBAL.get_or_init(|| Mutex::new(TypeRegistry::new()));
        // Registration never leaves the map half-updated, so a poisoned lock is still usable.
        let mut guard = registry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Returns the id for `T`, assigning the next free id on first use.
    ///
    /// # Panics
    ///
    /// Panics if every `u32` id has already been handed out.
    pub fn id_of<T: Component>(&mut self) -> ComponentId {
        if let Some(id) = self.ids.get(&TypeId::of::<T>()) {
            return *id;
        }
        let index = next_index(self.infos.len());
        let id = ComponentId(index);
        self.ids.insert(TypeId::of::<T>(), id);
        self.infos.push(ComponentInfo::of::<T>(id));
        tracing::trace!(component = type_name::<T>(), id = index, "registered component type");
        id
    }

    /// Returns the id for `T` if it has been registered.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the metadata recorded for `id`.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.0 as usize)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

fn next_index(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(index) if index < u32::MAX => index,
        _ => panic!("component id space exhausted after {len} types"),
    }
}

/// Looks up the metadata of `id` in the global registry.
#[must_use]
pub fn component_info(id: ComponentId) -> Option<ComponentInfo> {
    TypeRegistry::with_global(|registry| registry.info(id).copied())
}
