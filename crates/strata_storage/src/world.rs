//! The entity-component world.
//!
//! The `World` owns every archetype, the entity directory, the per-type
//! removal signals and, when enabled, the reference table behind [`Ref`].
//! Archetype 0 is the empty archetype: newly created entities live there
//! until they receive their first component.
//!
//! Adding or removing a component migrates the entity to the archetype whose
//! component set matches, creating that archetype on first use. Archetypes
//! are never destroyed, so archetype indices are stable for the life of the
//! world.

use std::any::type_name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use strata_foundation::{
    CapacityLimit, Component, ComponentId, Entity, EntityAllocator, Error, ErrorKind, Result,
};

use crate::archetype::{Archetype, OnRemoveSignals};
use crate::column::TypedColumn;
use crate::config::WorldConfig;
use crate::query::{
    ComponentSet, Query, QueryIter, QueryIterMut, QueryMut, duplicate_component, query_signature,
};
use crate::reference::{Ref, ReferenceTable, SharedReferenceTable, SlotKey};
use crate::signature::Signature;

const EMPTY_ARCHETYPE: usize = 0;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`World`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(u64);

impl WorldId {
    fn next() -> Self {
        Self(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a world id from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Container of entities, archetypes, and component data.
pub struct World {
    id: WorldId,
    config: WorldConfig,
    entity_ids: EntityAllocator,
    archetypes: Vec<Archetype>,
    /// Entity to archetype index.
    entities: HashMap<Entity, usize>,
    on_remove: OnRemoveSignals,
    references: Option<SharedReferenceTable>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let mut archetypes = Vec::with_capacity(config.archetype_capacity.max(1));
        archetypes.push(Archetype::empty());

        let references = config
            .track_references
            .then(|| Rc::new(RefCell::new(ReferenceTable::new())));

        let world = Self {
            id: WorldId::next(),
            entity_ids: EntityAllocator::new(),
            archetypes,
            entities: HashMap::with_capacity(config.entity_capacity),
            on_remove: OnRemoveSignals::new(),
            references,
            config,
        };
        debug!(world = world.id.raw(), config = ?world.config, "world created");
        world
    }

    /// This world's identity.
    #[must_use]
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// The configuration this world was built with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // --- Entity Operations ---

    /// Creates a new entity with no components.
    pub fn create(&mut self) -> Entity {
        let entity = self.entity_ids.allocate();
        self.archetypes[EMPTY_ARCHETYPE].insert_entity(entity);
        self.entities.insert(entity, EMPTY_ARCHETYPE);
        trace!(%entity, "entity created");
        entity
    }

    /// Returns true if the entity exists.
    #[must_use]
    pub fn exist(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Destroys an entity and all of its components.
    ///
    /// Removal signals fire for each of its component types first. Returns
    /// `false` if the entity did not exist.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(&index) = self.entities.get(&entity) else {
            return false;
        };

        let removal = match self.archetypes[index].remove_entity(entity, Some(&mut self.on_remove)) {
            Ok(removal) => removal,
            Err(err) => {
                warn!(%entity, %err, "entity directory out of sync with archetype");
                return false;
            }
        };
        self.entities.remove(&entity);

        if let Some(table) = &self.references {
            let mut table = table.borrow_mut();
            for id in self.archetypes[index].signature().ids() {
                let slot = SlotKey::new(index, id, removal.row);
                table.invalidate(slot);
                if removal.moved.is_some() {
                    table.relocate(SlotKey::new(index, id, removal.last_row), slot);
                }
            }
        }

        trace!(%entity, archetype = index, "entity removed");
        true
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates all live entities in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    // --- Component Operations ---

    /// Adds or replaces a component.
    ///
    /// Returns `false` if the entity does not exist or a capacity limit would
    /// be exceeded; use [`try_insert_component`](Self::try_insert_component)
    /// to learn which.
    pub fn insert_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        match self.try_insert_component(entity, value) {
            Ok(()) => true,
            Err(err) => {
                if !err.is_not_found() {
                    warn!(%entity, %err, component = type_name::<T>(), "insert_component failed");
                }
                false
            }
        }
    }

    /// Adds or replaces a component.
    ///
    /// Replacing keeps the entity in its archetype. Adding migrates it to the
    /// archetype for its new component set.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or the new component set
    /// exceeds `max_components_per_archetype`.
    pub fn try_insert_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<()> {
        let source = self.archetype_index(entity)?;
        let id = ComponentId::of::<T>();

        if self.archetypes[source].has_component(id) {
            self.archetypes[source].overwrite_component(entity, value)?;
            return Ok(());
        }

        let signature = self.archetypes[source].signature().with(id, size_of::<T>());
        self.check_capacity(&signature)?;

        let dest = match self.find_archetype(&signature) {
            Some(index) => index,
            None => {
                let mut columns = self.archetypes[source].clone_empty_columns();
                columns.push(Box::new(TypedColumn::<T>::new()));
                self.push_archetype(Archetype::new(columns))
            }
        };

        self.migrate(entity, source, dest)?;
        self.archetypes[dest].push_component(value)
    }

    /// Removes a component.
    ///
    /// Returns `false` if the entity does not exist or lacks the component.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        self.try_remove_component::<T>(entity).is_ok()
    }

    /// Removes a component, emitting its removal signal first.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or lacks the component.
    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<()> {
        let source = self.archetype_index(entity)?;
        let id = ComponentId::of::<T>();

        if !self.archetypes[source].has_component(id) {
            return Err(Error::component_not_found(entity, type_name::<T>()));
        }

        let signature = self.archetypes[source].signature().without(id);
        let dest = match self.find_archetype(&signature) {
            Some(index) => index,
            None => {
                let columns = self.archetypes[source]
                    .clone_empty_columns()
                    .into_iter()
                    .filter(|column| column.component_id() != id)
                    .collect();
                self.push_archetype(Archetype::new(columns))
            }
        };

        if let Some(signal) = self.on_remove.get_mut(&id) {
            signal.emit(entity);
        }

        self.migrate(entity, source, dest)
    }

    /// Returns true if the entity exists and has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|&index| self.archetypes[index].has_component(ComponentId::of::<T>()))
    }

    /// The entity's `T`, if both exist.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let index = *self.entities.get(&entity)?;
        self.archetypes[index].get(entity)
    }

    /// The entity's `T`, mutably, if both exist.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let index = *self.entities.get(&entity)?;
        self.archetypes[index].get_mut(entity)
    }

    /// The entity's `T`.
    ///
    /// # Errors
    ///
    /// Distinguishes a missing entity from a missing component.
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        let index = self.archetype_index(entity)?;
        self.archetypes[index]
            .get(entity)
            .ok_or_else(|| Error::component_not_found(entity, type_name::<T>()))
    }

    /// Reads several component types of one entity with a single lookup.
    ///
    /// ```
    /// # use strata_storage::World;
    /// # struct Position(f32, f32);
    /// # struct Velocity(f32, f32);
    /// let mut world = World::new();
    /// let e = world.create();
    /// world.insert_component(e, Position(0.0, 0.0));
    /// let (position, velocity) = world.get_components::<(Position, Velocity)>(e);
    /// assert!(position.is_some());
    /// assert!(velocity.is_none());
    /// ```
    #[must_use]
    pub fn get_components<Q: ComponentSet>(&self, entity: Entity) -> Q::Refs<'_> {
        let archetype = self.entities.get(&entity).map(|&index| &self.archetypes[index]);
        Q::fetch(archetype, entity)
    }

    // --- Queries ---

    /// Iterates every entity that has all of the component types in `Q`.
    pub fn iter<Q: Query>(&self) -> QueryIter<'_, Q> {
        let wanted = query_signature(&Q::components());
        let matches = self
            .archetypes
            .iter()
            .filter(|archetype| !archetype.is_empty() && archetype.fast_signature().contains(&wanted))
            .collect();
        QueryIter::new(matches)
    }

    /// Mutably iterates every entity that has all of the component types in `Q`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateQueryComponent` if `Q` names a type twice.
    pub fn iter_mut<Q: QueryMut>(&mut self) -> Result<QueryIterMut<'_, Q>> {
        let components = Q::components();
        if let Some(name) = duplicate_component(&components) {
            return Err(Error::new(ErrorKind::DuplicateQueryComponent(name)));
        }
        let wanted = query_signature(&components);
        let matches = self
            .archetypes
            .iter_mut()
            .filter(|archetype| !archetype.is_empty() && archetype.fast_signature().contains(&wanted))
            .collect();
        Ok(QueryIterMut::new(matches))
    }

    // --- Archetypes ---

    /// Index of the archetype whose component set is exactly `signature`.
    #[must_use]
    pub fn find_archetype(&self, signature: &Signature) -> Option<usize> {
        self.archetypes
            .iter()
            .position(|archetype| archetype.signature() == signature)
    }

    /// Number of archetypes, including the empty one.
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// The archetype at `index`.
    #[must_use]
    pub fn archetype(&self, index: usize) -> Option<&Archetype> {
        self.archetypes.get(index)
    }

    /// All archetypes in creation order.
    #[must_use]
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Index of the archetype holding `entity`.
    #[must_use]
    pub fn archetype_of(&self, entity: Entity) -> Option<usize> {
        self.entities.get(&entity).copied()
    }

    // --- Signals ---

    /// Connects a handler fired when a `T` is removed from any entity.
    ///
    /// Returns `false` if the same handler is already connected for `T`.
    pub fn connect_on_remove<T, F>(&mut self, handler: F) -> bool
    where
        T: Component,
        F: FnMut(Entity) + 'static,
    {
        self.on_remove
            .entry(ComponentId::of::<T>())
            .or_default()
            .connect(handler)
    }

    /// Connects a handler bound to `instance`, fired when a `T` is removed.
    pub fn connect_on_remove_bound<T, I, F>(&mut self, instance: &Rc<RefCell<I>>, handler: F) -> bool
    where
        T: Component,
        I: 'static,
        F: FnMut(&mut I, Entity) + 'static,
    {
        self.on_remove
            .entry(ComponentId::of::<T>())
            .or_default()
            .connect_bound(instance, handler)
    }

    /// Disconnects a handler from `T` removals.
    pub fn disconnect_on_remove<T, F>(&mut self, handler: &F) -> bool
    where
        T: Component,
        F: FnMut(Entity) + 'static,
    {
        self.on_remove
            .get_mut(&ComponentId::of::<T>())
            .is_some_and(|signal| signal.disconnect(handler))
    }

    /// Disconnects a bound handler from `T` removals.
    pub fn disconnect_on_remove_bound<T, I, F>(&mut self, instance: &Rc<RefCell<I>>, handler: &F) -> bool
    where
        T: Component,
        I: 'static,
        F: FnMut(&mut I, Entity) + 'static,
    {
        self.on_remove
            .get_mut(&ComponentId::of::<T>())
            .is_some_and(|signal| signal.disconnect_bound(instance, handler))
    }

    // --- References ---

    /// Takes a stable handle to the entity's `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if reference tracking is disabled or the entity or
    /// component does not exist.
    pub fn get_ref<T: Component>(&self, entity: Entity) -> Result<Ref<T>> {
        let table = self
            .references
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::ReferencesDisabled))?;
        let index = self.archetype_index(entity)?;
        let archetype = &self.archetypes[index];
        let id = ComponentId::of::<T>();
        if !archetype.has_component(id) {
            return Err(Error::component_not_found(entity, type_name::<T>()));
        }
        let row = archetype
            .row_of(entity)
            .ok_or_else(|| Error::internal("entity missing from its archetype"))?;

        let key = table
            .borrow_mut()
            .acquire(SlotKey::new(index, id, row), entity, self.id);
        Ok(Ref::new(Rc::clone(table), key))
    }

    /// Number of live reference records, or 0 when tracking is disabled.
    #[must_use]
    pub fn reference_records(&self) -> usize {
        self.references
            .as_ref()
            .map_or(0, |table| table.borrow().len())
    }

    pub(crate) fn component_at<T: Component>(&self, slot: SlotKey) -> Option<&T> {
        self.archetypes.get(slot.archetype)?.get_at(slot.row)
    }

    pub(crate) fn component_at_mut<T: Component>(&mut self, slot: SlotKey) -> Option<&mut T> {
        self.archetypes.get_mut(slot.archetype)?.get_at_mut(slot.row)
    }

    // --- Internals ---

    fn archetype_index(&self, entity: Entity) -> Result<usize> {
        self.entities
            .get(&entity)
            .copied()
            .ok_or_else(|| Error::entity_not_found(entity))
    }

    fn check_capacity(&self, signature: &Signature) -> Result<()> {
        match self.config.max_components_per_archetype {
            Some(limit) if signature.len() > limit => Err(Error::limit_exceeded(
                CapacityLimit::MaxComponentsPerArchetype { limit },
            )),
            _ => Ok(()),
        }
    }

    fn push_archetype(&mut self, archetype: Archetype) -> usize {
        let index = self.archetypes.len();
        debug!(
            archetype = index,
            signature = ?archetype.signature(),
            "archetype created"
        );
        self.archetypes.push(archetype);
        index
    }

    /// Moves `entity` from `source` to `dest` and keeps references in step.
    fn migrate(&mut self, entity: Entity, source: usize, dest: usize) -> Result<()> {
        let (from, to) = pair_mut(&mut self.archetypes, source, dest)?;
        let migration = from.migrate_entity(entity, to)?;

        if let Some(table) = &self.references {
            let mut table = table.borrow_mut();
            for id in from.signature().ids() {
                let old = SlotKey::new(source, id, migration.old_row);
                if to.has_component(id) {
                    table.relocate(old, SlotKey::new(dest, id, migration.new_row));
                } else {
                    table.invalidate(old);
                }
                if migration.moved.is_some() {
                    table.relocate(SlotKey::new(source, id, migration.last_row), old);
                }
            }
        }

        self.entities.insert(entity, dest);
        trace!(%entity, from = source, to = dest, "entity migrated");
        Ok(())
    }
}

/// Borrows two distinct archetypes mutably.
fn pair_mut(
    archetypes: &mut [Archetype],
    a: usize,
    b: usize,
) -> Result<(&mut Archetype, &mut Archetype)> {
    if a == b || a.max(b) >= archetypes.len() {
        return Err(Error::internal(format!("invalid archetype pair ({a}, {b})")));
    }
    if a < b {
        let (left, right) = archetypes.split_at_mut(b);
        Ok((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = archetypes.split_at_mut(a);
        Ok((&mut right[0], &mut left[b]))
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if let Some(table) = &self.references {
            match table.try_borrow_mut() {
                Ok(mut table) => table.detach_world(),
                Err(_) => warn!(world = self.id.raw(), "reference table busy during world drop"),
            }
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("entities", &self.entities.len())
            .field("archetypes", &self.archetypes.len())
            .finish_non_exhaustive()
    }
}
