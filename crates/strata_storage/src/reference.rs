//! Stable component references.
//!
//! Rows move whenever an entity is removed or migrates between archetypes,
//! so a plain `&T` cannot outlive a structural change. A [`Ref<T>`] instead
//! names a record in a [`ReferenceTable`] shared with the world. The world
//! rewrites the record's slot every time the component's row moves, and
//! invalidates it when the component goes away. Holding a handle never
//! borrows the world; values are read by passing the world back in.
//!
//! Records are reference counted by their handles. The last handle to drop
//! deletes the record.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use strata_foundation::{Component, ComponentId, Entity};

use crate::world::{World, WorldId};

/// Storage position of one component value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    /// Index of the archetype in its world.
    pub archetype: usize,
    /// Component type stored in the slot.
    pub component: ComponentId,
    /// Row within the archetype.
    pub row: usize,
}

impl SlotKey {
    /// Creates a slot key.
    #[must_use]
    pub const fn new(archetype: usize, component: ComponentId, row: usize) -> Self {
        Self {
            archetype,
            component,
            row,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RecordKey(u64);

#[derive(Debug)]
struct Record {
    count: usize,
    world: Option<WorldId>,
    entity: Entity,
    slot: Option<SlotKey>,
}

/// Shared bookkeeping for every live [`Ref`] of one world.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    records: HashMap<RecordKey, Record>,
    by_slot: HashMap<SlotKey, RecordKey>,
    next_key: u64,
}

/// The form in which a world and its handles share a table.
pub type SharedReferenceTable = Rc<RefCell<ReferenceTable>>;

impl ReferenceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record for `slot`, creating it if needed, and counts one
    /// more handle against it.
    pub(crate) fn acquire(&mut self, slot: SlotKey, entity: Entity, world: WorldId) -> RecordKey {
        if let Some(&key) = self.by_slot.get(&slot) {
            if let Some(record) = self.records.get_mut(&key) {
                record.count += 1;
                return key;
            }
        }

        let key = RecordKey(self.next_key);
        self.next_key += 1;
        self.records.insert(
            key,
            Record {
                count: 1,
                world: Some(world),
                entity,
                slot: Some(slot),
            },
        );
        self.by_slot.insert(slot, key);
        key
    }

    pub(crate) fn retain(&mut self, key: RecordKey) {
        if let Some(record) = self.records.get_mut(&key) {
            record.count += 1;
        }
    }

    pub(crate) fn release(&mut self, key: RecordKey) {
        let Some(record) = self.records.get_mut(&key) else {
            return;
        };
        record.count -= 1;
        if record.count > 0 {
            return;
        }
        if let Some(slot) = record.slot {
            self.by_slot.remove(&slot);
        }
        self.records.remove(&key);
    }

    /// Points the record at `from`, if any, to `to`.
    pub(crate) fn relocate(&mut self, from: SlotKey, to: SlotKey) {
        let Some(key) = self.by_slot.remove(&from) else {
            return;
        };
        self.invalidate(to);
        if let Some(record) = self.records.get_mut(&key) {
            record.slot = Some(to);
        }
        self.by_slot.insert(to, key);
    }

    /// Marks the record at `slot`, if any, as pointing at nothing.
    pub(crate) fn invalidate(&mut self, slot: SlotKey) {
        let Some(key) = self.by_slot.remove(&slot) else {
            return;
        };
        if let Some(record) = self.records.get_mut(&key) {
            Self::clear(record);
        }
    }

    /// Invalidates every record; used when the owning world is dropped.
    pub(crate) fn detach_world(&mut self) {
        self.by_slot.clear();
        self.records.values_mut().for_each(Self::clear);
    }

    fn clear(record: &mut Record) {
        record.slot = None;
        record.world = None;
        record.entity = Entity::NULL;
    }

    fn record(&self, key: RecordKey) -> Option<&Record> {
        self.records.get(&key)
    }
}

/// Stable handle to one component value of one entity.
///
/// Cloning shares the underlying record. Reading goes through the world
/// the handle was taken from; any other world yields `None`.
pub struct Ref<T> {
    table: SharedReferenceTable,
    key: RecordKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Ref<T> {
    pub(crate) fn new(table: SharedReferenceTable, key: RecordKey) -> Self {
        Self {
            table,
            key,
            _marker: PhantomData,
        }
    }

    /// Returns true while the component this handle names still exists.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.slot().is_some()
    }

    /// The entity owning the component, or [`Entity::NULL`] once invalid.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.with_record(|record| record.entity)
            .unwrap_or(Entity::NULL)
    }

    /// The world the component lives in, or `None` once invalid.
    #[must_use]
    pub fn world_id(&self) -> Option<WorldId> {
        self.with_record(|record| record.world).flatten()
    }

    /// Number of handles sharing this record.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.with_record(|record| record.count).unwrap_or(0)
    }

    /// Current storage position, or `None` once invalid.
    #[must_use]
    pub fn slot(&self) -> Option<SlotKey> {
        self.with_record(|record| record.slot).flatten()
    }

    /// Reads the component from `world`.
    #[must_use]
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        let slot = self.resolve(world)?;
        world.component_at(slot)
    }

    /// Mutably reads the component from `world`.
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        let slot = self.resolve(world)?;
        world.component_at_mut(slot)
    }

    fn resolve(&self, world: &World) -> Option<SlotKey> {
        let (owner, slot) = self.with_record(|record| (record.world, record.slot))?;
        if owner? != world.id() {
            return None;
        }
        slot.filter(|slot| slot.component == ComponentId::of::<T>())
    }

    fn with_record<R>(&self, f: impl FnOnce(&Record) -> R) -> Option<R> {
        let table = self.table.try_borrow().ok()?;
        table.record(self.key).map(f)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        self.table.borrow_mut().retain(self.key);
        Self {
            table: Rc::clone(&self.table),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for Ref<T> {
    fn drop(&mut self) {
        match self.table.try_borrow_mut() {
            Ok(mut table) => table.release(self.key),
            Err(_) => tracing::warn!(
                component = std::any::type_name::<T>(),
                "reference table busy; handle released without bookkeeping"
            ),
        }
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self
            .table
            .try_borrow()
            .ok()
            .and_then(|table| table.record(self.key).map(|record| (record.entity, record.slot)));
        f.debug_struct("Ref")
            .field("component", &std::any::type_name::<T>())
            .field("state", &slot)
            .finish()
    }
}
