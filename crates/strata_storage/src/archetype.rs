//! Archetype tables.
//!
//! An [`Archetype`] stores every entity that has exactly one particular set
//! of component types. It keeps one [`Column`] per type, sorted by component
//! id, and the two row maps that tie rows to entities.
//!
//! Row `r` of every column belongs to the entity at `entities()[r]`. Removal
//! fills the hole from the last row, so rows stay dense and the row of the
//! last entity may change. Callers learn about such moves from the returned
//! [`RowRemoval`] and [`Migration`] records.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;

use strata_foundation::{Component, ComponentId, Entity, Error, Result, Signal};

use crate::column::{Column, TypedColumn};
use crate::signature::{FastSignature, Signature};

/// Per-component-type removal notifications, keyed by component id.
pub type OnRemoveSignals = HashMap<ComponentId, Signal<Entity>>;

/// Outcome of removing one row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowRemoval {
    /// Row the removed entity occupied.
    pub row: usize,
    /// Last row before the removal.
    pub last_row: usize,
    /// Entity moved from `last_row` into `row`, if any.
    pub moved: Option<Entity>,
}

/// Outcome of moving one entity to another archetype.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Migration {
    /// Row in the source archetype.
    pub old_row: usize,
    /// Row in the destination archetype.
    pub new_row: usize,
    /// Last row of the source before the move.
    pub last_row: usize,
    /// Entity moved from `last_row` into `old_row` in the source, if any.
    pub moved: Option<Entity>,
}

/// Column table for one exact set of component types.
pub struct Archetype {
    signature: Signature,
    fast_signature: FastSignature,
    columns: Vec<Box<dyn Column>>,
    entity_to_row: HashMap<Entity, usize>,
    row_to_entity: Vec<Entity>,
}

impl Archetype {
    /// Creates the archetype with no component types.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates an archetype from a set of empty columns.
    ///
    /// Columns are sorted by component id; duplicates keep the first.
    #[must_use]
    pub fn new(mut columns: Vec<Box<dyn Column>>) -> Self {
        columns.sort_by_key(|column| column.component_id());
        columns.dedup_by_key(|column| column.component_id());

        let signature: Signature = columns
            .iter()
            .map(|column| (column.component_id(), column.element_size()))
            .collect();
        let fast_signature = signature.fast();

        Self {
            signature,
            fast_signature,
            columns,
            entity_to_row: HashMap::new(),
            row_to_entity: Vec::new(),
        }
    }

    /// The exact component set.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The bitset form of the component set.
    #[must_use]
    pub fn fast_signature(&self) -> &FastSignature {
        &self.fast_signature
    }

    /// Number of entities (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.row_to_entity.len()
    }

    /// Returns true if the archetype has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_to_entity.is_empty()
    }

    /// Entities in row order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.row_to_entity
    }

    /// Returns true if `entity` has a row here.
    #[must_use]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entity_to_row.contains_key(&entity)
    }

    /// Row of `entity`, if it lives here.
    #[must_use]
    pub fn row_of(&self, entity: Entity) -> Option<usize> {
        self.entity_to_row.get(&entity).copied()
    }

    /// Entity stored at `row`.
    #[must_use]
    pub fn entity_at(&self, row: usize) -> Option<Entity> {
        self.row_to_entity.get(row).copied()
    }

    /// Returns true if this archetype stores component `id`.
    #[must_use]
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.column_index(id).is_some()
    }

    /// Appends a row for `entity` to the row maps and returns the row.
    ///
    /// Columns are not touched; the caller pushes one value per column.
    pub fn insert_entity(&mut self, entity: Entity) -> usize {
        let row = self.row_to_entity.len();
        self.row_to_entity.push(entity);
        self.entity_to_row.insert(entity, row);
        row
    }

    /// Appends `value` to the column for `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if this archetype has no column for `T`.
    pub fn push_component<T: Component>(&mut self, value: T) -> Result<()> {
        let column = self
            .column_mut::<T>()
            .ok_or_else(|| Error::internal(format!("no column for {}", type_name::<T>())))?;
        column.push(value);
        Ok(())
    }

    /// Replaces the `T` value of `entity` in place, returning the old one.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not here or has no `T`.
    pub fn overwrite_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<T> {
        let row = self.row_of(entity).ok_or_else(|| Error::entity_not_found(entity))?;
        let column = self
            .column_mut::<T>()
            .ok_or_else(|| Error::component_not_found(entity, type_name::<T>()))?;
        column.overwrite(row, value)
    }

    /// Removes `entity` and drops all of its values.
    ///
    /// When `on_remove` is given, the signal of every component type in this
    /// archetype is emitted with the entity before the values are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not here.
    pub fn remove_entity(
        &mut self,
        entity: Entity,
        on_remove: Option<&mut OnRemoveSignals>,
    ) -> Result<RowRemoval> {
        let row = self.row_of(entity).ok_or_else(|| Error::entity_not_found(entity))?;

        if let Some(signals) = on_remove {
            for id in self.signature.ids() {
                if let Some(signal) = signals.get_mut(&id) {
                    signal.emit(entity);
                }
            }
        }

        for column in &mut self.columns {
            column.swap_remove_last_into(row)?;
        }

        let last_row = self.len() - 1;
        let moved = self.unbind(entity, row);
        Ok(RowRemoval {
            row,
            last_row,
            moved,
        })
    }

    /// Moves `entity` with its values into `dest`.
    ///
    /// Values of types shared with `dest` are moved; values of types `dest`
    /// lacks are dropped. The caller must push values for any type `dest`
    /// has and this archetype lacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not here.
    pub fn migrate_entity(&mut self, entity: Entity, dest: &mut Archetype) -> Result<Migration> {
        let old_row = self.row_of(entity).ok_or_else(|| Error::entity_not_found(entity))?;
        let new_row = dest.insert_entity(entity);

        for column in &mut self.columns {
            match dest.column_index(column.component_id()) {
                Some(index) => column.move_row_into(old_row, dest.columns[index].as_mut())?,
                None => column.swap_remove_last_into(old_row)?,
            }
        }

        let last_row = self.len() - 1;
        let moved = self.unbind(entity, old_row);
        Ok(Migration {
            old_row,
            new_row,
            last_row,
            moved,
        })
    }

    /// The `T` value of `entity`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get_at(self.row_of(entity)?)
    }

    /// The `T` value of `entity`, mutably.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let row = self.row_of(entity)?;
        self.get_at_mut(row)
    }

    /// The `T` value at `row`.
    #[must_use]
    pub fn get_at<T: Component>(&self, row: usize) -> Option<&T> {
        self.column::<T>()?.get(row)
    }

    /// The `T` value at `row`, mutably.
    pub fn get_at_mut<T: Component>(&mut self, row: usize) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(row)
    }

    /// The column for `T`.
    #[must_use]
    pub fn column<T: Component>(&self) -> Option<&TypedColumn<T>> {
        let index = self.column_index(ComponentId::of::<T>())?;
        self.columns[index].downcast_ref::<T>()
    }

    /// The column for `T`, mutably.
    pub fn column_mut<T: Component>(&mut self) -> Option<&mut TypedColumn<T>> {
        let index = self.column_index(ComponentId::of::<T>())?;
        self.columns[index].downcast_mut::<T>()
    }

    /// The type-erased column for component `id`.
    #[must_use]
    pub fn column_by_id(&self, id: ComponentId) -> Option<&dyn Column> {
        let index = self.column_index(id)?;
        Some(self.columns[index].as_ref())
    }

    /// Fresh empty columns with the same element types.
    #[must_use]
    pub fn clone_empty_columns(&self) -> Vec<Box<dyn Column>> {
        self.columns.iter().map(|column| column.clone_empty()).collect()
    }

    /// Row-ordered entities alongside mutable access to every column.
    pub(crate) fn split_columns_mut(&mut self) -> (&[Entity], &mut [Box<dyn Column>]) {
        (&self.row_to_entity, &mut self.columns)
    }

    fn column_index(&self, id: ComponentId) -> Option<usize> {
        self.columns
            .binary_search_by_key(&id, |column| column.component_id())
            .ok()
    }

    /// Drops `entity` from the row maps after its values were swap-removed
    /// from `row`, and re-points whichever entity filled the hole.
    fn unbind(&mut self, entity: Entity, row: usize) -> Option<Entity> {
        let last_row = self.row_to_entity.len() - 1;
        self.entity_to_row.remove(&entity);
        self.row_to_entity.swap_remove(row);
        if row == last_row {
            return None;
        }
        let moved = self.row_to_entity[row];
        self.entity_to_row.insert(moved, row);
        Some(moved)
    }
}

impl Default for Archetype {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("signature", &self.signature)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
