//! Type-erased, densely packed component columns.
//!
//! Each archetype stores one [`Column`] per component type. The concrete
//! implementation is [`TypedColumn<T>`], a thin wrapper over `Vec<T>`, so
//! values are moved and dropped with their normal Rust semantics. Archetypes
//! hold columns as `Box<dyn Column>` and only recover the element type when a
//! caller asks for a specific `T`.
//!
//! Rows are always dense. Removal is swap-with-last, never tombstoning.

use std::any::{Any, type_name};
use std::mem::size_of;

use strata_foundation::{Component, ComponentId, Error, Result};

/// Capability interface shared by every column regardless of element type.
pub trait Column: Any {
    /// Component id of the stored type.
    fn component_id(&self) -> ComponentId;

    /// `size_of` the stored type.
    fn element_size(&self) -> usize;

    /// Rust name of the stored type.
    fn type_name(&self) -> &'static str;

    /// Number of stored values.
    fn len(&self) -> usize;

    /// Returns true if the column holds no values.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the value at `row`, moves the last value into its slot and
    /// shrinks by one. On the last row this is a plain truncation.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of bounds.
    fn swap_remove_last_into(&mut self, row: usize) -> Result<()>;

    /// Moves the value at `row` to the end of `dest`, filling the hole in
    /// this column from its last row.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of bounds or `dest` stores another type.
    fn move_row_into(&mut self, row: usize, dest: &mut dyn Column) -> Result<()>;

    /// Creates an empty column of the same element type.
    fn clone_empty(&self) -> Box<dyn Column>;

    /// Returns the value at `row` as `&dyn Any`.
    fn get_any(&self, row: usize) -> Option<&dyn Any>;

    /// Appends a boxed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the boxed value is not of the stored type.
    fn push_any(&mut self, value: Box<dyn Any>) -> Result<()>;

    /// Replaces the value at `row` with a boxed value.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of bounds or the value has the wrong type.
    fn overwrite_any(&mut self, row: usize, value: Box<dyn Any>) -> Result<()>;

    /// Upcast for downcasting to the concrete column.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete column.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn Column + 'a {
    /// Downcasts to the typed column, if the element type is `T`.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&TypedColumn<T>> {
        self.as_any().downcast_ref::<TypedColumn<T>>()
    }

    /// Mutably downcasts to the typed column, if the element type is `T`.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut TypedColumn<T>> {
        self.as_any_mut().downcast_mut::<TypedColumn<T>>()
    }
}

/// Dense storage for a single component type.
#[derive(Debug)]
pub struct TypedColumn<T> {
    id: ComponentId,
    values: Vec<T>,
}

impl<T: Component> Default for TypedColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> TypedColumn<T> {
    /// Creates an empty column for `T`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty column with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: ComponentId::of::<T>(),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends a value.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Replaces the value at `row`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of bounds.
    pub fn overwrite(&mut self, row: usize, value: T) -> Result<T> {
        let length = self.values.len();
        let slot = self
            .values
            .get_mut(row)
            .ok_or_else(|| Error::index_out_of_bounds(row, length))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Removes the value at `row`, moving the last value into its place.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of bounds.
    pub fn swap_remove(&mut self, row: usize) -> Result<T> {
        self.check_row(row)?;
        Ok(self.values.swap_remove(row))
    }

    /// Returns the value at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    /// Returns the value at `row` mutably.
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.values.get_mut(row)
    }

    /// All values in row order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// All values in row order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row < self.values.len() {
            Ok(())
        } else {
            Err(Error::index_out_of_bounds(row, self.values.len()))
        }
    }

    fn unbox(value: Box<dyn Any>) -> Result<T> {
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::type_mismatch(type_name::<T>(), "a different component type"))
    }
}

impl<T: Component> Column for TypedColumn<T> {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn element_size(&self) -> usize {
        size_of::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn swap_remove_last_into(&mut self, row: usize) -> Result<()> {
        self.swap_remove(row).map(drop)
    }

    fn move_row_into(&mut self, row: usize, dest: &mut dyn Column) -> Result<()> {
        let dest_name = dest.type_name();
        let dest = dest
            .downcast_mut::<T>()
            .ok_or_else(|| Error::type_mismatch(type_name::<T>(), dest_name))?;
        let value = self.swap_remove(row)?;
        dest.push(value);
        Ok(())
    }

    fn clone_empty(&self) -> Box<dyn Column> {
        Box::new(TypedColumn::<T>::new())
    }

    fn get_any(&self, row: usize) -> Option<&dyn Any> {
        self.values.get(row).map(|value| value as &dyn Any)
    }

    fn push_any(&mut self, value: Box<dyn Any>) -> Result<()> {
        self.push(Self::unbox(value)?);
        Ok(())
    }

    fn overwrite_any(&mut self, row: usize, value: Box<dyn Any>) -> Result<()> {
        self.check_row(row)?;
        self.overwrite(row, Self::unbox(value)?).map(drop)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
