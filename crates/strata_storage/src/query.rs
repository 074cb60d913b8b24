//! Typed queries over archetypes.
//!
//! A query is a tuple of component types, `(A,)` through `(A, B, C, D, E, F,
//! G, H)`. It matches every non-empty archetype whose component set contains
//! all of them and yields one item per row: the entity followed by a
//! reference to each requested component, in the order requested.
//!
//! [`QueryIter`] and [`QueryIterMut`] snapshot the matching archetypes when
//! they are created. The world stays borrowed for as long as either lives,
//! so no structural change can happen mid-iteration.

use std::any::type_name;
use std::slice;

use strata_foundation::{Component, ComponentId, Entity};

use crate::archetype::Archetype;
use crate::column::Column;
use crate::signature::FastSignature;

/// A tuple of component types read through shared references.
pub trait Query {
    /// What one row yields.
    type Item<'a>;

    /// Row iterator over a single archetype.
    type Fetch<'a>: Iterator<Item = Self::Item<'a>>;

    /// Requested component ids and type names, in request order.
    fn components() -> Vec<(ComponentId, &'static str)>;

    /// Builds the row iterator, or `None` if a requested column is missing.
    fn fetch(archetype: &Archetype) -> Option<Self::Fetch<'_>>;
}

/// A tuple of component types read through mutable references.
pub trait QueryMut {
    /// What one row yields.
    type Item<'a>;

    /// Row iterator over a single archetype.
    type Fetch<'a>: Iterator<Item = Self::Item<'a>>;

    /// Requested component ids and type names, in request order.
    fn components() -> Vec<(ComponentId, &'static str)>;

    /// Builds the row iterator, or `None` if a requested column is missing
    /// or requested twice.
    fn fetch(archetype: &mut Archetype) -> Option<Self::Fetch<'_>>;
}

/// A tuple of component types read together from one entity.
pub trait ComponentSet {
    /// One `Option<&T>` per requested type.
    type Refs<'a>;

    /// Reads every requested type of `entity` from `archetype`.
    fn fetch(archetype: Option<&Archetype>, entity: Entity) -> Self::Refs<'_>;
}

/// Zipped row iterator shared by every query arity.
pub struct Rows<'a, C> {
    entities: slice::Iter<'a, Entity>,
    columns: C,
}

/// Bitset of the components a query asks for.
pub(crate) fn query_signature(components: &[(ComponentId, &'static str)]) -> FastSignature {
    components.iter().map(|(id, _)| *id).collect()
}

/// The first component type requested twice, if any.
pub(crate) fn duplicate_component(
    components: &[(ComponentId, &'static str)],
) -> Option<&'static str> {
    components
        .iter()
        .enumerate()
        .find(|(i, (id, _))| components[..*i].iter().any(|(seen, _)| seen == id))
        .map(|(_, (_, name))| *name)
}

/// Hands out each requested column at most once, in request order.
fn take_columns<'a>(
    columns: &'a mut [Box<dyn Column>],
    wanted: &[ComponentId],
) -> Vec<Option<&'a mut Box<dyn Column>>> {
    let mut slots: Vec<Option<&'a mut Box<dyn Column>>> = wanted.iter().map(|_| None).collect();
    for column in columns.iter_mut() {
        let id = column.component_id();
        if let Some(pos) = (0..wanted.len()).find(|&i| wanted[i] == id && slots[i].is_none()) {
            slots[pos] = Some(column);
        }
    }
    slots
}

macro_rules! impl_query {
    ($($T:ident $col:ident),+) => {
        impl<$($T: Component),+> Query for ($($T,)+) {
            type Item<'a> = (Entity, $(&'a $T,)+);
            type Fetch<'a> = Rows<'a, ($(slice::Iter<'a, $T>,)+)>;

            fn components() -> Vec<(ComponentId, &'static str)> {
                vec![$((ComponentId::of::<$T>(), type_name::<$T>()),)+]
            }

            fn fetch(archetype: &Archetype) -> Option<Self::Fetch<'_>> {
                Some(Rows {
                    entities: archetype.entities().iter(),
                    columns: ($(archetype.column::<$T>()?.as_slice().iter(),)+),
                })
            }
        }

        impl<$($T: Component),+> QueryMut for ($($T,)+) {
            type Item<'a> = (Entity, $(&'a mut $T,)+);
            type Fetch<'a> = Rows<'a, ($(slice::IterMut<'a, $T>,)+)>;

            fn components() -> Vec<(ComponentId, &'static str)> {
                vec![$((ComponentId::of::<$T>(), type_name::<$T>()),)+]
            }

            fn fetch(archetype: &mut Archetype) -> Option<Self::Fetch<'_>> {
                let wanted = [$(ComponentId::of::<$T>()),+];
                let (entities, columns) = archetype.split_columns_mut();
                let mut slots = take_columns(columns, &wanted).into_iter();
                $(
                    let $col = slots.next()??.downcast_mut::<$T>()?.as_mut_slice().iter_mut();
                )+
                Some(Rows {
                    entities: entities.iter(),
                    columns: ($($col,)+),
                })
            }
        }

        impl<'a, $($T: 'a),+> Iterator for Rows<'a, ($(slice::Iter<'a, $T>,)+)> {
            type Item = (Entity, $(&'a $T,)+);

            fn next(&mut self) -> Option<Self::Item> {
                let entity = *self.entities.next()?;
                let ($($col,)+) = &mut self.columns;
                Some((entity, $($col.next()?,)+))
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.entities.size_hint()
            }
        }

        impl<'a, $($T: 'a),+> Iterator for Rows<'a, ($(slice::IterMut<'a, $T>,)+)> {
            type Item = (Entity, $(&'a mut $T,)+);

            fn next(&mut self) -> Option<Self::Item> {
                let entity = *self.entities.next()?;
                let ($($col,)+) = &mut self.columns;
                Some((entity, $($col.next()?,)+))
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.entities.size_hint()
            }
        }

        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Refs<'a> = ($(Option<&'a $T>,)+);

            fn fetch(archetype: Option<&Archetype>, entity: Entity) -> Self::Refs<'_> {
                ($(archetype.and_then(|a| a.get::<$T>(entity)),)+)
            }
        }
    };
}

impl_query!(A a);
impl_query!(A a, B b);
impl_query!(A a, B b, C c);
impl_query!(A a, B b, C c, D d);
impl_query!(A a, B b, C c, D d, E e);
impl_query!(A a, B b, C c, D d, E e, F f);
impl_query!(A a, B b, C c, D d, E e, F f, G g);
impl_query!(A a, B b, C c, D d, E e, F f, G g, H h);

/// Iterator over every row of every matching archetype.
pub struct QueryIter<'w, Q: Query> {
    archetypes: std::vec::IntoIter<&'w Archetype>,
    current: Option<Q::Fetch<'w>>,
}

impl<'w, Q: Query> QueryIter<'w, Q> {
    pub(crate) fn new(archetypes: Vec<&'w Archetype>) -> Self {
        Self {
            archetypes: archetypes.into_iter(),
            current: None,
        }
    }
}

impl<'w, Q: Query> Iterator for QueryIter<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rows) = &mut self.current {
                if let Some(item) = rows.next() {
                    return Some(item);
                }
            }
            let archetype = self.archetypes.next()?;
            self.current = Q::fetch(archetype);
        }
    }
}

/// Mutable iterator over every row of every matching archetype.
pub struct QueryIterMut<'w, Q: QueryMut> {
    archetypes: std::vec::IntoIter<&'w mut Archetype>,
    current: Option<Q::Fetch<'w>>,
}

impl<'w, Q: QueryMut> QueryIterMut<'w, Q> {
    pub(crate) fn new(archetypes: Vec<&'w mut Archetype>) -> Self {
        Self {
            archetypes: archetypes.into_iter(),
            current: None,
        }
    }
}

impl<'w, Q: QueryMut> Iterator for QueryIterMut<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(rows) = &mut self.current {
                if let Some(item) = rows.next() {
                    return Some(item);
                }
            }
            let archetype = self.archetypes.next()?;
            self.current = Q::fetch(archetype);
        }
    }
}
