//! Integration tests for component storage
//!
//! Tests insertion, replacement, removal, archetype migration, and
//! column density.

use strata_foundation::{CapacityLimit, ErrorKind};
use strata_storage::{Signature, World, WorldConfig};

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, PartialEq)]
struct Name(String);

#[derive(Debug, PartialEq)]
struct Frozen;

fn pos(x: f32, y: f32) -> Position {
    Position { x, y }
}

fn vel(dx: f32, dy: f32) -> Velocity {
    Velocity { dx, dy }
}

/// Every column of every archetype has one value per row.
fn assert_columns_dense(world: &World) {
    for archetype in world.archetypes() {
        for id in archetype.signature().ids() {
            assert_eq!(archetype.column_by_id(id).unwrap().len(), archetype.len());
        }
        for (row, &entity) in archetype.entities().iter().enumerate() {
            assert_eq!(archetype.row_of(entity), Some(row));
        }
    }
}

// =============================================================================
// Insertion
// =============================================================================

#[test]
fn insert_and_get() {
    let mut world = World::new();
    let e = world.create();

    assert!(world.insert_component(e, pos(1.0, 2.0)));
    assert!(world.has_component::<Position>(e));
    assert_eq!(world.get_component::<Position>(e), Some(&pos(1.0, 2.0)));
}

#[test]
fn insert_replaces_existing_value() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, Name("old".into()));
    world.insert_component(e, Name("new".into()));

    assert_eq!(world.get_component::<Name>(e), Some(&Name("new".into())));
    assert_eq!(world.archetype_count(), 2);
}

#[test]
fn zero_sized_components() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, Frozen);
    assert!(world.has_component::<Frozen>(e));
    assert_eq!(world.get_component::<Frozen>(e), Some(&Frozen));
}

#[test]
fn insert_order_does_not_matter_for_archetype() {
    let mut world = World::new();
    let a = world.create();
    let b = world.create();

    world.insert_component(a, pos(0.0, 0.0));
    world.insert_component(a, vel(0.0, 0.0));
    world.insert_component(b, vel(1.0, 1.0));
    world.insert_component(b, pos(1.0, 1.0));

    assert_eq!(world.archetype_of(a), world.archetype_of(b));
    assert_columns_dense(&world);
}

#[test]
fn migration_preserves_existing_values() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(3.0, 4.0));
    world.insert_component(e, Name("walker".into()));
    world.insert_component(e, vel(1.0, 0.0));

    assert_eq!(world.get_component::<Position>(e), Some(&pos(3.0, 4.0)));
    assert_eq!(world.get_component::<Name>(e), Some(&Name("walker".into())));
    assert_eq!(world.get_component::<Velocity>(e), Some(&vel(1.0, 0.0)));
}

#[test]
fn migration_moves_last_row_into_hole() {
    let mut world = World::new();
    let entities: Vec<_> = (0..4)
        .map(|i| {
            let e = world.create();
            world.insert_component(e, pos(i as f32, 0.0));
            e
        })
        .collect();

    // entities[0] leaves the Position archetype; the last row fills its slot
    world.insert_component(entities[0], vel(0.0, 0.0));

    for (i, &e) in entities.iter().enumerate() {
        assert_eq!(world.get_component::<Position>(e), Some(&pos(i as f32, 0.0)));
    }
    assert_columns_dense(&world);
}

#[test]
fn get_component_mut_writes_through() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(0.0, 0.0));

    world.get_component_mut::<Position>(e).unwrap().x = 9.0;
    assert_eq!(world.get_component::<Position>(e), Some(&pos(9.0, 0.0)));
}

#[test]
fn missing_component_reads() {
    let mut world = World::new();
    let e = world.create();
    assert_eq!(world.get_component::<Position>(e), None);
    assert!(world.get_component_mut::<Position>(e).is_none());
    assert!(!world.has_component::<Position>(e));

    let err = world.try_get_component::<Position>(e).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentNotFound { .. }));
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn remove_component_keeps_others() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(1.0, 1.0));
    world.insert_component(e, vel(2.0, 2.0));

    assert!(world.remove_component::<Position>(e));
    assert!(!world.has_component::<Position>(e));
    assert_eq!(world.get_component::<Velocity>(e), Some(&vel(2.0, 2.0)));
    assert_columns_dense(&world);
}

#[test]
fn remove_missing_component_is_noop() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(1.0, 1.0));
    let before = world.archetype_of(e);

    assert!(!world.remove_component::<Velocity>(e));
    assert_eq!(world.archetype_of(e), before);

    let err = world.try_remove_component::<Velocity>(e).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ComponentNotFound { .. }));
}

#[test]
fn remove_last_component_returns_to_empty_archetype() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(0.0, 0.0));
    world.remove_component::<Position>(e);

    assert!(world.exist(e));
    assert_eq!(world.archetype_of(e), Some(0));
}

#[test]
fn components_are_dropped_with_entity() {
    use std::rc::Rc;

    let tracker = Rc::new(());
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, Rc::clone(&tracker));
    world.insert_component(e, pos(0.0, 0.0));
    assert_eq!(Rc::strong_count(&tracker), 2);

    world.remove(e);
    assert_eq!(Rc::strong_count(&tracker), 1);
}

#[test]
fn removed_component_is_dropped() {
    use std::rc::Rc;

    let tracker = Rc::new(());
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, Rc::clone(&tracker));
    world.remove_component::<Rc<()>>(e);
    assert_eq!(Rc::strong_count(&tracker), 1);
}

#[test]
fn world_drop_releases_components() {
    use std::rc::Rc;

    let tracker = Rc::new(());
    {
        let mut world = World::new();
        for _ in 0..3 {
            let e = world.create();
            world.insert_component(e, Rc::clone(&tracker));
        }
        assert_eq!(Rc::strong_count(&tracker), 4);
    }
    assert_eq!(Rc::strong_count(&tracker), 1);
}

// =============================================================================
// Archetypes
// =============================================================================

#[test]
fn archetypes_are_reused() {
    let mut world = World::new();
    for _ in 0..10 {
        let e = world.create();
        world.insert_component(e, pos(0.0, 0.0));
        world.insert_component(e, vel(0.0, 0.0));
    }
    // empty, {Position}, {Position, Velocity}
    assert_eq!(world.archetype_count(), 3);
}

#[test]
fn find_archetype_matches_exact_set() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(0.0, 0.0));
    world.insert_component(e, vel(0.0, 0.0));

    let mut exact = Signature::new();
    exact.add_type::<Velocity>();
    exact.add_type::<Position>();
    assert_eq!(world.find_archetype(&exact), world.archetype_of(e));

    let mut partial = Signature::new();
    partial.add_type::<Velocity>();
    assert_eq!(world.find_archetype(&partial), None);
}

#[test]
fn archetype_width_limit() {
    let mut world = World::with_config(WorldConfig::bounded(2));
    let e = world.create();
    assert!(world.insert_component(e, pos(0.0, 0.0)));
    assert!(world.insert_component(e, vel(0.0, 0.0)));
    assert!(!world.insert_component(e, Frozen));

    let err = world.try_insert_component(e, Frozen).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(CapacityLimit::MaxComponentsPerArchetype { limit: 2 })
    ));
    // replacing an existing component is still allowed at the limit
    assert!(world.insert_component(e, pos(5.0, 5.0)));
}

#[test]
fn unbounded_world_accepts_many_types() {
    struct C<const N: usize>;

    let mut world = World::with_config(WorldConfig::unbounded());
    let e = world.create();
    assert!(world.insert_component(e, C::<0>));
    assert!(world.insert_component(e, C::<1>));
    assert!(world.insert_component(e, C::<2>));
    assert!(world.insert_component(e, C::<3>));
    assert!(world.insert_component(e, C::<4>));
    assert!(world.insert_component(e, C::<5>));
    assert!(world.insert_component(e, C::<6>));
    assert!(world.insert_component(e, C::<7>));
    assert!(world.insert_component(e, C::<8>));
    assert!(world.has_component::<C<8>>(e));
    assert_eq!(world.archetype(world.archetype_of(e).unwrap()).unwrap().signature().len(), 9);
}

#[test]
fn get_components_in_one_lookup() {
    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, pos(1.0, 2.0));
    world.insert_component(e, Name("probe".into()));

    let (position, velocity, name) = world.get_components::<(Position, Velocity, Name)>(e);
    assert_eq!(position, Some(&pos(1.0, 2.0)));
    assert_eq!(velocity, None);
    assert_eq!(name, Some(&Name("probe".into())));

    world.remove(e);
    let (position,) = world.get_components::<(Position,)>(e);
    assert_eq!(position, None);
}
