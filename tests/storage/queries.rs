//! Integration tests for queries
//!
//! Tests archetype matching, row order, mutable iteration, and
//! duplicate detection.

use std::collections::BTreeSet;

use strata_foundation::{Entity, ErrorKind};
use strata_storage::World;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(i32, i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(i32, i32);

#[derive(Debug, PartialEq)]
struct Sleeping;

fn spawn(world: &mut World, p: Option<Position>, v: Option<Velocity>) -> Entity {
    let e = world.create();
    if let Some(p) = p {
        world.insert_component(e, p);
    }
    if let Some(v) = v {
        world.insert_component(e, v);
    }
    e
}

// =============================================================================
// Shared Queries
// =============================================================================

#[test]
fn query_matches_supersets_only() {
    let mut world = World::new();
    let both = spawn(&mut world, Some(Position(0, 0)), Some(Velocity(1, 1)));
    let still = spawn(&mut world, Some(Position(5, 5)), None);
    let ghost = spawn(&mut world, None, Some(Velocity(2, 2)));
    let sleeper = spawn(&mut world, Some(Position(9, 9)), Some(Velocity(0, 0)));
    world.insert_component(sleeper, Sleeping);

    let moving: BTreeSet<_> = world
        .iter::<(Position, Velocity)>()
        .map(|(e, _, _)| e)
        .collect();
    assert_eq!(moving, BTreeSet::from([both, sleeper]));

    let placed: BTreeSet<_> = world.iter::<(Position,)>().map(|(e, _)| e).collect();
    assert_eq!(placed, BTreeSet::from([both, still, sleeper]));

    let velocities: BTreeSet<_> = world.iter::<(Velocity,)>().map(|(e, _)| e).collect();
    assert_eq!(velocities, BTreeSet::from([both, ghost, sleeper]));
}

#[test]
fn query_items_follow_request_order() {
    let mut world = World::new();
    let e = spawn(&mut world, Some(Position(1, 2)), Some(Velocity(3, 4)));

    let items: Vec<_> = world.iter::<(Velocity, Position)>().collect();
    assert_eq!(items, vec![(e, &Velocity(3, 4), &Position(1, 2))]);
}

#[test]
fn query_within_archetype_follows_row_order() {
    let mut world = World::new();
    let entities: Vec<_> = (0..4)
        .map(|i| spawn(&mut world, Some(Position(i, 0)), None))
        .collect();

    let seen: Vec<_> = world.iter::<(Position,)>().map(|(e, _)| e).collect();
    assert_eq!(seen, entities);
}

#[test]
fn query_skips_emptied_archetypes() {
    let mut world = World::new();
    let e = spawn(&mut world, Some(Position(0, 0)), Some(Velocity(0, 0)));
    world.remove(e);

    assert_eq!(world.iter::<(Position, Velocity)>().count(), 0);
    assert_eq!(world.archetype_count(), 3);
}

#[test]
fn query_over_unknown_type_is_empty() {
    struct NeverInserted;

    let mut world = World::new();
    spawn(&mut world, Some(Position(0, 0)), None);
    assert_eq!(world.iter::<(NeverInserted,)>().count(), 0);
    assert_eq!(world.iter::<(Position, NeverInserted)>().count(), 0);
}

#[test]
fn shared_query_allows_repeated_type() {
    let mut world = World::new();
    spawn(&mut world, Some(Position(7, 7)), None);

    let items: Vec<_> = world.iter::<(Position, Position)>().collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].1, items[0].2);
}

#[test]
fn wide_query() {
    struct A(u8);
    struct B(u8);
    struct C(u8);
    struct D(u8);
    struct E(u8);
    struct F(u8);
    struct G(u8);
    struct H(u8);

    let mut world = World::new();
    let e = world.create();
    world.insert_component(e, A(1));
    world.insert_component(e, B(2));
    world.insert_component(e, C(3));
    world.insert_component(e, D(4));
    world.insert_component(e, E(5));
    world.insert_component(e, F(6));
    world.insert_component(e, G(7));
    world.insert_component(e, H(8));

    let sums: Vec<u8> = world
        .iter::<(A, B, C, D, E, F, G, H)>()
        .map(|(_, a, b, c, d, e, f, g, h)| a.0 + b.0 + c.0 + d.0 + e.0 + f.0 + g.0 + h.0)
        .collect();
    assert_eq!(sums, vec![36]);
}

// =============================================================================
// Mutable Queries
// =============================================================================

#[test]
fn iter_mut_updates_every_match() {
    let mut world = World::new();
    let a = spawn(&mut world, Some(Position(0, 0)), Some(Velocity(1, 2)));
    let b = spawn(&mut world, Some(Position(10, 10)), Some(Velocity(-1, 0)));
    let still = spawn(&mut world, Some(Position(5, 5)), None);

    for (_, position, velocity) in world.iter_mut::<(Position, Velocity)>().unwrap() {
        position.0 += velocity.0;
        position.1 += velocity.1;
    }

    assert_eq!(world.get_component::<Position>(a), Some(&Position(1, 2)));
    assert_eq!(world.get_component::<Position>(b), Some(&Position(9, 10)));
    assert_eq!(world.get_component::<Position>(still), Some(&Position(5, 5)));
}

#[test]
fn iter_mut_spans_archetypes() {
    let mut world = World::new();
    let plain = spawn(&mut world, Some(Position(0, 0)), None);
    let moving = spawn(&mut world, Some(Position(0, 0)), Some(Velocity(0, 0)));

    for (_, position) in world.iter_mut::<(Position,)>().unwrap() {
        position.0 = 42;
    }

    assert_eq!(world.get_component::<Position>(plain), Some(&Position(42, 0)));
    assert_eq!(world.get_component::<Position>(moving), Some(&Position(42, 0)));
}

#[test]
fn iter_mut_rejects_repeated_type() {
    let mut world = World::new();
    spawn(&mut world, Some(Position(0, 0)), Some(Velocity(0, 0)));

    let err = world.iter_mut::<(Position, Velocity, Position)>().err().unwrap();
    assert!(matches!(err.kind, ErrorKind::DuplicateQueryComponent(name) if name.ends_with("Position")));
}
