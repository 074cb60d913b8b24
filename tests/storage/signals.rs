//! Integration tests for removal signals
//!
//! Tests when per-component removal handlers fire and how they are
//! connected and disconnected.

use std::cell::RefCell;
use std::rc::Rc;

use strata_foundation::Entity;
use strata_storage::World;

#[derive(Debug)]
struct Position(i32);

#[derive(Debug)]
struct Velocity(i32);

#[derive(Default)]
struct Graveyard {
    buried: Vec<Entity>,
}

impl Graveyard {
    fn bury(&mut self, entity: Entity) {
        self.buried.push(entity);
    }
}

fn recorder() -> (Rc<RefCell<Vec<Entity>>>, impl FnMut(Entity) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    (log, move |entity| sink.borrow_mut().push(entity))
}

// =============================================================================
// Firing
// =============================================================================

#[test]
fn fires_on_remove_component() {
    let mut world = World::new();
    let (log, handler) = recorder();
    assert!(world.connect_on_remove::<Position, _>(handler));

    let e = world.create();
    world.insert_component(e, Position(1));
    world.remove_component::<Position>(e);

    assert_eq!(*log.borrow(), vec![e]);
}

#[test]
fn fires_for_each_component_on_entity_removal() {
    let mut world = World::new();
    let (positions, on_position) = recorder();
    let (velocities, on_velocity) = recorder();
    world.connect_on_remove::<Position, _>(on_position);
    world.connect_on_remove::<Velocity, _>(on_velocity);

    let e = world.create();
    world.insert_component(e, Position(1));
    world.insert_component(e, Velocity(1));
    world.remove(e);

    assert_eq!(*positions.borrow(), vec![e]);
    assert_eq!(*velocities.borrow(), vec![e]);
}

#[test]
fn fires_for_entity_in_last_row() {
    let mut world = World::new();
    let (log, handler) = recorder();
    world.connect_on_remove::<Position, _>(handler);

    let a = world.create();
    let b = world.create();
    world.insert_component(a, Position(1));
    world.insert_component(b, Position(2));

    world.remove(b);
    world.remove(a);
    assert_eq!(*log.borrow(), vec![b, a]);
}

#[test]
fn does_not_fire_on_replace_or_migration() {
    let mut world = World::new();
    let (log, handler) = recorder();
    world.connect_on_remove::<Position, _>(handler);

    let e = world.create();
    world.insert_component(e, Position(1));
    world.insert_component(e, Position(2));
    world.insert_component(e, Velocity(0));
    world.remove_component::<Velocity>(e);

    assert!(log.borrow().is_empty());
}

#[test]
fn does_not_fire_for_missing_component() {
    let mut world = World::new();
    let (log, handler) = recorder();
    world.connect_on_remove::<Position, _>(handler);

    let e = world.create();
    world.insert_component(e, Velocity(1));
    world.remove_component::<Position>(e);
    world.remove(e);

    assert!(log.borrow().is_empty());
}

// =============================================================================
// Connection Management
// =============================================================================

#[test]
fn free_handler_connects_once() {
    fn noop(_: Entity) {}

    let mut world = World::new();
    assert!(world.connect_on_remove::<Position, _>(noop));
    assert!(!world.connect_on_remove::<Position, _>(noop));
    // a different component type has its own signal
    assert!(world.connect_on_remove::<Velocity, _>(noop));

    assert!(world.disconnect_on_remove::<Position, _>(&noop));
    assert!(!world.disconnect_on_remove::<Position, _>(&noop));
}

#[test]
fn disconnect_without_signal_is_noop() {
    fn noop(_: Entity) {}

    let mut world = World::new();
    assert!(!world.disconnect_on_remove::<Position, _>(&noop));
}

#[test]
fn bound_handler_receives_instance() {
    let graveyard = Rc::new(RefCell::new(Graveyard::default()));
    let mut world = World::new();
    assert!(world.connect_on_remove_bound::<Position, _, _>(&graveyard, Graveyard::bury));
    assert!(!world.connect_on_remove_bound::<Position, _, _>(&graveyard, Graveyard::bury));

    let e = world.create();
    world.insert_component(e, Position(0));
    world.remove(e);
    assert_eq!(graveyard.borrow().buried, vec![e]);

    assert!(world.disconnect_on_remove_bound::<Position, _, _>(&graveyard, &Graveyard::bury));
    let f = world.create();
    world.insert_component(f, Position(0));
    world.remove(f);
    assert_eq!(graveyard.borrow().buried, vec![e]);
}

#[test]
fn bound_handler_outlived_by_world() {
    let mut world = World::new();
    {
        let graveyard = Rc::new(RefCell::new(Graveyard::default()));
        world.connect_on_remove_bound::<Position, _, _>(&graveyard, Graveyard::bury);
    }

    let e = world.create();
    world.insert_component(e, Position(0));
    assert!(world.remove(e));
}
