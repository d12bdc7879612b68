//! End-to-end ECS scenarios: entity migration across archetypes, column
//! compaction, views over mixed archetypes and registry generations.

use plinth::ecs::Registry;

#[derive(Debug, Default, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Label(String);

#[test]
fn migration_keeps_component_values() {
    let mut registry = Registry::new();
    let entity = registry.add_entity().unwrap();

    registry.add_components(entity, (7i32,)).unwrap();
    registry.add_components(entity, (2.5f32,)).unwrap();

    assert_eq!(registry.get_entity_component::<i32>(entity).unwrap(), &7);
    assert_eq!(registry.get_entity_component::<f32>(entity).unwrap(), &2.5);
}

#[test]
fn compaction_preserves_the_surviving_entity() {
    let mut registry = Registry::new();

    let first = registry.add_entity().unwrap();
    let second = registry.add_entity().unwrap();

    registry
        .add_components(
            first,
            (Position { x: 1.0, y: 1.0 }, Label(String::from("first"))),
        )
        .unwrap();
    registry
        .add_components(
            second,
            (Position { x: 2.0, y: 2.0 }, Label(String::from("second"))),
        )
        .unwrap();

    // Two entities share one archetype; removing the first swaps the
    // second into its row.
    assert_eq!(registry.archetype_count(), 1);

    registry.remove_entity(first);

    assert!(!registry.has_entity(first));
    assert_eq!(
        registry.get_entity_component::<Position>(second).unwrap(),
        &Position { x: 2.0, y: 2.0 }
    );
    assert_eq!(
        registry.get_entity_component::<Label>(second).unwrap(),
        &Label(String::from("second"))
    );
}

#[test]
fn migration_between_shared_archetypes() {
    let mut registry = Registry::new();
    let mut entities = Vec::new();

    for i in 0..10 {
        let entity = registry.add_entity().unwrap();
        registry
            .add_components(
                entity,
                (Position {
                    x: i as f32,
                    y: 0.0,
                },),
            )
            .unwrap();
        entities.push(entity);
    }

    // Give half of them a velocity, splitting the population in two.
    for entity in entities.iter().step_by(2) {
        registry
            .add_components(*entity, (Velocity { dx: 1.0, dy: 0.0 },))
            .unwrap();
    }

    assert_eq!(registry.archetype_count(), 2);

    for (i, entity) in entities.iter().enumerate() {
        let position = registry.get_entity_component::<Position>(*entity).unwrap();
        assert_eq!(position.x, i as f32);

        assert_eq!(
            registry.has_components::<(Velocity,)>(*entity),
            i % 2 == 0
        );
    }
}

#[test]
fn remove_components_moves_entity_back() {
    let mut registry = Registry::new();
    let entity = registry.add_entity().unwrap();

    registry
        .add_components(
            entity,
            (
                Position { x: 3.0, y: 4.0 },
                Velocity { dx: 1.0, dy: 1.0 },
                Label(String::from("runner")),
            ),
        )
        .unwrap();

    registry.remove_components::<(Velocity,)>(entity).unwrap();

    assert!(!registry.has_any_components::<(Velocity,)>(entity));
    assert_eq!(
        registry.get_entity_component::<Position>(entity).unwrap(),
        &Position { x: 3.0, y: 4.0 }
    );
    assert_eq!(
        registry.get_entity_component::<Label>(entity).unwrap(),
        &Label(String::from("runner"))
    );
}

#[test]
fn views_span_every_matching_archetype() {
    let mut registry = Registry::new();

    for i in 0..6 {
        let entity = registry.add_entity().unwrap();

        if i % 2 == 0 {
            registry
                .add_components(
                    entity,
                    (
                        Position {
                            x: i as f32,
                            y: 0.0,
                        },
                        Velocity { dx: 1.0, dy: 0.0 },
                    ),
                )
                .unwrap();
        } else {
            registry
                .add_components(
                    entity,
                    (Position {
                        x: i as f32,
                        y: 0.0,
                    },),
                )
                .unwrap();
        }
    }

    let positions = registry.view::<(Position,)>().unwrap();
    assert_eq!(positions.size(), 6);

    let mut sum = 0.0;
    positions
        .iterate(|(position,)| {
            sum += position.x;
        })
        .unwrap();
    assert_eq!(sum, 15.0);

    let moving = registry.view::<(Position, Velocity)>().unwrap();
    assert_eq!(moving.size(), 3);

    let mut batch_total = 0;
    moving
        .iterate_archetypes(|(positions, velocities)| {
            assert_eq!(positions.items().len(), velocities.items().len());
            batch_total += positions.items().len();
        })
        .unwrap();
    assert_eq!(batch_total, 3);
}

#[test]
fn clear_invalidates_old_generation() {
    let mut registry = Registry::new();

    let old = registry.add_entity().unwrap();
    registry.add_components(old, (Position::default(),)).unwrap();

    registry.clear();

    assert!(!registry.has_entity(old));

    let new = registry.add_entity().unwrap();
    registry.add_components(new, (Position::default(),)).unwrap();

    // Same id, different generation: the stale handle matches nothing.
    assert_eq!(new.value(), old.value());
    assert_ne!(new, old);
    assert!(registry.has_entity(new));
    assert!(!registry.has_entity(old));
    assert!(registry.get_entity_component::<Position>(old).is_err());
}

#[test]
fn churn_keeps_columns_consistent() {
    let mut registry = Registry::new();
    let mut alive = Vec::new();

    for round in 0..20u32 {
        for i in 0..10u32 {
            let entity = registry.add_entity().unwrap();
            registry
                .add_components(
                    entity,
                    (Position {
                        x: (round * 10 + i) as f32,
                        y: 0.0,
                    },),
                )
                .unwrap();
            alive.push((entity, (round * 10 + i) as f32));
        }

        // Remove every third entity created so far.
        let mut index = 0;
        alive.retain(|(entity, _)| {
            index += 1;
            if index % 3 == 0 {
                registry.remove_entity(*entity);
                false
            } else {
                true
            }
        });
    }

    let view = registry.view::<(Position,)>().unwrap();
    assert_eq!(view.size(), alive.len());

    for (entity, x) in &alive {
        assert_eq!(
            registry.get_entity_component::<Position>(*entity).unwrap().x,
            *x
        );
    }
}
