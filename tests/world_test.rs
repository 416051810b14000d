// Query and subscription behavior against synthetic record sets.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use albion_radar::info::MobsInfo;
use albion_radar::photon::value::{tag, Value};
use albion_radar::photon::Parameters;
use albion_radar::store::{distance, Outcome, PlayerStore};
use albion_radar::subscription::StoreEvent;
use albion_radar::world::World;

fn id_and_position(id: i64, x: f32, y: f32) -> Parameters {
    [
        (0u8, Value::Int(id as i32)),
        (
            1,
            Value::Array {
                element_tag: tag::FLOAT,
                items: vec![Value::Float(x), Value::Float(y)],
            },
        ),
    ]
    .into_iter()
    .collect()
}

#[test]
fn in_range_matches_brute_force_over_random_sets() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let store = PlayerStore::new();
        let mut placed: Vec<(i64, f32, f32)> = Vec::new();
        for id in 0..200 {
            let x = rng.gen_range(-150.0f32..150.0);
            let y = rng.gen_range(-150.0f32..150.0);
            store.apply_new_character(&id_and_position(id, x, y));
            placed.push((id, x, y));
        }

        let origin = (rng.gen_range(-150.0f32..150.0), rng.gen_range(-150.0f32..150.0));
        let radius = rng.gen_range(0.0f32..200.0);

        let mut expected: Vec<i64> = placed
            .iter()
            .filter(|(_, x, y)| distance(origin, (*x, *y)) <= radius)
            .map(|(id, _, _)| *id)
            .collect();
        expected.sort_unstable();

        let mut actual: Vec<i64> = store
            .in_range(origin, radius)
            .iter()
            .map(|player| player.id)
            .collect();
        actual.sort_unstable();

        assert_eq!(actual, expected);
    }
}

#[test]
fn snapshots_are_stable_copies() {
    let store = PlayerStore::new();
    store.apply_new_character(&id_and_position(1, 0.0, 0.0));

    let before = store.snapshot();
    store.apply_new_character(&id_and_position(2, 5.0, 5.0));
    store.remove(1);

    // The copy taken earlier is unaffected by later mutation
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].id, 1);
    assert_eq!(store.snapshot().len(), 1);
    assert_eq!(store.snapshot()[0].id, 2);
}

#[test]
fn subscribers_see_the_full_lifecycle() {
    let store = PlayerStore::new();
    let mut rx = store.subscribe();

    assert_eq!(
        store.apply_new_character(&id_and_position(42, 0.0, 0.0)),
        Outcome::Created
    );
    assert_eq!(
        store.apply_new_character(&id_and_position(42, 1.0, 1.0)),
        Outcome::Updated
    );
    store.remove(42);

    match rx.try_recv().unwrap() {
        StoreEvent::Created(player) => assert_eq!(player.id, 42),
        other => panic!("expected Created, got {:?}", other),
    }
    match rx.try_recv().unwrap() {
        StoreEvent::Updated(player) => assert_eq!((player.pos_x, player.pos_y), (1.0, 1.0)),
        other => panic!("expected Updated, got {:?}", other),
    }
    match rx.try_recv().unwrap() {
        StoreEvent::Removed { id } => assert_eq!(id, 42),
        other => panic!("expected Removed, got {:?}", other),
    }
}

#[test]
fn eviction_notices_reach_subscribers() {
    let world = World::new(Arc::new(MobsInfo::new()));
    world.update_local_player_position(0.0, 0.0);
    world
        .players()
        .apply_new_character(&id_and_position(1, 500.0, 500.0));

    let mut rx = world.players().subscribe();
    let mut ticks = world.subscribe_ticks();

    assert_eq!(world.evict_out_of_range(80.0), 1);
    assert_eq!(rx.try_recv().unwrap(), StoreEvent::Removed { id: 1 });
    assert_eq!(ticks.try_recv().unwrap().evicted, 1);
}

#[test]
fn local_player_motion_moves_the_query_window() {
    let world = World::new(Arc::new(MobsInfo::new()));
    world.players().apply_new_character(&id_and_position(1, 0.0, 0.0));
    world
        .players()
        .apply_new_character(&id_and_position(2, 1000.0, 0.0));

    world.update_local_player_position(0.0, 0.0);
    let near_origin = world.snapshot_in_range(50.0);
    assert_eq!(near_origin.players.len(), 1);
    assert_eq!(near_origin.players[0].id, 1);

    world.update_local_player_position(1000.0, 0.0);
    let near_far_side = world.snapshot_in_range(50.0);
    assert_eq!(near_far_side.players.len(), 1);
    assert_eq!(near_far_side.players[0].id, 2);
}
