// End-to-end decode-and-track scenarios: synthetic datagram bytes in,
// store state out.

use std::sync::Arc;
use std::time::Duration;

use albion_radar::info::MobsInfo;
use albion_radar::photon::frame::{command_type, COMMAND_HEADER_LEN};
use albion_radar::photon::message::encode_event_payload;
use albion_radar::photon::value::{tag, Value};
use albion_radar::photon::Parameters;
use albion_radar::pipeline::{EventCode, Pipeline};
use albion_radar::world::World;

// ── Synthetic frame builders ─────────────────────────────────────────────────

fn build_frame(peer_id: u16, commands: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&peer_id.to_be_bytes());
    frame.push(0); // flags
    frame.push(commands.len() as u8);
    frame.extend_from_slice(&0u32.to_be_bytes()); // timestamp
    frame.extend_from_slice(&0u32.to_be_bytes()); // challenge
    for (index, (command_type, payload)) in commands.iter().enumerate() {
        frame.push(*command_type);
        frame.push(0); // channel
        frame.push(0); // command flags
        frame.push(0); // reserved
        frame.extend_from_slice(&((payload.len() + COMMAND_HEADER_LEN) as u32).to_be_bytes());
        frame.extend_from_slice(&(index as u32 + 1).to_be_bytes());
        frame.extend_from_slice(payload);
    }
    frame
}

fn fragment_command(
    start: u32,
    count: u32,
    number: u32,
    total: u32,
    offset: u32,
    data: &[u8],
) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&start.to_be_bytes());
    payload.extend_from_slice(&count.to_be_bytes());
    payload.extend_from_slice(&number.to_be_bytes());
    payload.extend_from_slice(&total.to_be_bytes());
    payload.extend_from_slice(&offset.to_be_bytes());
    payload.extend_from_slice(data);
    payload
}

fn position(x: f32, y: f32) -> Value {
    Value::Array {
        element_tag: tag::FLOAT,
        items: vec![Value::Float(x), Value::Float(y)],
    }
}

fn new_pipeline() -> Pipeline {
    new_pipeline_with_ttl(Duration::from_secs(10))
}

fn new_pipeline_with_ttl(ttl: Duration) -> Pipeline {
    let world = Arc::new(World::new(Arc::new(MobsInfo::new())));
    Pipeline::new(world, ttl)
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn new_character_datagram_lands_in_the_player_store() {
    let mut pipeline = new_pipeline();

    let params: Parameters = [
        (0u8, Value::Int(42)),
        (1, position(10.0, -5.0)),
        (2, Value::String("Foo".into())),
    ]
    .into_iter()
    .collect();
    let payload = encode_event_payload(EventCode::NewCharacter as u8, &params);
    let frame = build_frame(0x0001, &[(command_type::RELIABLE, payload)]);

    pipeline.process_datagram(&frame);

    let players = pipeline.world().players().snapshot();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].id, 42);
    assert_eq!((players[0].pos_x, players[0].pos_y), (10.0, -5.0));
    assert_eq!(players[0].nickname, "Foo");
}

#[test]
fn replaying_the_identical_datagram_is_idempotent() {
    let mut pipeline = new_pipeline();
    let params: Parameters = [(0u8, Value::Int(42)), (1, position(10.0, -5.0))]
        .into_iter()
        .collect();
    let payload = encode_event_payload(EventCode::NewCharacter as u8, &params);
    let frame = build_frame(1, &[(command_type::RELIABLE, payload)]);

    pipeline.process_datagram(&frame);
    pipeline.process_datagram(&frame);

    let players = pipeline.world().players().snapshot();
    assert_eq!(players.len(), 1);
    assert_eq!((players[0].pos_x, players[0].pos_y), (10.0, -5.0));
}

#[test]
fn fragmented_event_reassembles_out_of_order() {
    let mut pipeline = new_pipeline();

    let params: Parameters = [
        (0u8, Value::Int(42)),
        (1, position(10.0, -5.0)),
        (2, Value::String("Foo".into())),
    ]
    .into_iter()
    .collect();
    let payload = encode_event_payload(EventCode::NewCharacter as u8, &params);
    let split = payload.len() / 2;
    let total = payload.len() as u32;

    let late = fragment_command(1, 2, 1, total, split as u32, &payload[split..]);
    let early = fragment_command(1, 2, 0, total, 0, &payload[..split]);

    // Second half first, in its own datagram
    pipeline.process_datagram(&build_frame(1, &[(command_type::FRAGMENT, late)]));
    assert!(pipeline.world().players().is_empty());

    pipeline.process_datagram(&build_frame(1, &[(command_type::FRAGMENT, early)]));
    let players = pipeline.world().players().snapshot();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].nickname, "Foo");
}

#[test]
fn incomplete_fragment_set_past_expiry_mutates_nothing() {
    let mut pipeline = new_pipeline_with_ttl(Duration::from_millis(0));

    let params: Parameters = [(0u8, Value::Int(42)), (1, position(10.0, -5.0))]
        .into_iter()
        .collect();
    let payload = encode_event_payload(EventCode::NewCharacter as u8, &params);
    let split = payload.len() / 2;
    let total = payload.len() as u32;

    let first_half = fragment_command(1, 2, 0, total, 0, &payload[..split]);
    pipeline.process_datagram(&build_frame(1, &[(command_type::FRAGMENT, first_half)]));

    // Any later datagram triggers the opportunistic purge
    pipeline.process_datagram(&build_frame(1, &[(command_type::PING, Vec::new())]));
    assert_eq!(pipeline.metrics().snapshot().expired_fragment_sets, 1);

    // The second half now belongs to a dead set; nothing reaches the store
    let second_half = fragment_command(1, 2, 1, total, split as u32, &payload[split..]);
    pipeline.process_datagram(&build_frame(1, &[(command_type::FRAGMENT, second_half)]));
    assert!(pipeline.world().players().is_empty());
}

#[test]
fn leave_event_removes_from_every_holding_store() {
    let mut pipeline = new_pipeline();

    let character: Parameters = [(0u8, Value::Int(42)), (1, position(0.0, 0.0))]
        .into_iter()
        .collect();
    let mob: Parameters = [(0u8, Value::Int(43)), (1, position(1.0, 1.0))]
        .into_iter()
        .collect();
    pipeline.process_datagram(&build_frame(
        1,
        &[
            (
                command_type::RELIABLE,
                encode_event_payload(EventCode::NewCharacter as u8, &character),
            ),
            (
                command_type::RELIABLE,
                encode_event_payload(EventCode::NewMob as u8, &mob),
            ),
        ],
    ));
    let world = pipeline.world();
    assert_eq!(world.players().len(), 1);
    assert_eq!(world.mobs().len(), 1);

    let leave: Parameters = [(0u8, Value::Int(42))].into_iter().collect();
    pipeline.process_datagram(&build_frame(
        1,
        &[(
            command_type::RELIABLE,
            encode_event_payload(EventCode::Leave as u8, &leave),
        )],
    ));

    assert!(world.players().is_empty());
    // Other ids are untouched
    assert_eq!(world.mobs().len(), 1);

    // Leave for an id nobody holds is a no-op
    let ghost: Parameters = [(0u8, Value::Int(999))].into_iter().collect();
    pipeline.process_datagram(&build_frame(
        1,
        &[(
            command_type::RELIABLE,
            encode_event_payload(EventCode::Leave as u8, &ghost),
        )],
    ));
    assert_eq!(world.mobs().len(), 1);
}

#[test]
fn duplicate_harvestable_create_reflects_the_second_charge_count() {
    let mut pipeline = new_pipeline();

    let with_charges = |charges: u8| -> Vec<u8> {
        let params: Parameters = [
            (0u8, Value::Int(10)),
            (5, Value::Byte(3)),
            (7, Value::Byte(4)),
            (8, position(1.0, 2.0)),
            (11, Value::Byte(charges)),
        ]
        .into_iter()
        .collect();
        encode_event_payload(EventCode::NewHarvestableObject as u8, &params)
    };

    pipeline.process_datagram(&build_frame(1, &[(command_type::RELIABLE, with_charges(1))]));
    pipeline.process_datagram(&build_frame(1, &[(command_type::RELIABLE, with_charges(3))]));

    let nodes = pipeline.world().harvestables().snapshot();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].charges, 3);
}

#[test]
fn batched_harvestable_list_in_one_datagram() {
    let mut pipeline = new_pipeline();

    let params: Parameters = [
        (0u8, Value::IntArray(vec![100, 101, 102])),
        (1, Value::ByteArray(vec![3, 12, 24])),
        (2, Value::ByteArray(vec![4, 5, 6])),
        (
            3,
            Value::Array {
                element_tag: tag::FLOAT,
                items: vec![
                    Value::Float(1.0),
                    Value::Float(2.0),
                    Value::Float(3.0),
                    Value::Float(4.0),
                    Value::Float(5.0),
                    Value::Float(6.0),
                ],
            },
        ),
        (4, Value::ByteArray(vec![7, 9, 11])),
    ]
    .into_iter()
    .collect();
    let payload = encode_event_payload(EventCode::NewSimpleHarvestableObjectList as u8, &params);

    pipeline.process_datagram(&build_frame(1, &[(command_type::RELIABLE, payload)]));
    assert_eq!(pipeline.world().harvestables().len(), 3);
}

#[test]
fn mixed_frame_with_control_commands_processes_only_messages() {
    let mut pipeline = new_pipeline();

    let cage: Parameters = [(0u8, Value::Int(7)), (1, position(0.0, 0.0))]
        .into_iter()
        .collect();
    pipeline.process_datagram(&build_frame(
        1,
        &[
            (command_type::ACK, vec![0u8; 8]),
            (
                command_type::UNRELIABLE,
                encode_event_payload(EventCode::NewCage as u8, &cage),
            ),
            (command_type::PING, Vec::new()),
        ],
    ));

    assert_eq!(pipeline.world().cages().len(), 1);
    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.commands, 1);
    assert_eq!(snapshot.events_routed, 1);
}
