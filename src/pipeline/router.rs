use tracing::trace;

use crate::photon::Message;
use crate::pipeline::PipelineMetrics;
use crate::store::Outcome;
use crate::world::World;

/// Event codes the tracker consumes.
///
/// The numeric values are the wire contract; they mirror the game client's
/// dispatch table and must match a captured trace exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    NewCharacter = 1,
    NewSimpleHarvestableObjectList = 2,
    NewMob = 3,
    NewLootChest = 4,
    NewRandomDungeonExit = 5,
    NewFishingZone = 6,
    NewCage = 7,
    Leave = 8,
    Move = 9,
    HealthUpdate = 10,
    NewHarvestableObject = 11,
    HarvestableChangeState = 12,
    HarvestFinished = 13,
    Mounted = 14,
    FishingEnd = 15,
    CageOpened = 16,
}

impl EventCode {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => EventCode::NewCharacter,
            2 => EventCode::NewSimpleHarvestableObjectList,
            3 => EventCode::NewMob,
            4 => EventCode::NewLootChest,
            5 => EventCode::NewRandomDungeonExit,
            6 => EventCode::NewFishingZone,
            7 => EventCode::NewCage,
            8 => EventCode::Leave,
            9 => EventCode::Move,
            10 => EventCode::HealthUpdate,
            11 => EventCode::NewHarvestableObject,
            12 => EventCode::HarvestableChangeState,
            13 => EventCode::HarvestFinished,
            14 => EventCode::Mounted,
            15 => EventCode::FishingEnd,
            16 => EventCode::CageOpened,
            _ => return None,
        })
    }
}

/// Hands a decoded message to the store that owns its semantics.
///
/// Pure dispatch: the only logic here is the code table. Operation
/// requests and responses carry nothing the tracker consumes and are
/// counted and dropped.
pub fn route(world: &World, message: &Message, metrics: &PipelineMetrics) {
    let (code, parameters) = match message {
        Message::Event { code, parameters } => (*code, parameters),
        Message::OperationRequest { .. } | Message::OperationResponse { .. } => {
            metrics.record_operation_skipped();
            return;
        }
    };

    let Some(event) = EventCode::from_code(code) else {
        metrics.record_unroutable_code();
        trace!(code = code, "dropped unroutable event code");
        return;
    };
    metrics.record_event_routed();

    match event {
        EventCode::NewCharacter => {
            world.players().apply_new_character(parameters);
        }
        EventCode::NewSimpleHarvestableObjectList => {
            world.harvestables().apply_new_list(parameters);
        }
        EventCode::NewMob => {
            world.mobs().apply_new_mob(parameters);
        }
        EventCode::NewLootChest => {
            world.chests().apply_new_chest(parameters);
        }
        EventCode::NewRandomDungeonExit => {
            world.dungeons().apply_new_dungeon(parameters);
        }
        EventCode::NewFishingZone => {
            world.fishing().apply_new_zone(parameters);
        }
        EventCode::NewCage => {
            world.cages().apply_new_cage(parameters);
        }
        EventCode::Leave => {
            if let Some(id) = parameters.int(0) {
                world.remove_everywhere(id);
            }
        }
        EventCode::Move => {
            // Ids are disjoint across kinds; whichever store knows the id
            // takes the update.
            if world.players().apply_move(parameters) == Outcome::Ignored {
                world.mobs().apply_move(parameters);
            }
        }
        EventCode::HealthUpdate => {
            if world.players().apply_health_update(parameters) == Outcome::Ignored {
                world.mobs().apply_health_update(parameters);
            }
        }
        EventCode::NewHarvestableObject => {
            world.harvestables().apply_new_object(parameters);
        }
        EventCode::HarvestableChangeState => {
            world.harvestables().apply_change_state(parameters);
        }
        EventCode::HarvestFinished => {
            world.harvestables().apply_harvest_finished(parameters);
        }
        EventCode::Mounted => {
            world.players().apply_mounted(parameters);
        }
        EventCode::FishingEnd => {
            world.fishing().apply_fishing_end(parameters);
        }
        EventCode::CageOpened => {
            world.cages().apply_opened(parameters);
        }
    }
}
