use serde::{Deserialize, Serialize};

use crate::{ObjectId, Phase, Position, RoundEngine};

pub const ROUND_END_NOTICE: &str = "Starting Next Round!";
pub const GAME_OVER_NOTICE: &str = "Game Over";

/// What a presentation layer needs to draw one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    pub id: ObjectId,
    pub busted: bool,
    pub position: Position,
    pub total_taps: u32,
    pub round_taps: u32,
}

/// Read-only copy of the observable game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub round_number: u32,
    pub time_remaining: u32,
    pub total_busted: u32,
    pub missed_payments: u32,
    /// Banner text for the transition and game-over screens.
    pub notice: Option<String>,
    pub objects: Vec<ObjectView>,
}

impl Snapshot {
    pub fn capture(engine: &RoundEngine) -> Self {
        let notice = match engine.phase() {
            Phase::RoundEndTransition => Some(ROUND_END_NOTICE.to_string()),
            Phase::GameOver => Some(GAME_OVER_NOTICE.to_string()),
            Phase::NotStarted | Phase::Active => None,
        };

        Self {
            phase: engine.phase(),
            round_number: engine.round_number(),
            time_remaining: engine.time_remaining(),
            total_busted: engine.total_busted(),
            missed_payments: engine.missed_payments(),
            notice,
            objects: engine
                .objects()
                .iter()
                .map(|object| ObjectView {
                    id: object.id,
                    busted: object.busted,
                    position: object.position,
                    total_taps: object.total_taps,
                    round_taps: object.round_taps,
                })
                .collect(),
        }
    }

    pub fn live_objects(&self) -> impl Iterator<Item = &ObjectView> {
        self.objects.iter().filter(|object| !object.busted)
    }
}
