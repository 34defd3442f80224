use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// How many fresh objects are appended when a round is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SpawnPolicy {
    /// Round `n` spawns `n` objects. Load grows without a cap.
    Escalating,
    /// Every round spawns the same number of objects.
    Fixed { count: u32 },
}

impl SpawnPolicy {
    pub fn count_for_round(&self, round: u32) -> u32 {
        match *self {
            SpawnPolicy::Escalating => round,
            SpawnPolicy::Fixed { count } => count,
        }
    }
}

/// Named parameters of a game. None of them change while a game is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Countdown start value for every round, in seconds.
    pub round_duration_secs: u32,
    /// Real time between two countdown decrements.
    pub tick_interval_ms: u64,
    /// Pause between the end of a round and the next arm (or game over).
    pub transition_delay_ms: u64,
    /// Cumulative taps that clear an object.
    pub clearance_taps: u32,
    /// The game ends once the busted total strictly exceeds this value.
    pub busted_threshold: u32,
    /// Exclusive upper bound of each position coordinate.
    pub position_range: f32,
    pub spawn: SpawnPolicy,
    /// Whether surviving non-busted objects are re-armed for the next round.
    pub carryover: bool,
    /// Busted objects per missed payment.
    pub payment_group: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 12,
            tick_interval_ms: 1_000,
            transition_delay_ms: 2_000,
            clearance_taps: 3,
            busted_threshold: 10,
            position_range: 75.0,
            spawn: SpawnPolicy::Escalating,
            carryover: true,
            payment_group: 3,
        }
    }
}

impl GameConfig {
    /// One target per round, longer rounds, nothing carried over and an
    /// early game over.
    pub fn single_target() -> Self {
        Self {
            round_duration_secs: 15,
            busted_threshold: 3,
            spawn: SpawnPolicy::Fixed { count: 1 },
            carryover: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.round_duration_secs == 0 {
            return Err(GameError::InvalidConfig("round duration must be at least one second"));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::InvalidConfig("tick interval must be positive"));
        }
        if self.clearance_taps == 0 {
            return Err(GameError::InvalidConfig("clearance needs at least one tap"));
        }
        if self.payment_group == 0 {
            return Err(GameError::InvalidConfig("payment group must be positive"));
        }
        if !self.position_range.is_finite() || self.position_range <= 0.0 {
            return Err(GameError::InvalidConfig("position range must be a positive number"));
        }
        if self.spawn == (SpawnPolicy::Fixed { count: 0 }) {
            return Err(GameError::InvalidConfig("fixed spawn count must be positive"));
        }
        Ok(())
    }

    /// Missed payments implied by a busted total.
    pub fn missed_payments(&self, total_busted: u32) -> u32 {
        total_busted / self.payment_group
    }
}
