//! Core library for the Tap To Prosper game.
//!
//! The crate holds the round engine: a state machine that spawns tappable
//! objects each round, counts taps, busts objects left untapped and ends the
//! game once too many have been busted. Rendering is left to the caller,
//! which observes the game through [`Snapshot`] and drives time through
//! [`RoundEngine::advance`].

pub mod config;
pub mod engine;
pub mod error;
pub mod position;
pub mod registry;
pub mod snapshot;
pub mod timeline;

pub use config::{GameConfig, SpawnPolicy};
pub use engine::{CommandOutcome, Ignored, Phase, RoundEngine, RoundOutcome, RoundReport};
pub use error::{GameError, Result};
pub use position::{FixedPositions, Position, PositionSource, RngPositions};
pub use registry::{ObjectId, ObjectRegistry, TapOutcome, TappableObject};
pub use snapshot::{ObjectView, Snapshot, GAME_OVER_NOTICE, ROUND_END_NOTICE};
pub use timeline::{PlaybackClock, ScheduledTask, Scheduler, TaskKind, TimerHandle};
