use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    GameConfig, ObjectId, ObjectRegistry, PositionSource, Result, RngPositions, Scheduler,
    Snapshot, TapOutcome, TappableObject, TaskKind, TimerHandle,
};


/// Where the game currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Active,
    RoundEndTransition,
    GameOver,
}

/// Why an input was dropped without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ignored {
    #[error("not accepted while the game is {phase:?}")]
    WrongPhase { phase: Phase },
    #[error("no object with id {id} is in play")]
    UnknownObject { id: ObjectId },
    #[error("object {id} is busted")]
    AlreadyBusted { id: ObjectId },
}

/// Result of a control command (`start`, `restart`, `tick`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Ignored(Ignored),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

/// What follows a round-end transition. Fixed the moment the round ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    NextRound,
    GameOver,
}

/// Summary of one finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub busted_this_round: u32,
    pub cleared_this_round: u32,
    pub total_busted: u32,
    pub outcome: RoundOutcome,
}

/// The round/object state machine.
///
/// All mutation goes through one entry point per event kind: [`start`],
/// [`tap`], [`tick`] and [`restart`]. Timed events are driven by
/// [`advance`], which fires the countdown interval and the round-end delay
/// from an internal virtual clock, so the engine runs identically under a
/// real-time loop and in tests.
///
/// [`start`]: RoundEngine::start
/// [`tap`]: RoundEngine::tap
/// [`tick`]: RoundEngine::tick
/// [`restart`]: RoundEngine::restart
/// [`advance`]: RoundEngine::advance
pub struct RoundEngine {
    config: GameConfig,
    positions: Box<dyn PositionSource>,
    registry: ObjectRegistry,
    scheduler: Scheduler,
    phase: Phase,
    round_number: u32,
    time_remaining: u32,
    total_busted: u32,
    cleared_this_round: u32,
    countdown: Option<TimerHandle>,
    transition: Option<TimerHandle>,
    pending: Option<RoundOutcome>,
    reports: Vec<RoundReport>,
}

impl RoundEngine {
    /// Creates an engine that places objects at random.
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_positions(config, RngPositions::from_entropy())
    }

    /// Creates an engine with an explicit placement source.
    pub fn with_positions<P>(config: GameConfig, positions: P) -> Result<Self>
    where
        P: PositionSource + 'static,
    {
        config.validate()?;
        Ok(Self {
            time_remaining: config.round_duration_secs,
            config,
            positions: Box::new(positions),
            registry: ObjectRegistry::new(),
            scheduler: Scheduler::new(),
            phase: Phase::NotStarted,
            round_number: 1,
            total_busted: 0,
            cleared_this_round: 0,
            countdown: None,
            transition: None,
            pending: None,
            reports: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn total_busted(&self) -> u32 {
        self.total_busted
    }

    /// One missed payment per full group of busted objects.
    pub fn missed_payments(&self) -> u32 {
        self.config.missed_payments(self.total_busted)
    }

    pub fn objects(&self) -> &[TappableObject] {
        self.registry.objects()
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Reports of every round finished in the current game.
    pub fn reports(&self) -> &[RoundReport] {
        &self.reports
    }

    pub fn last_report(&self) -> Option<&RoundReport> {
        self.reports.last()
    }

    /// Decision waiting on the transition delay, if a round just ended.
    pub fn pending_outcome(&self) -> Option<RoundOutcome> {
        self.pending
    }

    /// Time elapsed on the engine's clock.
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.scheduler.now_ms())
    }

    /// Number of timers currently installed.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Time until the next timer fires, if any is installed.
    pub fn until_next_event(&self) -> Option<Duration> {
        self.scheduler
            .next_due()
            .map(|due| Duration::from_millis(due.saturating_sub(self.scheduler.now_ms())))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Begins a new game. Only valid before the first round.
    pub fn start(&mut self) -> CommandOutcome {
        if self.phase != Phase::NotStarted {
            return self.ignore(Ignored::WrongPhase { phase: self.phase });
        }

        self.cancel_timers();
        self.registry.clear();
        self.round_number = 1;
        self.total_busted = 0;
        self.pending = None;
        self.reports.clear();
        self.phase = Phase::Active;
        tracing::info!("game started");
        self.arm_round();
        CommandOutcome::Applied
    }

    /// Returns a finished game to [`Phase::NotStarted`].
    pub fn restart(&mut self) -> CommandOutcome {
        if self.phase != Phase::GameOver {
            return self.ignore(Ignored::WrongPhase { phase: self.phase });
        }

        self.cancel_timers();
        self.scheduler.reset();
        self.registry.clear();
        self.phase = Phase::NotStarted;
        self.round_number = 1;
        self.time_remaining = self.config.round_duration_secs;
        self.total_busted = 0;
        self.cleared_this_round = 0;
        self.pending = None;
        self.reports.clear();
        tracing::info!("game reset");
        CommandOutcome::Applied
    }

    /// Registers one tap on object `id`.
    pub fn tap(&mut self, id: ObjectId) -> TapOutcome {
        if self.phase != Phase::Active {
            let reason = Ignored::WrongPhase { phase: self.phase };
            tracing::debug!(id, %reason, "tap ignored");
            return TapOutcome::Ignored(reason);
        }

        let outcome = self.registry.tap(id, self.config.clearance_taps);
        match outcome {
            TapOutcome::Ignored(reason) => {
                tracing::debug!(id, %reason, "tap ignored");
                return outcome;
            }
            TapOutcome::Cleared { id } => {
                self.cleared_this_round += 1;
                tracing::debug!(id, round = self.round_number, "object cleared");
            }
            TapOutcome::Counted { total_taps, .. } => {
                tracing::debug!(id, total_taps, "tap counted");
            }
        }

        self.check_round_end();
        outcome
    }

    /// One countdown decrement. Normally fired by [`RoundEngine::advance`].
    pub fn tick(&mut self) -> CommandOutcome {
        if self.phase != Phase::Active {
            return self.ignore(Ignored::WrongPhase { phase: self.phase });
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.check_round_end();
        CommandOutcome::Applied
    }

    /// Moves the clock forward by `elapsed`, firing every timer that falls due
    /// on the way in order. Taps for the current instant should be applied
    /// before calling this.
    pub fn advance(&mut self, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let target = self.scheduler.now_ms().saturating_add(elapsed_ms);

        while let Some(task) = self.scheduler.pop_due(target) {
            match task.kind {
                TaskKind::CountdownTick if self.countdown == Some(task.handle) => {
                    self.tick();
                }
                TaskKind::RoundTransition if self.transition == Some(task.handle) => {
                    self.transition = None;
                    self.finish_transition();
                }
                kind => {
                    tracing::debug!(handle = ?task.handle, ?kind, "dropping stale timer");
                    self.scheduler.cancel(task.handle);
                }
            }
        }

        self.scheduler.advance_to(target);
    }

    fn arm_round(&mut self) {
        self.time_remaining = self.config.round_duration_secs;
        self.cleared_this_round = 0;

        let range = self.config.position_range;
        let carried = self.registry.rearm(self.positions.as_mut(), range);
        let count = self.config.spawn.count_for_round(self.round_number);
        self.registry.spawn(count, self.positions.as_mut(), range);

        if let Some(previous) = self.countdown.take() {
            self.scheduler.cancel(previous);
        }
        let period = Duration::from_millis(self.config.tick_interval_ms);
        self.countdown = Some(self.scheduler.schedule_repeating(TaskKind::CountdownTick, period));

        tracing::info!(
            round = self.round_number,
            spawned = count,
            carried,
            "round armed"
        );
    }

    // Both triggers are checked on every event: countdown at zero, or no
    // live object left.
    fn check_round_end(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        if self.time_remaining == 0 || self.registry.live_count() == 0 {
            self.end_round();
        }
    }

    fn end_round(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            self.scheduler.cancel(countdown);
        }

        let busted_this_round = self.registry.bust_untapped();
        self.total_busted += busted_this_round;

        self.cleared_this_round += self.registry.remove_cleared(self.config.clearance_taps);
        if !self.config.carryover {
            self.registry.drop_live();
        }

        let outcome = if self.total_busted > self.config.busted_threshold {
            RoundOutcome::GameOver
        } else {
            RoundOutcome::NextRound
        };
        self.pending = Some(outcome);
        self.reports.push(RoundReport {
            round: self.round_number,
            busted_this_round,
            cleared_this_round: self.cleared_this_round,
            total_busted: self.total_busted,
            outcome,
        });
        self.phase = Phase::RoundEndTransition;

        if let Some(previous) = self.transition.take() {
            self.scheduler.cancel(previous);
        }
        let delay = Duration::from_millis(self.config.transition_delay_ms);
        self.transition = Some(self.scheduler.schedule_once(TaskKind::RoundTransition, delay));

        tracing::info!(
            round = self.round_number,
            busted = busted_this_round,
            cleared = self.cleared_this_round,
            total_busted = self.total_busted,
            ?outcome,
            "round ended"
        );
    }

    fn finish_transition(&mut self) {
        if self.phase != Phase::RoundEndTransition {
            return;
        }

        match self.pending.take() {
            Some(RoundOutcome::GameOver) => {
                self.phase = Phase::GameOver;
                tracing::info!(
                    rounds = self.round_number,
                    total_busted = self.total_busted,
                    missed_payments = self.missed_payments(),
                    "game over"
                );
            }
            Some(RoundOutcome::NextRound) | None => {
                self.round_number += 1;
                self.phase = Phase::Active;
                self.arm_round();
            }
        }
    }

    fn cancel_timers(&mut self) {
        for handle in [self.countdown.take(), self.transition.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(handle);
        }
    }

    fn ignore(&self, reason: Ignored) -> CommandOutcome {
        tracing::debug!(%reason, "command ignored");
        CommandOutcome::Ignored(reason)
    }
}

impl fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundEngine")
            .field("phase", &self.phase)
            .field("round_number", &self.round_number)
            .field("time_remaining", &self.time_remaining)
            .field("total_busted", &self.total_busted)
            .field("objects", &self.registry.len())
            .finish()
    }
}
