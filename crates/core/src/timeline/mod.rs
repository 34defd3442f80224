use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Virtual clock in whole milliseconds. The engine only ever moves it
/// forward, through [`Scheduler::pop_due`] and [`Scheduler::advance_to`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    pub now_ms: u64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.now_ms = 0;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.now_ms = self.now_ms.saturating_add(duration_ms(delta));
    }
}

/// Opaque handle returned for every scheduled task. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// One countdown decrement.
    CountdownTick,
    /// Leave the round-end transition (next round or game over).
    RoundTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub due_ms: u64,
    pub handle: TimerHandle,
    pub kind: TaskKind,
    /// `Some(period)` for repeating tasks.
    pub period_ms: Option<u64>,
}

/// Cooperative scheduler for the two timer kinds the round engine needs: a
/// repeating countdown interval and a one-shot transition delay.
#[derive(Debug, Default)]
pub struct Scheduler {
    clock: PlaybackClock,
    tasks: Vec<ScheduledTask>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.tasks.iter().any(|task| task.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Schedules `kind` to fire every `period`, first one period from now.
    pub fn schedule_repeating(&mut self, kind: TaskKind, period: Duration) -> TimerHandle {
        let period_ms = duration_ms(period).max(1);
        self.insert(kind, period_ms, Some(period_ms))
    }

    /// Schedules `kind` to fire once after `delay`.
    pub fn schedule_once(&mut self, kind: TaskKind, delay: Duration) -> TimerHandle {
        self.insert(kind, duration_ms(delay), None)
    }

    /// Drops the task behind `handle`. Stale or unknown handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.handle != handle);
        before != self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Instant of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.first().map(|task| task.due_ms)
    }

    /// Removes and returns the earliest task due at or before `until_ms`,
    /// moving the clock to its due time. Repeating tasks are queued again one
    /// period later under the same handle, unless that lies past the end of
    /// the clock.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTask> {
        let task = *self.tasks.first()?;
        if task.due_ms > until_ms {
            return None;
        }
        self.tasks.remove(0);
        self.clock.now_ms = self.clock.now_ms.max(task.due_ms);
        if let Some(next) = task.period_ms.and_then(|period| task.due_ms.checked_add(period)) {
            self.enqueue(ScheduledTask {
                due_ms: next,
                ..task
            });
        }
        Some(task)
    }

    /// Moves the clock forward to `target_ms` without firing anything.
    pub fn advance_to(&mut self, target_ms: u64) {
        if target_ms > self.clock.now_ms {
            self.clock.advance(Duration::from_millis(target_ms - self.clock.now_ms));
        }
    }

    pub fn reset(&mut self) {
        self.tasks.clear();
        self.clock.reset();
    }

    fn insert(&mut self, kind: TaskKind, delay_ms: u64, period_ms: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.enqueue(ScheduledTask {
            due_ms: self.clock.now_ms.saturating_add(delay_ms),
            handle,
            kind,
            period_ms,
        });
        tracing::debug!(?handle, ?kind, delay_ms, "scheduled task");
        handle
    }

    // Tasks stay sorted by due time; equal due times keep insertion order.
    fn enqueue(&mut self, task: ScheduledTask) {
        let index = self.tasks.partition_point(|queued| queued.due_ms <= task.due_ms);
        self.tasks.insert(index, task);
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule_once(TaskKind::RoundTransition, ms(2_000));
        let early = scheduler.schedule_repeating(TaskKind::CountdownTick, ms(1_000));

        let first = scheduler.pop_due(5_000).unwrap();
        assert_eq!(first.handle, early);
        assert_eq!(scheduler.now_ms(), 1_000);

        // The repeat at 2000 was queued after the one-shot, so it fires second.
        let second = scheduler.pop_due(5_000).unwrap();
        assert_eq!(second.handle, late);
        let third = scheduler.pop_due(5_000).unwrap();
        assert_eq!(third.handle, early);
        assert_eq!(third.due_ms, 2_000);
    }

    #[test]
    fn nothing_fires_before_its_due_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(TaskKind::RoundTransition, ms(2_000));
        assert!(scheduler.pop_due(1_999).is_none());
        assert_eq!(scheduler.now_ms(), 0);
        assert!(scheduler.pop_due(2_000).is_some());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(TaskKind::CountdownTick, ms(1_000));
        assert!(scheduler.cancel(tick));
        assert!(!scheduler.cancel(tick));
        assert!(!scheduler.is_scheduled(tick));
        assert!(scheduler.pop_due(10_000).is_none());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule_once(TaskKind::RoundTransition, ms(10));
        scheduler.cancel(first);
        let second = scheduler.schedule_once(TaskKind::RoundTransition, ms(10));
        assert_ne!(first, second);
    }

    #[test]
    fn advance_to_only_moves_forward() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(500);
        scheduler.advance_to(200);
        assert_eq!(scheduler.now_ms(), 500);

        let handle = scheduler.schedule_once(TaskKind::RoundTransition, ms(100));
        let task = scheduler.pop_due(u64::MAX).unwrap();
        assert_eq!(task.handle, handle);
        assert_eq!(task.due_ms, 600);
    }

    #[test]
    fn huge_delays_saturate_instead_of_overflowing() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(5_000);
        let once = scheduler.schedule_once(TaskKind::RoundTransition, Duration::MAX);
        let repeating = scheduler.schedule_repeating(TaskKind::CountdownTick, ms(u64::MAX));
        assert_eq!(scheduler.next_due(), Some(u64::MAX));
        assert!(scheduler.pop_due(u64::MAX - 1).is_none());

        assert_eq!(scheduler.pop_due(u64::MAX).unwrap().handle, once);
        assert_eq!(scheduler.pop_due(u64::MAX).unwrap().handle, repeating);
        // No repeat fits after the end of the clock.
        assert!(scheduler.pop_due(u64::MAX).is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn reset_rewinds_clock_and_drops_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TaskKind::CountdownTick, ms(1_000));
        scheduler.pop_due(1_000);
        scheduler.reset();
        assert_eq!(scheduler.now_ms(), 0);
        assert_eq!(scheduler.next_due(), None);
    }
}
