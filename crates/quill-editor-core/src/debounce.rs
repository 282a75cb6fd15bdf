//! Debounce scheduler.
//!
//! Coalesces bursts of edits into a single check. The scheduler owns no timer:
//! callers pass the current `Instant` in and get deadlines and generations
//! back, then drive whatever timer primitive their platform has
//! (`setTimeout`, `tokio::time::sleep_until`, a test loop).

use std::time::Duration;

use web_time::Instant;

/// Quiet period after a keystroke.
pub const DEFAULT_TYPING_QUIET: Duration = Duration::from_millis(50);
/// Quiet period after a paste; the pasted text is already final.
pub const DEFAULT_PASTE_QUIET: Duration = Duration::from_millis(10);

/// What kind of edit re-armed the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EditKind {
    #[default]
    Typing,
    Paste,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    pub typing: Duration,
    pub paste: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            typing: DEFAULT_TYPING_QUIET,
            paste: DEFAULT_PASTE_QUIET,
        }
    }
}

impl DebounceConfig {
    pub fn from_millis(typing_ms: u64, paste_ms: u64) -> Self {
        Self {
            typing: Duration::from_millis(typing_ms),
            paste: Duration::from_millis(paste_ms),
        }
    }

    pub fn quiet_period(&self, kind: EditKind) -> Duration {
        match kind {
            EditKind::Typing => self.typing,
            EditKind::Paste => self.paste,
        }
    }
}

/// Identifies one arming of the scheduler. A timer only counts if it carries
/// the generation that is currently armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    Armed {
        deadline: Instant,
        generation: Generation,
    },
    /// The timer fired and the check for `generation` is being dispatched.
    Firing { generation: Generation },
}

/// Handed back on every arm so the caller can schedule its timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerTicket {
    pub generation: Generation,
    pub deadline: Instant,
    pub delay: Duration,
}

#[derive(Debug, Default)]
pub struct DebounceScheduler {
    config: DebounceConfig,
    state: DebounceState,
    next_generation: u64,
}

impl DebounceScheduler {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: DebounceState::Idle,
            next_generation: 0,
        }
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DebounceConfig) {
        self.config = config;
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DebounceState::Armed { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Armed { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Record an edit: cancel whatever was armed and arm a fresh quiet period.
    pub fn on_edit(&mut self, kind: EditKind, now: Instant) -> TimerTicket {
        self.next_generation += 1;
        let generation = Generation(self.next_generation);
        let delay = self.config.quiet_period(kind);
        let deadline = now + delay;

        if let DebounceState::Armed {
            generation: previous,
            ..
        } = self.state
        {
            tracing::trace!(target: "quill::debounce", ?previous, ?generation, "re-armed");
        }
        self.state = DebounceState::Armed {
            deadline,
            generation,
        };

        TimerTicket {
            generation,
            deadline,
            delay,
        }
    }

    /// Fire if the armed deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Generation> {
        match self.state {
            DebounceState::Armed {
                deadline,
                generation,
            } if now >= deadline => self.fire(generation).then_some(generation),
            _ => None,
        }
    }

    /// A timer carrying `generation` went off.
    ///
    /// Returns `false` for timers that were superseded by a later edit or a
    /// cancel; those must not start a check.
    pub fn fire(&mut self, generation: Generation) -> bool {
        match self.state {
            DebounceState::Armed {
                generation: armed, ..
            } if armed == generation => {
                self.state = DebounceState::Firing { generation };
                true
            }
            _ => {
                tracing::trace!(target: "quill::debounce", ?generation, "stale timer ignored");
                false
            }
        }
    }

    /// The fired check has been handed off; go back to idle.
    pub fn finish(&mut self) {
        if matches!(self.state, DebounceState::Firing { .. }) {
            self.state = DebounceState::Idle;
        }
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_fires_once() {
        let mut sched = DebounceScheduler::default();
        let t0 = Instant::now();
        let mut fired = 0;

        // Five keystrokes 10ms apart, polling between each.
        for i in 0..5 {
            let now = t0 + ms(10 * i);
            assert!(sched.poll(now).is_none());
            sched.on_edit(EditKind::Typing, now);
        }
        let last = t0 + ms(40);
        assert_eq!(sched.deadline(), Some(last + ms(50)));

        for step in 0..=20 {
            if sched.poll(last + ms(step * 5)).is_some() {
                fired += 1;
                sched.finish();
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(sched.state(), DebounceState::Idle);
    }

    #[test]
    fn test_paste_uses_shorter_quiet_period() {
        let mut sched = DebounceScheduler::default();
        let t0 = Instant::now();
        let ticket = sched.on_edit(EditKind::Paste, t0);
        assert_eq!(ticket.delay, ms(10));
        assert!(sched.poll(t0 + ms(9)).is_none());
        assert_eq!(sched.poll(t0 + ms(10)), Some(ticket.generation));
    }

    #[test]
    fn test_stale_timer_is_noop() {
        let mut sched = DebounceScheduler::default();
        let t0 = Instant::now();
        let first = sched.on_edit(EditKind::Typing, t0);
        let second = sched.on_edit(EditKind::Typing, t0 + ms(20));

        assert!(!sched.fire(first.generation));
        assert!(sched.is_armed());
        assert!(sched.fire(second.generation));
        assert_eq!(
            sched.state(),
            DebounceState::Firing {
                generation: second.generation
            }
        );
        // Firing twice for the same arm does nothing.
        assert!(!sched.fire(second.generation));
        sched.finish();
        assert_eq!(sched.state(), DebounceState::Idle);
    }

    #[test]
    fn test_cancel_disarms() {
        let mut sched = DebounceScheduler::default();
        let t0 = Instant::now();
        let ticket = sched.on_edit(EditKind::Typing, t0);
        sched.cancel();
        assert!(sched.deadline().is_none());
        assert!(!sched.fire(ticket.generation));
        assert!(sched.poll(t0 + ms(100)).is_none());
    }

    #[test]
    fn test_custom_quiet_periods() {
        let mut sched = DebounceScheduler::new(DebounceConfig::from_millis(200, 0));
        let t0 = Instant::now();
        assert_eq!(sched.on_edit(EditKind::Typing, t0).delay, ms(200));
        assert_eq!(sched.on_edit(EditKind::Paste, t0).deadline, t0);
    }
}
