/// Handle identifying one countdown. Ticks carrying an old handle are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a cancelled or superseded countdown.
    Stale,
    Remaining(u32),
    /// The count reached zero. Reported once per countdown.
    Completed,
}

/// Per-round countdown. At most one countdown is active at a time: starting
/// a new one invalidates the previous handle.
#[derive(Debug)]
pub struct RoundTimer {
    duration: u32,
    remaining: u32,
    active: Option<TimerId>,
    next_id: u64,
}

impl RoundTimer {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            active: None,
            next_id: 0,
        }
    }

    pub fn start(&mut self) -> TimerId {
        self.cancel();
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.remaining = self.duration;
        self.active = Some(id);
        if self.duration == 0 {
            log::warn!("Countdown started with zero duration; the next tick completes it");
        }
        id
    }

    pub fn tick(&mut self, id: TimerId) -> TickOutcome {
        if self.active != Some(id) {
            return TickOutcome::Stale;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = None;
            TickOutcome::Completed
        } else {
            TickOutcome::Remaining(self.remaining)
        }
    }

    /// Returns whether a countdown was active.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_then_completes_once() {
        let mut timer = RoundTimer::new(5);
        let id = timer.start();
        assert_eq!(timer.remaining(), 5);

        let outcomes: Vec<_> = (0..6).map(|_| timer.tick(id)).collect();
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Remaining(4),
                TickOutcome::Remaining(3),
                TickOutcome::Remaining(2),
                TickOutcome::Remaining(1),
                TickOutcome::Completed,
                TickOutcome::Stale,
            ]
        );
        assert!(!timer.is_active());
    }

    #[test]
    fn test_restart_makes_previous_handle_stale() {
        let mut timer = RoundTimer::new(5);
        let first = timer.start();
        timer.tick(first);
        let second = timer.start();

        assert_ne!(first, second);
        assert_eq!(timer.remaining(), 5);
        for _ in 0..10 {
            assert_eq!(timer.tick(first), TickOutcome::Stale);
        }
        assert_eq!(timer.tick(second), TickOutcome::Remaining(4));
    }

    #[test]
    fn test_cancel_stops_countdown() {
        let mut timer = RoundTimer::new(3);
        let id = timer.start();
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.tick(id), TickOutcome::Stale);
    }

    #[test]
    fn test_tick_before_start_is_stale() {
        let mut timer = RoundTimer::new(3);
        let mut other = RoundTimer::new(3);
        let foreign = other.start();
        // Handles are per timer; id 0 was never issued here.
        assert_eq!(timer.tick(foreign), TickOutcome::Stale);
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let mut timer = RoundTimer::new(0);
        let id = timer.start();
        assert_eq!(timer.tick(id), TickOutcome::Completed);
    }
}
