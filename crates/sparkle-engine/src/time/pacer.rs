use std::time::{Duration, Instant};

/// How often a loop is allowed to iterate.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FramePacing {
    /// Iterate as fast as possible. The loop may occupy a full core.
    #[default]
    Unthrottled,
    /// Sleep so that iterations start at least this far apart.
    Interval(Duration),
}

impl FramePacing {
    /// Interval for a target rate; `0` means unthrottled.
    pub fn per_second(rate: u32) -> Self {
        if rate == 0 {
            return FramePacing::Unthrottled;
        }
        FramePacing::Interval(Duration::from_secs(1) / rate)
    }
}

/// Applies a [`FramePacing`] policy at the end of each loop iteration.
#[derive(Debug)]
pub struct FramePacer {
    pacing: FramePacing,
    deadline: Option<Instant>,
}

impl FramePacer {
    pub fn new(pacing: FramePacing) -> Self {
        Self { pacing, deadline: None }
    }

    /// Blocks until the next iteration may start.
    pub fn wait(&mut self) {
        if let Some(pause) = self.pause_at(Instant::now()) {
            std::thread::sleep(pause);
        }
    }

    /// Computes the pause owed at `now` and advances the deadline.
    fn pause_at(&mut self, now: Instant) -> Option<Duration> {
        let FramePacing::Interval(interval) = self.pacing else { return None };

        let deadline = match self.deadline {
            Some(d) if d > now => d,
            // First iteration, or the loop fell behind: restart from now.
            _ => {
                self.deadline = Some(now + interval);
                return None;
            }
        };

        self.deadline = Some(deadline + interval);
        Some(deadline - now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unthrottled_never_pauses() {
        let mut pacer = FramePacer::new(FramePacing::Unthrottled);
        let now = Instant::now();
        assert_eq!(pacer.pause_at(now), None);
        assert_eq!(pacer.pause_at(now), None);
    }

    #[test]
    fn interval_pauses_for_remaining_time() {
        let mut pacer = FramePacer::new(FramePacing::Interval(Duration::from_millis(10)));
        let now = Instant::now();
        assert_eq!(pacer.pause_at(now), None);
        assert_eq!(
            pacer.pause_at(now + Duration::from_millis(4)),
            Some(Duration::from_millis(6))
        );
    }

    #[test]
    fn falling_behind_resets_schedule() {
        let mut pacer = FramePacer::new(FramePacing::Interval(Duration::from_millis(10)));
        let now = Instant::now();
        pacer.pause_at(now);
        assert_eq!(pacer.pause_at(now + Duration::from_millis(50)), None);
    }

    #[test]
    fn per_second_zero_is_unthrottled() {
        assert_eq!(FramePacing::per_second(0), FramePacing::Unthrottled);
        assert_eq!(
            FramePacing::per_second(50),
            FramePacing::Interval(Duration::from_millis(20))
        );
    }
}
