//! Elapsed-time source

/// Unit for [`Timer::elapsed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeUnit {
    /// Milliseconds
    Milliseconds,
    /// Seconds
    Seconds,
}

/// Resettable stopwatch
///
/// Control segments take the current time as a plain millisecond value;
/// this trait is how a blocking driver obtains it.
pub trait Timer {
    /// Restart the stopwatch at zero
    fn clear(&mut self);

    /// Milliseconds since the last [`clear`](Timer::clear)
    fn elapsed_ms(&self) -> u32;

    /// Elapsed time in the requested unit
    fn elapsed(&self, unit: TimeUnit) -> f32 {
        let ms = self.elapsed_ms() as f32;
        match unit {
            TimeUnit::Milliseconds => ms,
            TimeUnit::Seconds => ms / 1000.0,
        }
    }
}

/// Stopwatch fed by the control tick
///
/// Segments only see the tick time; this gives them a [`Timer`] over it,
/// advanced with [`observe`](Self::observe) on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickTimer {
    started_ms: u32,
    now_ms: u32,
}

impl TickTimer {
    /// Start the stopwatch at `now_ms`
    pub fn new(now_ms: u32) -> Self {
        Self {
            started_ms: now_ms,
            now_ms,
        }
    }

    /// Record the latest tick time
    pub fn observe(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }
}

impl Timer for TickTimer {
    fn clear(&mut self) {
        self.started_ms = self.now_ms;
    }

    fn elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.started_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_timer_units() {
        let mut timer = TickTimer::new(1_000);
        timer.observe(2_250);
        assert_eq!(timer.elapsed_ms(), 1_250);
        assert_eq!(timer.elapsed(TimeUnit::Seconds), 1.25);
        assert_eq!(timer.elapsed(TimeUnit::Milliseconds), 1250.0);

        timer.clear();
        assert_eq!(timer.elapsed_ms(), 0);
    }

    #[test]
    fn test_tick_timer_wraps() {
        let mut timer = TickTimer::new(u32::MAX - 5);
        timer.observe(4);
        assert_eq!(timer.elapsed_ms(), 10);
    }
}
