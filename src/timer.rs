use std::time::Duration;

use crate::clock::Clock;

pub const TIMER_RATE_HZ: u32 = 60;

/// The two 8-bit countdown timers. Plain machine state; decay is the
/// [`TimerDriver`]'s job.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

/// Decrements the countdown timers at a fixed real-time rate, decoupled from
/// instruction execution.
///
/// Each call to [`tick`](TimerDriver::tick) subtracts the whole number of
/// rate windows elapsed since the last decrement in a single step, then
/// advances its phase reference by exactly that many windows. Calls inside
/// the same window subtract nothing.
pub struct TimerDriver {
    period: Duration,
    last: Duration,
}

impl TimerDriver {
    /// `rate_hz` is an explicit configuration value; there is no global
    /// default to mutate.
    pub fn new(rate_hz: u32, clock: &dyn Clock) -> Self {
        TimerDriver {
            period: Duration::from_secs(1) / rate_hz,
            last: clock.now(),
        }
    }

    pub fn tick(&mut self, clock: &dyn Clock, timers: &mut Timers) {
        let elapsed = clock.now().saturating_sub(self.last);
        let windows = (elapsed.as_nanos() / self.period.as_nanos()) as u32;
        if windows == 0 {
            return;
        }

        let steps = windows.min(u32::from(u8::MAX)) as u8;
        timers.delay = timers.delay.saturating_sub(steps);
        timers.sound = timers.sound.saturating_sub(steps);
        self.last += self.period * windows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const WINDOW: Duration = Duration::from_nanos(1_000_000_000 / 60);

    #[test]
    fn test_no_decrement_inside_one_window() {
        let clock = ManualClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);
        let mut timers = Timers {
            delay: 10,
            sound: 10,
        };

        clock.advance(WINDOW / 2);
        driver.tick(&clock, &mut timers);
        assert_eq!(timers.delay, 10);
        assert_eq!(timers.sound, 10);
    }

    #[test]
    fn test_catch_up_subtracts_elapsed_windows_in_one_step() {
        let clock = ManualClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);
        let mut timers = Timers {
            delay: 10,
            sound: 3,
        };

        // 1/30 s is exactly two 60 Hz windows
        clock.advance(Duration::from_secs(1) / 30);
        driver.tick(&clock, &mut timers);
        assert_eq!(timers.delay, 8);
        assert_eq!(timers.sound, 1);
    }

    #[test]
    fn test_timers_saturate_at_zero() {
        let clock = ManualClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);
        let mut timers = Timers { delay: 1, sound: 0 };

        clock.advance(Duration::from_secs(1));
        driver.tick(&clock, &mut timers);
        assert_eq!(timers.delay, 0);
        assert_eq!(timers.sound, 0);
    }

    #[test]
    fn test_partial_windows_accumulate_without_drift() {
        let clock = ManualClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);
        let mut timers = Timers {
            delay: 60,
            sound: 0,
        };

        // 120 half-window ticks: 60 whole windows in total
        for _ in 0..120 {
            clock.advance(WINDOW / 2);
            driver.tick(&clock, &mut timers);
        }
        assert_eq!(timers.delay, 0);
    }

    #[test]
    fn test_consecutive_ticks_in_same_window_decrement_once() {
        let clock = ManualClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);
        let mut timers = Timers {
            delay: 10,
            sound: 0,
        };

        clock.advance(WINDOW);
        driver.tick(&clock, &mut timers);
        driver.tick(&clock, &mut timers);
        driver.tick(&clock, &mut timers);
        assert_eq!(timers.delay, 9);
    }
}
