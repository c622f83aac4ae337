use std::time::{Duration, Instant};

/// Rate limiter consulted by the processor after every instruction.
pub trait Clock {
    /// Block until the next instruction may run.
    fn wait_until_next_tick(&mut self);
}

/// Busy-waits so that instructions run at roughly a fixed rate.
///
/// This is coarse: time spent executing the instruction counts towards the wait, and nothing
/// catches up after a slow cycle.
#[derive(Debug)]
pub struct ThrottledClock {
    period: Duration,
    last_tick: Instant,
}

impl ThrottledClock {
    /// Nominal clock rate of the machine.
    pub const NOMINAL_HZ: u64 = 8_000_000;

    pub fn new(hz: u64) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / hz.max(1));
        ThrottledClock {
            period,
            last_tick: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Clock for ThrottledClock {
    fn wait_until_next_tick(&mut self) {
        while self.last_tick.elapsed() < self.period {
            std::hint::spin_loop();
        }
        self.last_tick = Instant::now();
    }
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

impl Clock for Unthrottled {
    fn wait_until_next_tick(&mut self) {}
}

/// Clock for the given rate, where 0 means unthrottled.
pub fn for_rate(hz: u64) -> Box<dyn Clock> {
    if hz == 0 {
        Box::new(Unthrottled)
    } else {
        Box::new(ThrottledClock::new(hz))
    }
}
