//! Time and randomness seams.
//!
//! Every decision in the engine is a function of "now" and, for workout
//! recommendations, of a single uniform draw. Both are injected so tests can
//! pin them.

use std::cell::Cell;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Fixed clock at `date` `hh:mm` UTC.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
        Self::new(date.and_time(time).and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Uniform `[0, 1)` sampler.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// PCG-backed random source.
pub struct PcgRandom {
    rng: Mcg128Xsl64,
}

impl PcgRandom {
    /// Seeded for reproducibility, or from entropy when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }
}

impl RandomSource for PcgRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        clamp_unit(value)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        0.0
    } else if value >= 1.0 {
        1.0 - f64::EPSILON
    } else {
        value
    }
}

/// Subject-local wall time for a UTC instant.
pub fn local_datetime(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDateTime {
    let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset).naive_local()
}

/// Subject-local calendar date for a UTC instant.
pub fn local_date(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    local_datetime(now, utc_offset_minutes).date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn seeded_pcg_is_reproducible() {
        let mut a = PcgRandom::new(Some(42));
        let mut b = PcgRandom::new(Some(42));
        for _ in 0..16 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn sequence_random_cycles_and_clamps() {
        let mut rng = SequenceRandom::new(vec![0.25, 1.5, -3.0]);
        assert_eq!(rng.next_f64(), 0.25);
        assert!(rng.next_f64() < 1.0);
        assert_eq!(rng.next_f64(), 0.0);
        assert_eq!(rng.next_f64(), 0.25);
    }

    #[test]
    fn fixed_clock_advances() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let clock = FixedClock::at(date, 23, 30);
        clock.advance(Duration::hours(1));
        assert_eq!(clock.now().hour(), 0);
        assert_eq!(clock.now().date_naive(), date.succ_opt().unwrap());
    }

    #[test]
    fn local_date_applies_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let now = FixedClock::at(date, 23, 0).now();
        assert_eq!(local_date(now, 0), date);
        assert_eq!(local_date(now, 120), date.succ_opt().unwrap());
        assert_eq!(local_date(now, -60), date);
    }
}
