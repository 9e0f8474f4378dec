//! Simulation configuration.

use std::time::Duration;

use rand::Rng;

use crate::error::AirliftError;

/// Knobs for one simulation run.
#[derive(Debug, Clone)]
pub struct AirliftConfig {
    /// Number of passenger tasks to spawn.
    pub n_passengers: usize,
    /// Plane capacity; boarding closes when this many are aboard.
    pub capacity: u32,
    /// Upper bound on a passenger's travel-to-airport time.
    pub max_travel: Duration,
    /// Upper bound on a one-way flight time.
    pub max_flight: Duration,
    /// Seed for the per-role duration RNGs. Same seed, same sampled
    /// durations; interleaving still varies with the scheduler.
    pub seed: u64,
}

impl Default for AirliftConfig {
    fn default() -> Self {
        Self {
            n_passengers: 10,
            capacity: 4,
            max_travel: Duration::from_millis(40),
            max_flight: Duration::from_millis(15),
            seed: 0xA1,
        }
    }
}

impl AirliftConfig {
    pub fn validate(&self) -> Result<(), AirliftError> {
        if self.capacity == 0 {
            return Err(AirliftError::InvalidConfig {
                reason: "capacity must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Bounded random duration in `[1ms, max]` (or exactly `max` when `max`
/// is under a millisecond).
pub(crate) fn sample_duration(rng: &mut impl Rng, max: Duration) -> Duration {
    let max_us = max.as_micros() as u64;
    if max_us <= 1_000 {
        return max;
    }
    Duration::from_micros(rng.random_range(1_000..=max_us))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_capacity_is_rejected() {
        let config = AirliftConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sampled_durations_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let max = Duration::from_millis(25);
        for _ in 0..100 {
            let d = sample_duration(&mut rng, max);
            assert!(d >= Duration::from_millis(1));
            assert!(d <= max);
        }
    }
}
