//! Delay policies between polls.
//!
//! Two delays exist:
//! - after an API error, a multiplicative backoff that wraps around a cap so
//!   it never grows without bound
//! - while blocked on conflicts, a uniformly random collision-avoidance delay
//!   so guards started together drift apart
//!
//! Both draw from an injected RNG so tests can seed them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Configuration for the delay policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Lowest whole-second value of the initial backoff factor.
    #[serde(default = "default_seed_min")]
    pub seed_min_seconds: u64,
    /// Highest whole-second value of the initial backoff factor.
    #[serde(default = "default_seed_max")]
    pub seed_max_seconds: u64,
    /// Growth applied on each consecutive error.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Modulus the backoff wraps around; every delay stays below it.
    #[serde(default = "default_cap")]
    pub cap_seconds: f64,
    /// Smallest backoff delay after wrapping.
    #[serde(default = "default_floor")]
    pub floor_seconds: f64,
    /// Shortest collision-avoidance delay.
    #[serde(default = "default_collision_min")]
    pub collision_min_seconds: u64,
    /// Longest collision-avoidance delay.
    #[serde(default = "default_collision_max")]
    pub collision_max_seconds: u64,
}

fn default_seed_min() -> u64 {
    2
}

fn default_seed_max() -> u64 {
    5
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_cap() -> f64 {
    30.0
}

fn default_floor() -> f64 {
    2.0
}

fn default_collision_min() -> u64 {
    3
}

fn default_collision_max() -> u64 {
    15
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            seed_min_seconds: default_seed_min(),
            seed_max_seconds: default_seed_max(),
            multiplier: default_multiplier(),
            cap_seconds: default_cap(),
            floor_seconds: default_floor(),
            collision_min_seconds: default_collision_min(),
            collision_max_seconds: default_collision_max(),
        }
    }
}

impl BackoffConfig {
    /// Creates a config with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed range in whole seconds.
    #[must_use]
    pub fn with_seed_range(mut self, min_seconds: u64, max_seconds: u64) -> Self {
        self.seed_min_seconds = min_seconds;
        self.seed_max_seconds = max_seconds;
        self
    }

    /// Sets the growth multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the cap and floor in seconds.
    #[must_use]
    pub fn with_bounds(mut self, floor_seconds: f64, cap_seconds: f64) -> Self {
        self.floor_seconds = floor_seconds;
        self.cap_seconds = cap_seconds;
        self
    }

    /// Sets the collision-avoidance window in whole seconds.
    #[must_use]
    pub fn with_collision_window(mut self, min_seconds: u64, max_seconds: u64) -> Self {
        self.collision_min_seconds = min_seconds;
        self.collision_max_seconds = max_seconds;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_min_seconds > self.seed_max_seconds {
            return Err(ConfigError::InvalidBackoff(
                "seed_min_seconds must be <= seed_max_seconds".to_string(),
            ));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 1.0) {
            return Err(ConfigError::InvalidBackoff("multiplier must be > 1".to_string()));
        }
        if !(self.floor_seconds.is_finite() && self.floor_seconds > 0.0) {
            return Err(ConfigError::InvalidBackoff("floor_seconds must be positive".to_string()));
        }
        if !(self.cap_seconds.is_finite() && self.cap_seconds > self.floor_seconds) {
            return Err(ConfigError::InvalidBackoff(
                "cap_seconds must be greater than floor_seconds".to_string(),
            ));
        }
        if self.collision_min_seconds > self.collision_max_seconds {
            return Err(ConfigError::InvalidBackoff(
                "collision_min_seconds must be <= collision_max_seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backoff state across consecutive API errors.
#[derive(Debug, Clone)]
pub struct ErrorBackoff {
    seed: f64,
    factor: f64,
    multiplier: f64,
    cap: f64,
    floor: f64,
}

impl ErrorBackoff {
    /// Seeds the factor with a random whole number of seconds from the
    /// configured range plus a fractional jitter in `[0, 1)`.
    pub fn new<R: Rng + ?Sized>(config: &BackoffConfig, rng: &mut R) -> Self {
        let whole = rng.gen_range(config.seed_min_seconds..=config.seed_max_seconds);
        let seed = whole as f64 + rng.gen::<f64>();
        Self {
            seed,
            factor: seed,
            multiplier: config.multiplier,
            cap: config.cap_seconds,
            floor: config.floor_seconds,
        }
    }

    /// Returns the current factor in seconds.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Grows the factor and returns the delay before the next poll.
    ///
    /// Growth past the cap wraps around it, then the floor applies, so every
    /// delay lies in `[floor, cap)`.
    pub fn next_delay(&mut self) -> Duration {
        let mut next = self.factor * self.multiplier;
        if next >= self.cap {
            next %= self.cap;
        }
        self.factor = next.max(self.floor);
        Duration::from_secs_f64(self.factor)
    }

    /// Returns to the seed after a successful poll.
    pub fn reset(&mut self) {
        self.factor = self.seed;
    }
}

/// Picks a uniformly random whole-second delay from the collision window.
pub fn collision_delay<R: Rng + ?Sized>(config: &BackoffConfig, rng: &mut R) -> Duration {
    Duration::from_secs(rng.gen_range(config.collision_min_seconds..=config.collision_max_seconds))
}
