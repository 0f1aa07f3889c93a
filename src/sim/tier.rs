//! Difficulty tiers
//!
//! A tier fixes which divisors appear, how large a dividend may get and how
//! fast meteors fall. The table is checked once at startup so problem
//! generation can never run out of valid divisors mid-game.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tiers a run walks through
pub const TIER_COUNT: usize = 3;

/// Largest quotient (and answer option) ever shown
pub const MAX_QUOTIENT: u32 = 9;

/// Tier table problems
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierError {
    #[error("expected {TIER_COUNT} tiers, found {0}")]
    WrongCount(usize),

    #[error("tier '{0}': divisor range is empty")]
    EmptyDivisorRange(String),

    #[error("tier '{0}': divisor 0 is not allowed")]
    ZeroDivisor(String),

    #[error("tier '{0}': no divisor yields a dividend within {1}")]
    NoValidDivisor(String, u32),

    #[error("tier '{0}': fall speed range {1}..{2} is invalid")]
    InvalidFallSpeed(String, f32, f32),
}

/// One difficulty tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    /// Smallest divisor (inclusive)
    pub divisor_min: u32,
    /// Largest divisor (inclusive)
    pub divisor_max: u32,
    /// Upper bound on the dividend
    pub max_dividend: u32,
    /// Meteor fall speed range (pixels/s)
    pub fall_speed_min: f32,
    pub fall_speed_max: f32,
}

impl Tier {
    /// The three built-in tiers
    pub fn builtin() -> Vec<Tier> {
        vec![
            Tier {
                name: "Beginner".to_string(),
                divisor_min: 1,
                divisor_max: 5,
                max_dividend: 20,
                fall_speed_min: 144.0,
                fall_speed_max: 204.0,
            },
            Tier {
                name: "Intermediate".to_string(),
                divisor_min: 6,
                divisor_max: 9,
                max_dividend: 60,
                fall_speed_min: 180.0,
                fall_speed_max: 252.0,
            },
            Tier {
                name: "Advanced".to_string(),
                divisor_min: 1,
                divisor_max: 9,
                max_dividend: 81,
                fall_speed_min: 216.0,
                fall_speed_max: 300.0,
            },
        ]
    }

    /// Largest quotient usable with `divisor` in this tier (0 if none)
    #[inline]
    pub fn max_quotient_for(&self, divisor: u32) -> u32 {
        if divisor == 0 {
            return 0;
        }
        (self.max_dividend / divisor).min(MAX_QUOTIENT)
    }

    /// Divisors that admit at least quotient 1
    ///
    /// Anything above `max_dividend` has quotient 0, so the usable divisors
    /// are always one contiguous range.
    pub fn valid_divisors(&self) -> Option<RangeInclusive<u32>> {
        let lo = self.divisor_min.max(1);
        let hi = self.divisor_max.min(self.max_dividend);
        (lo <= hi).then_some(lo..=hi)
    }

    pub fn validate(&self) -> Result<(), TierError> {
        if self.divisor_min > self.divisor_max {
            return Err(TierError::EmptyDivisorRange(self.name.clone()));
        }
        if self.divisor_min == 0 {
            return Err(TierError::ZeroDivisor(self.name.clone()));
        }
        if self.valid_divisors().is_none() {
            return Err(TierError::NoValidDivisor(
                self.name.clone(),
                self.max_dividend,
            ));
        }
        let speeds_ok = self.fall_speed_min.is_finite()
            && self.fall_speed_max.is_finite()
            && self.fall_speed_min > 0.0
            && self.fall_speed_min <= self.fall_speed_max;
        if !speeds_ok {
            return Err(TierError::InvalidFallSpeed(
                self.name.clone(),
                self.fall_speed_min,
                self.fall_speed_max,
            ));
        }
        Ok(())
    }

    /// Validate a full tier table
    pub fn validate_table(tiers: &[Tier]) -> Result<(), TierError> {
        if tiers.len() != TIER_COUNT {
            return Err(TierError::WrongCount(tiers.len()));
        }
        tiers.iter().try_for_each(Tier::validate)
    }
}
