//! Division problems and answer sets
//!
//! The generator owns its own PCG stream, separate from the cosmetic RNG, so
//! a seed fixes the question sequence no matter how many particles fly.

use std::fmt;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::tier::{MAX_QUOTIENT, Tier, TierError};

/// Number of options shown per question
pub const ANSWER_COUNT: usize = 4;

/// Perturbation draws before the deterministic fill takes over
pub const MAX_ANSWER_DRAWS: u32 = 64;

/// Distance from the quotient for decoy draws
const DECOY_DELTAS: [i32; 6] = [-3, -2, -1, 1, 2, 3];

/// Stream id for the problem generator PCG
const PROBLEM_STREAM: u64 = 0x5eed_d171;

/// A division fact: `dividend = divisor * quotient`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub dividend: u32,
    pub divisor: u32,
    pub quotient: u32,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ÷ {} = ?", self.dividend, self.divisor)
    }
}

/// Four distinct candidate answers in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    values: [u32; ANSWER_COUNT],
}

impl AnswerSet {
    /// Accepts four distinct values in 1..=9
    pub fn new(values: [u32; ANSWER_COUNT]) -> Option<Self> {
        let in_range = values.iter().all(|v| (1..=MAX_QUOTIENT).contains(v));
        let distinct = values
            .iter()
            .enumerate()
            .all(|(i, v)| !values[i + 1..].contains(v));
        (in_range && distinct).then_some(Self { values })
    }

    pub fn values(&self) -> &[u32; ANSWER_COUNT] {
        &self.values
    }

    pub fn contains(&self, value: u32) -> bool {
        self.values.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().copied()
    }
}

/// How an answer set was assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnswerDraws {
    /// Perturbation draws made
    pub draws: u32,
    /// Slots filled deterministically after the draw budget ran out
    pub filled: u32,
}

/// A problem together with its options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub problem: Problem,
    pub answers: AnswerSet,
}

/// Seeded problem generator
#[derive(Debug, Clone)]
pub struct ProblemGenerator {
    rng: Pcg32,
}

impl ProblemGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::new(seed, PROBLEM_STREAM),
        }
    }

    /// Draw a problem for `tier`
    ///
    /// The divisor is uniform over the tier's divisors that admit quotient 1,
    /// which is the distribution of "draw, redraw if unusable" without the
    /// loop.
    pub fn next(&mut self, tier: &Tier) -> Result<Problem, TierError> {
        let divisors = tier
            .valid_divisors()
            .ok_or_else(|| TierError::NoValidDivisor(tier.name.clone(), tier.max_dividend))?;
        let divisor = self.rng.random_range(divisors);
        let quotient = self.rng.random_range(1..=tier.max_quotient_for(divisor));
        Ok(Problem {
            dividend: divisor * quotient,
            divisor,
            quotient,
        })
    }

    /// Build the four options around `quotient` (which must be in 1..=9)
    pub fn build_answer_set(&mut self, quotient: u32) -> AnswerSet {
        self.build_answer_set_counted(quotient).0
    }

    /// Like [`build_answer_set`](Self::build_answer_set), also reporting the draw count
    ///
    /// Every quotient in 1..=9 reaches at least five distinct clamped values,
    /// so the draw loop ends with probability 1; the budget plus the
    /// nearest-unused fill makes the bound hard.
    pub fn build_answer_set_counted(&mut self, quotient: u32) -> (AnswerSet, AnswerDraws) {
        debug_assert!((1..=MAX_QUOTIENT).contains(&quotient));

        let mut chosen: Vec<u32> = Vec::with_capacity(ANSWER_COUNT);
        chosen.push(quotient);
        let mut stats = AnswerDraws::default();

        while chosen.len() < ANSWER_COUNT && stats.draws < MAX_ANSWER_DRAWS {
            stats.draws += 1;
            let delta = *DECOY_DELTAS.choose(&mut self.rng).unwrap_or(&1);
            let jitter = self.rng.random_range(-1..=1);
            let candidate = (quotient as i32 + delta + jitter).clamp(1, MAX_QUOTIENT as i32) as u32;
            if !chosen.contains(&candidate) {
                chosen.push(candidate);
            }
        }

        if chosen.len() < ANSWER_COUNT {
            let mut spare: Vec<u32> = (1..=MAX_QUOTIENT).filter(|v| !chosen.contains(v)).collect();
            spare.sort_by_key(|&v| (v.abs_diff(quotient), v));
            for v in spare.into_iter().take(ANSWER_COUNT - chosen.len()) {
                chosen.push(v);
                stats.filled += 1;
            }
            log::warn!(
                "Answer draw budget exhausted for quotient {}, filled {} slot(s)",
                quotient,
                stats.filled
            );
        }

        chosen.shuffle(&mut self.rng);
        let mut values = [0; ANSWER_COUNT];
        values.copy_from_slice(&chosen);
        (AnswerSet { values }, stats)
    }

    /// A fresh problem and its options
    pub fn next_question(&mut self, tier: &Tier) -> Result<Question, TierError> {
        let problem = self.next(tier)?;
        let answers = self.build_answer_set(problem.quotient);
        Ok(Question { problem, answers })
    }
}
