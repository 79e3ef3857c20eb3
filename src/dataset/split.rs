//! Deterministic train/test/valid splitting
//!
//! Each class folder is divided with two nested train/test splits:
//! 1. **First split** - 60% train, 40% held out
//! 2. **Second split** - the held-out 40% is divided again into test and valid
//!
//! With the default ratios this gives a 60/24/16 partition. The shuffles use a
//! fixed seed so the same file list always lands in the same splits.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{BrainError, Result};

/// Fractions and seed for the two nested splits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Fraction of a class held out by the first split
    pub first_test_fraction: f64,
    /// Fraction of the held-out part that becomes valid (the rest is test)
    pub second_test_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            first_test_fraction: 0.4,
            second_test_fraction: 0.4,
            seed: 43,
        }
    }
}

impl SplitRatios {
    /// Default fractions with a custom seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, fraction) in [
            ("first_test_fraction", self.first_test_fraction),
            ("second_test_fraction", self.second_test_fraction),
        ] {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(BrainError::Config(format!(
                    "{} must be between 0.0 and 1.0 (exclusive), got {}",
                    name, fraction
                )));
            }
        }
        Ok(())
    }
}

/// Result of `three_way_split`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeWaySplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
    pub valid: Vec<T>,
}

impl<T> ThreeWaySplit<T> {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len() + self.valid.len()
    }
}

/// Shuffle `items` and divide them into `(train, test)`.
///
/// `ceil(n * test_fraction)` items go to test. A split that would leave train
/// empty is not performed and everything stays in train.
pub fn train_test_split<T>(items: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let n = items.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;

    if n_test == 0 || n_test >= n {
        return (items, Vec::new());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut shuffled = items;
    shuffled.shuffle(&mut rng);

    let train = shuffled.split_off(n_test);
    (train, shuffled)
}

/// Split once into train and held-out, then split the held-out part into test and valid
pub fn three_way_split<T>(items: Vec<T>, ratios: &SplitRatios) -> ThreeWaySplit<T> {
    let (train, held_out) = train_test_split(items, ratios.first_test_fraction, ratios.seed);
    let (test, valid) = train_test_split(held_out, ratios.second_test_fraction, ratios.seed);

    ThreeWaySplit { train, test, valid }
}
