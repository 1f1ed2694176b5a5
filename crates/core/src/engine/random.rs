use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform integers, one call per die face.
pub trait RandomSource {
    /// Draws from `min..=max`, both bounds inclusive.
    fn uniform(&mut self, min: i32, max: i32) -> i32;
}

/// Draws from the thread-local generator on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn uniform(&mut self, min: i32, max: i32) -> i32 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Reproducible source for seeded rolls.
#[derive(Clone, Debug)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededSource {
    fn uniform(&mut self, min: i32, max: i32) -> i32 {
        self.rng.gen_range(min..=max)
    }
}

/// Scripted source for deterministic tests. Panics when the script runs dry
/// or a scripted value falls outside the requested bounds, so a miswritten
/// test fails loudly instead of rolling garbage.
#[derive(Clone, Debug, Default)]
pub struct SequenceSource {
    values: VecDeque<i32>,
}

impl SequenceSource {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self { values: values.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&mut self, min: i32, max: i32) -> i32 {
        match self.values.pop_front() {
            Some(value) if (min..=max).contains(&value) => value,
            Some(value) => panic!("scripted value {value} outside {min}..={max}"),
            None => panic!("scripted random sequence exhausted"),
        }
    }
}
