//! Random filler generation for load documents.
//!
//! A [`PayloadGenerator`] owns its [`RandomSource`]. Each unit of execution
//! builds its own generator; there is no process-wide random state. Swapping
//! the entropy-backed source for a [`SeededSource`] makes a run reproducible:
//! the same seed and prime yield the same stream from the first call on.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Default modulus of the seeded recurrence.
pub const DEFAULT_PRIME: u64 = 16_525_637;

const MULTIPLIER: f64 = 47_543_538.8;

/// Default character set for [`PayloadGenerator::random_string`].
pub const DEFAULT_CHARSET: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-=.abcdefghijklmnopqrstuvwxyz";
pub const HEX_CHARSET: &str = "0123456789ABCDEF";
pub const LETTER_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGIT_CHARSET: &str = "0123456789";

/// Deterministic multiplicative congruential stream over `[0, 1)`.
///
/// `x' = (x * 47543538.8) mod prime`, yielding `x' / prime`. The seed enters
/// the first step unreduced: the multiplier is fractional, so reducing it
/// modulo the prime first would change the stream. A seed that is a multiple
/// of the prime is replaced by 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededSource {
    x: f64,
    prime: f64,
}

impl SeededSource {
    pub fn new(seed: u64, prime: u64) -> Self {
        let prime = prime.max(2);
        let seed = if seed % prime == 0 { 1 } else { seed };
        Self {
            x: seed as f64,
            prime: prime as f64,
        }
    }

    /// Seeds from the wall clock in milliseconds.
    pub fn from_clock(prime: u64) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(1, |d| d.as_millis() as u64);
        Self::new(millis, prime)
    }

    pub fn next_f64(&mut self) -> f64 {
        self.x = (self.x * MULTIPLIER) % self.prime;
        if self.x >= self.prime {
            self.x -= 1.0 / self.prime;
        }
        self.x / self.prime
    }
}

/// Where a generator draws its uniform values from.
#[derive(Debug, Clone)]
pub enum RandomSource {
    Entropy(SmallRng),
    Seeded(SeededSource),
}

impl RandomSource {
    pub fn entropy() -> Self {
        RandomSource::Entropy(SmallRng::from_entropy())
    }

    pub fn seeded(seed: u64, prime: Option<u64>) -> Self {
        RandomSource::Seeded(SeededSource::new(seed, prime.unwrap_or(DEFAULT_PRIME)))
    }

    /// Returns a uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        match self {
            RandomSource::Entropy(rng) => rng.gen_range(0.0..1.0),
            RandomSource::Seeded(source) => source.next_f64(),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::entropy()
    }
}

/// Produces random strings, integers and selections for filler documents.
#[derive(Debug, Clone, Default)]
pub struct PayloadGenerator {
    source: RandomSource,
}

impl PayloadGenerator {
    /// Creates a generator backed by operating-system entropy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reproducible generator.
    pub fn seeded(seed: u64, prime: Option<u64>) -> Self {
        Self::with_source(RandomSource::seeded(seed, prime))
    }

    pub fn with_source(source: RandomSource) -> Self {
        Self { source }
    }

    /// Replaces the current source.
    pub fn set_source(&mut self, source: RandomSource) {
        self.source = source;
    }

    /// Returns to an entropy-backed source.
    pub fn reset_source(&mut self) {
        self.source = RandomSource::entropy();
    }

    pub fn source(&self) -> &RandomSource {
        &self.source
    }

    pub fn next_f64(&mut self) -> f64 {
        self.source.next_f64()
    }

    fn index(&mut self, len: usize) -> usize {
        let i = (self.next_f64() * len as f64).floor() as usize;
        i.min(len - 1)
    }

    /// `count` characters drawn independently from `set`.
    pub fn random_char(&mut self, set: &str, count: usize) -> String {
        let chars: Vec<char> = set.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        (0..count).map(|_| chars[self.index(chars.len())]).collect()
    }

    pub fn random_hex(&mut self, count: usize) -> String {
        self.random_char(HEX_CHARSET, count)
    }

    pub fn random_letter(&mut self, count: usize) -> String {
        self.random_char(LETTER_CHARSET, count)
    }

    pub fn random_digit(&mut self, count: usize) -> String {
        self.random_char(DIGIT_CHARSET, count)
    }

    /// A string of `len` characters from `charset`.
    ///
    /// Without an explicit length, the length itself is random in `0..10`.
    pub fn random_string(&mut self, len: Option<usize>, charset: Option<&str>) -> String {
        let len = len.unwrap_or_else(|| (self.next_f64() * 10.0).floor() as usize);
        self.random_char(charset.unwrap_or(DEFAULT_CHARSET), len)
    }

    /// An integer in `0..=max`, default `max` is `2^32 - 1`.
    pub fn random_int(&mut self, max: Option<u64>) -> u64 {
        let max = max.unwrap_or(u64::from(u32::MAX));
        self.random_in_range(0.0, max as f64, 0) as u64
    }

    /// A value in `[from, to)` rounded to `digits` decimal places.
    pub fn random_in_range(&mut self, from: f64, to: f64, digits: u32) -> f64 {
        let raw = self.next_f64() * (to - from) + from;
        let scale = 10f64.powi(digits as i32);
        (raw * scale).round() / scale
    }

    /// One element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }

    /// `count` elements drawn with replacement.
    pub fn pick_many<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        if items.is_empty() {
            return Vec::new();
        }
        (0..count)
            .map(|_| items[self.index(items.len())].clone())
            .collect()
    }

    /// Up to `count` distinct positions of `items`, drawn without replacement.
    pub fn sample<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        let count = count.min(items.len());
        let mut indices: Vec<usize> = (0..items.len()).collect();
        for i in 0..count {
            let j = i + self.index(indices.len() - i);
            indices.swap(i, j);
        }
        indices[..count].iter().map(|&i| items[i].clone()).collect()
    }
}
