use crate::Generator;
use burrow_core::shortcode::{ALPHABET, DEFAULT_LENGTH};
use burrow_core::ShortCode;
use rand::Rng;

/// Draws codes uniformly, with replacement, from the 63-symbol alphabet.
///
/// Uses the thread-local RNG, which is seeded from the OS and reseeds
/// itself periodically, so output never repeats as a fixed sequence.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator producing codes of the default length (10).
    pub fn new() -> Self {
        Self::with_length(DEFAULT_LENGTH)
    }

    pub fn with_length(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let mut rng = rand::rng();
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
