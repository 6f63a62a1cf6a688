use crate::Generator;
use burrow_core::shortcode::DEFAULT_LENGTH;
use burrow_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic generator using a sequential counter.
///
/// Produces fixed-length codes like "seq0000000", "seq0000001", etc. Two
/// generators built with the same prefix and offset yield the same sequence,
/// which makes runs against different backends comparable.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a sequential generator with the given prefix.
    ///
    /// The prefix should only use short code symbols (`[a-zA-Z0-9_]`).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a sequential generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let width = DEFAULT_LENGTH.saturating_sub(self.prefix.len());
        ShortCode::new_unchecked(format!("{}{:0width$}", self.prefix, count))
    }
}
