//! Multiples of a fixed divisor

use crate::error::SearchError;
use crate::predicate::Predicate;

/// Matches `n` where `n % divisor == 0`
#[derive(Debug, Clone, Copy)]
pub struct MultipleOfPredicate {
    divisor: u64,
}

impl MultipleOfPredicate {
    /// Create a predicate for multiples of `divisor`
    ///
    /// # Errors
    ///
    /// A divisor of 0 is a configuration error.
    pub fn new(divisor: u64) -> Result<Self, SearchError> {
        if divisor == 0 {
            return Err(SearchError::config("multiple-of divisor must be non-zero"));
        }
        Ok(Self { divisor })
    }

    pub fn divisor(&self) -> u64 {
        self.divisor
    }
}

impl Predicate for MultipleOfPredicate {
    fn name(&self) -> &'static str {
        "multiple-of"
    }

    fn matches(&self, n: u64) -> bool {
        n % self.divisor == 0
    }
}
