//! Primality by trial division

use crate::predicate::Predicate;

/// Matches prime numbers
///
/// Trial division by 2 and then by odd candidates up to `isqrt(n)`. Exact
/// across the whole `u64` range.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimePredicate;

impl Predicate for PrimePredicate {
    fn name(&self) -> &'static str {
        "prime"
    }

    fn matches(&self, n: u64) -> bool {
        is_prime(n)
    }
}

/// Whether `n` is prime (0 and 1 are not)
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let limit = isqrt(n);
    let mut divisor = 3;
    while divisor <= limit {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Largest `r` with `r * r <= n`
pub fn isqrt(n: u64) -> u64 {
    // f64 gets within one of the answer; fix up with exact integer checks
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).map_or(false, |sq| sq <= n) {
        root += 1;
    }
    root
}
