//! Perfect squares

use crate::predicate::prime::isqrt;
use crate::predicate::Predicate;

/// Matches `n` where `n == k * k` for some integer `k` (0 and 1 included)
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfectSquarePredicate;

impl Predicate for PerfectSquarePredicate {
    fn name(&self) -> &'static str {
        "perfect-square"
    }

    fn matches(&self, n: u64) -> bool {
        let root = isqrt(n);
        root * root == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_squares() {
        let p = PerfectSquarePredicate;
        let squares: Vec<u64> = (0..50).filter(|&n| p.matches(n)).collect();
        assert_eq!(squares, vec![0, 1, 4, 9, 16, 25, 36, 49]);
    }

    #[test]
    fn test_largest_square() {
        let p = PerfectSquarePredicate;
        assert!(p.matches(4_294_967_295 * 4_294_967_295));
        assert!(!p.matches(u64::MAX));
    }
}
