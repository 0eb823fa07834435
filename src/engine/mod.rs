//! The calculation engine.
//!
//! Four components, each consuming the previous one's output:
//! - `contribution` - per-partner contribution percentages for a project,
//!   from category-weighted task effort
//! - `profit` - deterministic split of a realized balance into reserve,
//!   charity, and base/performance pools, then per-partner payouts
//! - `sync` - orchestrates the two above against a project's ledger and
//!   persists the financial snapshot; also project finalization
//! - `equity` - company-wide equity recomputation on capital events
//!
//! Every monetary figure is rounded to two decimals at the point of
//! computation so repeated runs are bit-stable.

pub mod contribution;
pub mod equity;
pub mod profit;
pub mod sync;

/// Round to two decimal places (cents).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(49.0909090909), 49.09);
        assert_eq!(round2(50.909090909), 50.91);
        assert_eq!(round2(-0.016), -0.02);
        assert_eq!(round2(1360.0), 1360.0);
    }
}
