//! Deterministic profit splitting.
//!
//! Splits a project's realized balance into five figures:
//! - 10% business reserve
//! - 5% religious/charity allocation
//! - the remainder (net distributable profit), of which:
//!   - 20% forms the base pool, split equally among **all** partners in
//!     the partnership regardless of project involvement
//!   - 80% forms the performance pool, split by contribution percentage
//!
//! This is a pure function module: no state, no storage access, no side
//! effects. Each figure is rounded to two decimals at the point of
//! computation so repeated runs are bit-stable. The split arithmetic
//! itself (`pool_split`) is total and surfaces negative balances
//! unchanged; only the per-partner distribution (`distribute`), which
//! generates real payouts, rejects them.

use crate::engine::round2;
use crate::{Error, Result};
use serde::Serialize;

/// Share of the gross balance reserved for the business.
pub const BUSINESS_RESERVE_RATE: f64 = 0.10;

/// Share of the gross balance allocated to charity.
pub const RELIGIOUS_ALLOCATION_RATE: f64 = 0.05;

/// Share of net distributable profit split equally among all partners.
pub const BASE_POOL_RATE: f64 = 0.20;

/// Share of net distributable profit split by contribution percentage.
pub const PERFORMANCE_POOL_RATE: f64 = 0.80;

/// Tolerance for the contribution-percentage sum check.
pub const CONTRIBUTION_SUM_EPSILON: f64 = 0.1;

/// The pool figures derived from one gross balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSplit {
    /// The gross balance the split was computed from
    pub gross: f64,
    /// 10% of gross
    pub business_reserve: f64,
    /// 5% of gross
    pub religious_allocation: f64,
    /// Gross minus reserve and charity
    pub net_distributable: f64,
    /// 20% of net distributable
    pub base_pool: f64,
    /// 80% of net distributable
    pub performance_pool: f64,
}

/// One partner's cut of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerShare {
    pub partner_id: String,
    pub contribution_percent: f64,
    /// Equal share of the base pool
    pub base_share: f64,
    /// Contribution-proportional share of the performance pool
    pub performance_share: f64,
    /// base_share + performance_share
    pub total_payout: f64,
}

/// A full distribution: pool figures plus one row per partner.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    #[serde(flatten)]
    pub pools: PoolSplit,
    /// The equal base-pool share every partner receives
    pub base_share_each: f64,
    pub shares: Vec<PartnerShare>,
}

/// Split a gross balance into the five pool figures.
///
/// Valid for any gross, including negative: a project in the red gets
/// negative reserve and pool figures, surfaced rather than clamped.
pub fn pool_split(gross: f64) -> PoolSplit {
    let gross = round2(gross);
    let business_reserve = round2(gross * BUSINESS_RESERVE_RATE);
    let religious_allocation = round2(gross * RELIGIOUS_ALLOCATION_RATE);
    let net_distributable = round2(gross - business_reserve - religious_allocation);
    let base_pool = round2(net_distributable * BASE_POOL_RATE);
    let performance_pool = round2(net_distributable * PERFORMANCE_POOL_RATE);
    PoolSplit {
        gross,
        business_reserve,
        religious_allocation,
        net_distributable,
        base_pool,
        performance_pool,
    }
}

/// Distribute a gross balance across partners.
///
/// `partners` carries `(partner_id, contribution_percent)` for every
/// partner in the partnership - the base pool splits equally among all
/// of them, not only those with nonzero contribution.
///
/// Rejects (all fatal): a negative gross, an empty partner list, and a
/// contribution sum off 100 by more than [`CONTRIBUTION_SUM_EPSILON`]
/// (the error carries the actual sum; it means the contribution set is
/// stale and must be recomputed first).
pub fn distribute(gross: f64, partners: &[(String, f64)]) -> Result<Distribution> {
    if gross < 0.0 {
        return Err(Error::Validation(format!(
            "Cannot distribute a negative balance: {:.2}",
            gross
        )));
    }
    if partners.is_empty() {
        return Err(Error::Validation(
            "Cannot distribute to an empty partner set".to_string(),
        ));
    }
    let percent_sum: f64 = partners.iter().map(|(_, percent)| percent).sum();
    if (percent_sum - 100.0).abs() > CONTRIBUTION_SUM_EPSILON {
        return Err(Error::Validation(format!(
            "Contribution percentages must sum to 100, got {:.2}",
            percent_sum
        )));
    }

    let pools = pool_split(gross);
    let base_share_each = round2(pools.base_pool / partners.len() as f64);
    let shares = partners
        .iter()
        .map(|(partner_id, percent)| {
            let performance_share = round2(pools.performance_pool * percent / 100.0);
            PartnerShare {
                partner_id: partner_id.clone(),
                contribution_percent: *percent,
                base_share: base_share_each,
                performance_share,
                total_payout: round2(base_share_each + performance_share),
            }
        })
        .collect();

    Ok(Distribution {
        pools,
        base_share_each,
        shares,
    })
}
