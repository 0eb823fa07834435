//! Financial synchronization and project finalization.
//!
//! `sync_financials` is the write path behind every task or transaction
//! mutation: it recomputes the project's contribution set, sums the
//! transaction ledger, derives the pool figures, and persists one
//! financial snapshot - all inside a single storage transaction, so a
//! failed sync leaves the previous snapshot untouched.
//!
//! `finalize_project` is the terminal operation: one last recompute, a
//! validated distribution across the whole partnership, the project
//! lock, payout rows, and earnings credits - again one transaction.

use crate::engine::{contribution, profit};
use crate::models::{Contribution, Financial, Payout, Transaction};
use crate::storage::{generate_id, Storage};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::BTreeMap;

/// Realized balance of a transaction ledger: income minus expenses.
/// May legitimately be negative.
pub fn ledger_balance(transactions: &[Transaction]) -> f64 {
    crate::engine::round2(transactions.iter().map(Transaction::signed_amount).sum())
}

/// Recompute a project's contributions and financial snapshot.
///
/// Idempotent. The snapshot always records the realized balance and the
/// project value; pool figures are filled in only once at least one
/// contribution exists, so financial visibility is never blocked by an
/// empty contribution set. A negative balance produces negative pool
/// figures - surfaced, not clamped.
pub fn sync_financials(storage: &mut Storage, project_id: &str) -> Result<Financial> {
    let project = storage.get_project(project_id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!(
            "Project is locked, financials are final: {}",
            project.id
        )));
    }

    let tasks = storage.list_tasks(project_id, None)?;
    let partners = storage.list_partners()?;
    let transactions = storage.list_transactions(project_id)?;

    let computed_at = Utc::now();
    let contributions: Vec<Contribution> = contribution::compute(&project, &tasks, &partners)
        .into_iter()
        .map(|(partner_id, percentage)| Contribution {
            project_id: project.id.clone(),
            partner_id,
            percentage,
            computed_at,
        })
        .collect();

    let actual_balance = ledger_balance(&transactions);
    let financial = if contributions.is_empty() {
        Financial {
            project_id: project.id.clone(),
            business_reserve: None,
            religious_allocation: None,
            net_distributable: None,
            base_pool: None,
            performance_pool: None,
            actual_balance,
            total_value: project.total_value,
            computed_at,
        }
    } else {
        let pools = profit::pool_split(actual_balance);
        Financial {
            project_id: project.id.clone(),
            business_reserve: Some(pools.business_reserve),
            religious_allocation: Some(pools.religious_allocation),
            net_distributable: Some(pools.net_distributable),
            base_pool: Some(pools.base_pool),
            performance_pool: Some(pools.performance_pool),
            actual_balance,
            total_value: project.total_value,
            computed_at,
        }
    };

    storage.persist_sync(project_id, &contributions, &financial)?;
    Ok(financial)
}

/// Finalize a project: recompute one last time, distribute across the
/// whole partnership, lock the project, and generate payouts.
///
/// The base pool splits equally among **all** partners, including those
/// with no contribution to this project. Rejects an already-locked
/// project with `Conflict` and a negative or creditless balance with
/// `Validation` (via [`profit::distribute`]). Each partner's
/// `total_earnings` is credited with their payout in the same
/// transaction that locks the project.
pub fn finalize_project(storage: &mut Storage, project_id: &str) -> Result<Vec<Payout>> {
    let project = storage.get_project(project_id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!(
            "Project already finalized: {}",
            project.id
        )));
    }

    let tasks = storage.list_tasks(project_id, None)?;
    let partners = storage.list_partners()?;
    let transactions = storage.list_transactions(project_id)?;

    let computed_at = Utc::now();
    let contributions: Vec<Contribution> = contribution::compute(&project, &tasks, &partners)
        .into_iter()
        .map(|(partner_id, percentage)| Contribution {
            project_id: project.id.clone(),
            partner_id,
            percentage,
            computed_at,
        })
        .collect();

    let contribution_percents: BTreeMap<&str, f64> = contributions
        .iter()
        .map(|c| (c.partner_id.as_str(), c.percentage))
        .collect();

    // Every partner participates in the distribution; absentees at 0%.
    let percents: Vec<(String, f64)> = partners
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                contribution_percents.get(p.id.as_str()).copied().unwrap_or(0.0),
            )
        })
        .collect();

    let actual_balance = ledger_balance(&transactions);
    let dist = profit::distribute(actual_balance, &percents)?;

    let financial = Financial {
        project_id: project.id.clone(),
        business_reserve: Some(dist.pools.business_reserve),
        religious_allocation: Some(dist.pools.religious_allocation),
        net_distributable: Some(dist.pools.net_distributable),
        base_pool: Some(dist.pools.base_pool),
        performance_pool: Some(dist.pools.performance_pool),
        actual_balance,
        total_value: project.total_value,
        computed_at,
    };

    let payouts: Vec<Payout> = dist
        .shares
        .iter()
        .map(|share| Payout {
            id: generate_id("dvy", &share.partner_id),
            project_id: project.id.clone(),
            partner_id: share.partner_id.clone(),
            base_share: share.base_share,
            performance_share: share.performance_share,
            total_payout: share.total_payout,
            created_at: computed_at,
        })
        .collect();

    storage.persist_finalize(project_id, &contributions, &financial, &payouts)?;
    Ok(payouts)
}
