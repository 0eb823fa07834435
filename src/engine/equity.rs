//! Company-wide equity recomputation.
//!
//! Equity is always a normalized snapshot of relative capital: every
//! capital event rewrites every partner's `equity_percentage` from the
//! durable `total_capital_contributed` accumulators in one pass and one
//! transaction. The `equity_delta` recorded on each ledger entry is an
//! audit convenience and never feeds back into the computation.
//!
//! The zero-division guard is evaluated against the total capital
//! *before* the event: a first-ever injection updates the accumulator
//! but leaves every equity percentage at its prior value; the next
//! event normalizes everyone from the accumulators, so the ledger
//! self-corrects.

use crate::engine::round2;
use crate::models::CapitalInjection;
use crate::storage::{generate_id, PartnerCapital, Storage};
use crate::{Error, Result};

/// Inject capital for a partner and recompute all equity percentages.
///
/// Rejects a non-positive amount (`Validation`) and an unknown partner
/// (`NotFound`) before any mutation.
pub fn inject_capital(
    storage: &mut Storage,
    partner_id: &str,
    amount: f64,
    notes: Option<String>,
) -> Result<CapitalInjection> {
    if amount <= 0.0 {
        return Err(Error::Validation(format!(
            "Injection amount must be positive, got {:.2}",
            amount
        )));
    }
    let partner = storage.get_partner(partner_id)?;
    let partners = storage.list_partners()?;

    let prior_total: f64 = partners.iter().map(|p| p.total_capital_contributed).sum();
    let prior_equity = partner.equity_percentage;

    let mut updates: Vec<PartnerCapital> = partners
        .iter()
        .map(|p| PartnerCapital {
            partner_id: p.id.clone(),
            equity_percentage: p.equity_percentage,
            total_capital_contributed: if p.id == partner.id {
                p.total_capital_contributed + amount
            } else {
                p.total_capital_contributed
            },
        })
        .collect();

    normalize(&mut updates, prior_total);

    let post_equity = updates
        .iter()
        .find(|u| u.partner_id == partner.id)
        .map(|u| u.equity_percentage)
        .unwrap_or(prior_equity);

    let mut entry = CapitalInjection::new(
        generate_id("dvc", partner_id),
        partner.id.clone(),
        amount,
    );
    entry.post_equity = post_equity;
    entry.equity_delta = round2(post_equity - prior_equity);
    entry.notes = notes;

    storage.apply_capital_injection(&entry, &updates)?;
    Ok(entry)
}

/// Delete a capital injection and recompute all equity percentages from
/// the remaining entries.
///
/// The original amount is subtracted from the partner's accumulator,
/// floored at zero.
pub fn delete_capital_injection(storage: &mut Storage, id: &str) -> Result<()> {
    let entry = storage.get_capital_injection(id)?;
    let partners = storage.list_partners()?;

    let prior_total: f64 = partners.iter().map(|p| p.total_capital_contributed).sum();

    let mut updates: Vec<PartnerCapital> = partners
        .iter()
        .map(|p| PartnerCapital {
            partner_id: p.id.clone(),
            equity_percentage: p.equity_percentage,
            total_capital_contributed: if p.id == entry.partner_id {
                (p.total_capital_contributed - entry.amount).max(0.0)
            } else {
                p.total_capital_contributed
            },
        })
        .collect();

    normalize(&mut updates, prior_total);

    storage.apply_capital_deletion(id, &updates)?;
    Ok(())
}

/// Rewrite every entry's equity percentage from the accumulators.
///
/// Skipped entirely when the pre-event total was zero, and when the
/// post-event total is zero (nothing to divide by); in both cases the
/// prior percentages are retained.
fn normalize(updates: &mut [PartnerCapital], prior_total: f64) {
    if prior_total <= 0.0 {
        return;
    }
    let total: f64 = updates.iter().map(|u| u.total_capital_contributed).sum();
    if total <= 0.0 {
        return;
    }
    for update in updates.iter_mut() {
        update.equity_percentage = round2(update.total_capital_contributed / total * 100.0);
    }
}
