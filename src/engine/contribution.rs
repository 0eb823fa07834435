//! Contribution attribution for a single project.
//!
//! Converts a project's task list and category weight map into one
//! percentage per credited partner. The whole per-project set is
//! replaced atomically on every recompute; it is never patched in
//! place, so stale partner entries cannot survive team changes.

use crate::engine::round2;
use crate::models::{Contribution, Partner, Project, Task, TaskStatus};
use crate::storage::Storage;
use crate::{Error, Result};
use chrono::Utc;
use std::collections::BTreeMap;

/// Effort totals for one task category.
#[derive(Debug, Default)]
struct CategoryEffort {
    /// Sum of effort weights across all of the category's tasks
    total: f64,
    /// Sum of effort weights per credited partner
    by_partner: BTreeMap<String, f64>,
}

/// The partner a task's effort is credited to.
///
/// The assignee by default; on a done task with a recorded completer,
/// the partner profile owned by that user takes the credit instead,
/// falling back to the assignee when the completer has no partner
/// profile.
fn credited_partner(task: &Task, partners: &[Partner]) -> Option<String> {
    if task.status == TaskStatus::Done {
        if let Some(user) = task.completed_by_id.as_deref() {
            if let Some(partner) = partners.iter().find(|p| p.user_id == user) {
                return Some(partner.id.clone());
            }
        }
    }
    task.assigned_partner_id.clone()
}

/// Compute contribution percentages for a project.
///
/// Returns `(partner_id, percentage)` pairs in map iteration order
/// (ascending partner id). Entries sum to exactly 100.00 whenever any
/// credit or lead exists; the result is empty only when the project has
/// neither credited effort nor designated leads.
pub fn compute(project: &Project, tasks: &[Task], partners: &[Partner]) -> Vec<(String, f64)> {
    // Group tasks by category, accumulating total and per-partner effort.
    let mut categories: BTreeMap<String, CategoryEffort> = BTreeMap::new();
    for task in tasks {
        // No category = the unweighted bucket (weight 0).
        let category = task.category.clone().unwrap_or_default();
        let effort = categories.entry(category).or_default();
        effort.total += task.effort_weight;
        if let Some(partner_id) = credited_partner(task, partners) {
            *effort.by_partner.entry(partner_id).or_insert(0.0) += task.effort_weight;
        }
    }

    // Distribute each weighted category proportionally to credited effort.
    // Zero-effort categories leave their weight unallocated; it is not
    // redistributed to other categories.
    let mut raw: BTreeMap<String, f64> = BTreeMap::new();
    for (category, effort) in &categories {
        if effort.total <= 0.0 {
            continue;
        }
        let weight = project.weights.get(category).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        for (partner_id, partner_effort) in &effort.by_partner {
            *raw.entry(partner_id.clone()).or_insert(0.0) +=
                (partner_effort / effort.total) * weight;
        }
    }

    // Designated leads always appear, even at 0%.
    let leads = project.lead_ids();
    for lead in &leads {
        raw.entry(lead.clone()).or_insert(0.0);
    }

    let raw_sum: f64 = raw.values().sum();
    let mut result: Vec<(String, f64)> = if raw_sum > 0.0 {
        raw.iter()
            .map(|(partner_id, value)| (partner_id.clone(), round2(value / raw_sum * 100.0)))
            .collect()
    } else if !leads.is_empty() {
        // No credited effort anywhere: split equally among the leads
        // (zero-effort credits drop out of the result entirely).
        let share = round2(100.0 / leads.len() as f64);
        raw.keys()
            .filter(|partner_id| leads.contains(*partner_id))
            .map(|partner_id| (partner_id.clone(), share))
            .collect()
    } else {
        return Vec::new();
    };

    // Per-entry rounding can leave the total a cent or two off 100; fold
    // the residual into the first entry so the sum invariant holds
    // exactly.
    let sum: f64 = result.iter().map(|(_, value)| value).sum();
    let residual = round2(100.0 - sum);
    if residual != 0.0 {
        if let Some((_, first)) = result.first_mut() {
            *first = round2(*first + residual);
        }
    }

    result
}

/// Recompute and persist a project's contribution set.
///
/// Idempotent: with no intervening task mutation, repeated calls store
/// identical percentages. The stored set is replaced atomically
/// (delete-all-then-insert in one transaction).
pub fn recompute(storage: &mut Storage, project_id: &str) -> Result<Vec<Contribution>> {
    let project = storage.get_project(project_id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!(
            "Project is locked, contributions are final: {}",
            project.id
        )));
    }

    let tasks = storage.list_tasks(project_id, None)?;
    let partners = storage.list_partners()?;

    let computed_at = Utc::now();
    let rows: Vec<Contribution> = compute(&project, &tasks, &partners)
        .into_iter()
        .map(|(partner_id, percentage)| Contribution {
            project_id: project.id.clone(),
            partner_id,
            percentage,
            computed_at,
        })
        .collect();

    storage.replace_contributions(project_id, &rows)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner(id: &str, user: &str) -> Partner {
        Partner::new(id.to_string(), user.to_string(), user.to_string())
    }

    fn task(project: &str, category: Option<&str>, effort: f64, assignee: Option<&str>) -> Task {
        let seed = format!("{:?}-{}-{:?}", category, effort, assignee);
        let mut t = Task::new(
            crate::storage::generate_id("dvt", &seed),
            project.to_string(),
            "t".to_string(),
        );
        t.category = category.map(String::from);
        t.effort_weight = effort;
        t.assigned_partner_id = assignee.map(String::from);
        t
    }

    fn project_with_weights(weights: &[(&str, f64)]) -> Project {
        let mut p = Project::new("dvj-aaaa".to_string(), "P".to_string());
        for (category, weight) in weights {
            p.weights.insert(category.to_string(), *weight);
        }
        p
    }

    #[test]
    fn test_two_category_example() {
        // planning (weight 15): one task, effort 5, by P1.
        // execution (weight 40): efforts 3 (P1) and 7 (P2).
        // Raw: P1 = 15 + 40*0.3 = 27, P2 = 40*0.7 = 28; sum 55.
        let project = project_with_weights(&[("planning", 15.0), ("execution", 40.0)]);
        let partners = vec![partner("dvp-p1", "u1"), partner("dvp-p2", "u2")];
        let tasks = vec![
            task("dvj-aaaa", Some("planning"), 5.0, Some("dvp-p1")),
            task("dvj-aaaa", Some("execution"), 3.0, Some("dvp-p1")),
            task("dvj-aaaa", Some("execution"), 7.0, Some("dvp-p2")),
        ];

        let result = compute(&project, &tasks, &partners);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], ("dvp-p1".to_string(), 49.09));
        assert_eq!(result[1], ("dvp-p2".to_string(), 50.91));

        let sum: f64 = result.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 100.0);
    }

    #[test]
    fn test_done_task_credits_completer_partner() {
        let project = project_with_weights(&[("execution", 100.0)]);
        let partners = vec![partner("dvp-p1", "u1"), partner("dvp-p2", "u2")];

        // Assigned to P1 but completed by u2, so P2 takes the credit.
        let mut t = task("dvj-aaaa", Some("execution"), 4.0, Some("dvp-p1"));
        t.status = TaskStatus::Done;
        t.completed_by_id = Some("u2".to_string());

        let result = compute(&project, &[t], &partners);
        assert_eq!(result, vec![("dvp-p2".to_string(), 100.0)]);
    }

    #[test]
    fn test_completer_without_partner_falls_back_to_assignee() {
        let project = project_with_weights(&[("execution", 100.0)]);
        let partners = vec![partner("dvp-p1", "u1")];

        let mut t = task("dvj-aaaa", Some("execution"), 4.0, Some("dvp-p1"));
        t.status = TaskStatus::Done;
        t.completed_by_id = Some("nobody".to_string());

        let result = compute(&project, &[t], &partners);
        assert_eq!(result, vec![("dvp-p1".to_string(), 100.0)]);
    }

    #[test]
    fn test_completer_ignored_unless_done() {
        let project = project_with_weights(&[("execution", 100.0)]);
        let partners = vec![partner("dvp-p1", "u1"), partner("dvp-p2", "u2")];

        let mut t = task("dvj-aaaa", Some("execution"), 4.0, Some("dvp-p1"));
        t.status = TaskStatus::Review;
        t.completed_by_id = Some("u2".to_string());

        let result = compute(&project, &[t], &partners);
        assert_eq!(result, vec![("dvp-p1".to_string(), 100.0)]);
    }

    #[test]
    fn test_uncategorized_and_unknown_categories_carry_no_weight() {
        let project = project_with_weights(&[("execution", 40.0)]);
        let partners = vec![partner("dvp-p1", "u1"), partner("dvp-p2", "u2")];
        let tasks = vec![
            task("dvj-aaaa", Some("execution"), 2.0, Some("dvp-p1")),
            // Unweighted bucket and unknown category: tracked, worth 0.
            task("dvj-aaaa", None, 50.0, Some("dvp-p2")),
            task("dvj-aaaa", Some("mystery"), 50.0, Some("dvp-p2")),
        ];

        let result = compute(&project, &tasks, &partners);
        assert_eq!(result, vec![("dvp-p1".to_string(), 100.0)]);
    }

    #[test]
    fn test_zero_effort_category_weight_is_not_redistributed() {
        // Only execution has effort; planning's 15 points stay unclaimed,
        // so P1 still normalizes to 100% of what was claimed.
        let project = project_with_weights(&[("planning", 15.0), ("execution", 40.0)]);
        let partners = vec![partner("dvp-p1", "u1")];
        let tasks = vec![task("dvj-aaaa", Some("execution"), 2.0, Some("dvp-p1"))];

        let result = compute(&project, &tasks, &partners);
        assert_eq!(result, vec![("dvp-p1".to_string(), 100.0)]);
    }

    #[test]
    fn test_leads_seeded_at_zero() {
        let mut project = project_with_weights(&[("execution", 40.0)]);
        project.qa_lead_id = Some("dvp-lead".to_string());
        let partners = vec![partner("dvp-p1", "u1"), partner("dvp-lead", "u3")];
        let tasks = vec![task("dvj-aaaa", Some("execution"), 2.0, Some("dvp-p1"))];

        let result = compute(&project, &tasks, &partners);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], ("dvp-lead".to_string(), 0.0));
        assert_eq!(result[1], ("dvp-p1".to_string(), 100.0));
    }

    #[test]
    fn test_no_effort_splits_equally_among_leads() {
        let mut project = project_with_weights(&[("execution", 40.0)]);
        project.project_lead_id = Some("dvp-a".to_string());
        project.tech_lead_id = Some("dvp-b".to_string());
        project.comms_lead_id = Some("dvp-c".to_string());

        let result = compute(&project, &[], &[]);
        assert_eq!(result.len(), 3);
        // 33.33 each, residual cent folded into the first entry.
        assert_eq!(result[0].1, 33.34);
        assert_eq!(result[1].1, 33.33);
        assert_eq!(result[2].1, 33.33);
        let sum: f64 = result.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 100.0);
    }

    #[test]
    fn test_no_effort_no_leads_is_empty() {
        let project = project_with_weights(&[("execution", 40.0)]);
        assert!(compute(&project, &[], &[]).is_empty());
    }

    #[test]
    fn test_rounding_residual_folds_into_first_entry() {
        // Three equal contributors: 33.33 each leaves 0.01 unassigned.
        let project = project_with_weights(&[("execution", 100.0)]);
        let partners = vec![
            partner("dvp-a", "ua"),
            partner("dvp-b", "ub"),
            partner("dvp-c", "uc"),
        ];
        let tasks = vec![
            task("dvj-aaaa", Some("execution"), 1.0, Some("dvp-a")),
            task("dvj-aaaa", Some("execution"), 1.0, Some("dvp-b")),
            task("dvj-aaaa", Some("execution"), 1.0, Some("dvp-c")),
        ];

        let result = compute(&project, &tasks, &partners);
        let sum: f64 = result.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 100.0);
        assert_eq!(result[0].1, 33.34);
    }

    #[test]
    fn test_recompute_persists_and_is_idempotent() {
        let mut storage = Storage::open_in_memory().unwrap();
        for p in [partner("dvp-p1", "u1"), partner("dvp-p2", "u2")] {
            storage.create_partner(&p).unwrap();
        }
        let project = project_with_weights(&[("execution", 40.0)]);
        storage.create_project(&project).unwrap();
        for t in [
            task("dvj-aaaa", Some("execution"), 3.0, Some("dvp-p1")),
            task("dvj-aaaa", Some("execution"), 7.0, Some("dvp-p2")),
        ] {
            storage.create_task(&t).unwrap();
        }

        let first = recompute(&mut storage, "dvj-aaaa").unwrap();
        let second = recompute(&mut storage, "dvj-aaaa").unwrap();
        let stored = storage.list_contributions("dvj-aaaa").unwrap();

        let pct = |rows: &[Contribution]| -> Vec<(String, f64)> {
            rows.iter()
                .map(|c| (c.partner_id.clone(), c.percentage))
                .collect()
        };
        assert_eq!(pct(&first), pct(&second));
        assert_eq!(pct(&stored), vec![
            ("dvp-p1".to_string(), 30.0),
            ("dvp-p2".to_string(), 70.0),
        ]);
    }

    #[test]
    fn test_recompute_unknown_project() {
        let mut storage = Storage::open_in_memory().unwrap();
        assert!(matches!(
            recompute(&mut storage, "dvj-zzzz"),
            Err(Error::NotFound(_))
        ));
    }
}
