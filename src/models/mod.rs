//! Data models for Divvy entities.
//!
//! This module defines the core data structures:
//! - `Partner` - A member of the partnership with equity and earnings
//! - `Project` - A tracked engagement with category weights and leads
//! - `Task` - A unit of work with effort weight and completion credit
//! - `Transaction` - An income/expense ledger entry for a project
//! - `Contribution` - Derived per-partner percentage for a project
//! - `Financial` - The last-computed financial snapshot for a project
//! - `CapitalInjection` - Immutable capital ledger entry
//! - `Payout` - Per-partner payout generated at project finalization

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    InProgress,
    Review,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backlog" => Ok(TaskStatus::Backlog),
            "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

/// A member of the partnership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    /// Unique identifier (e.g., "dvp-a1b2")
    pub id: String,

    /// The user who owns this partner profile. Task completion credit is
    /// resolved through this field.
    pub user_id: String,

    /// Display name
    pub name: String,

    /// Company-wide ownership share, 0-100. Derived from cumulative
    /// capital; never edited by hand.
    #[serde(default)]
    pub equity_percentage: f64,

    /// Cumulative capital contributed. The only durable input to equity
    /// recomputation.
    #[serde(default)]
    pub total_capital_contributed: f64,

    /// Cumulative payouts from finalized projects.
    #[serde(default)]
    pub total_earnings: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    /// Create a new partner with the given ID, user, and name.
    pub fn new(id: String, user_id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            name,
            equity_percentage: 0.0,
            total_capital_contributed: 0.0,
            total_earnings: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A tracked engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (e.g., "dvj-a1b2")
    pub id: String,

    /// Project name
    pub name: String,

    /// Agreed project value
    #[serde(default)]
    pub total_value: f64,

    /// Terminal lock set by finalization. A locked project rejects task,
    /// transaction, and recompute operations.
    #[serde(default)]
    pub is_locked: bool,

    /// Category name -> percentage weight. Weights need not sum to 100.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    /// Designated project lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_lead_id: Option<String>,

    /// Designated tech lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_lead_id: Option<String>,

    /// Designated comms lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comms_lead_id: Option<String>,

    /// Designated QA lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_lead_id: Option<String>,

    /// Designated sales lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_lead_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with the given ID and name.
    pub fn new(id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            total_value: 0.0,
            is_locked: false,
            weights: BTreeMap::new(),
            project_lead_id: None,
            tech_lead_id: None,
            comms_lead_id: None,
            qa_lead_id: None,
            sales_lead_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All designated lead partner IDs, deduplicated, blanks dropped,
    /// in role order (project, tech, comms, qa, sales).
    pub fn lead_ids(&self) -> Vec<String> {
        let mut leads = Vec::new();
        for lead in [
            &self.project_lead_id,
            &self.tech_lead_id,
            &self.comms_lead_id,
            &self.qa_lead_id,
            &self.sales_lead_id,
        ]
        .into_iter()
        .flatten()
        {
            if !lead.trim().is_empty() && !leads.contains(lead) {
                leads.push(lead.clone());
            }
        }
        leads
    }
}

/// A unit of work tracked against a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "dvt-a1b2")
    pub id: String,

    /// Owning project ID
    pub project_id: String,

    /// Task title
    pub title: String,

    /// Free-form category key into the project's weight map. A task
    /// without a category lands in the unweighted bucket (weight 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Relative effort units (positive)
    pub effort_weight: f64,

    /// Assigned partner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_partner_id: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// User credited with completion. May differ from the assignee; the
    /// partner profile owned by this user takes the credit on done tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given ID, project, and title.
    pub fn new(id: String, project_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            title,
            category: None,
            effort_weight: 1.0,
            assigned_partner_id: None,
            status: TaskStatus::default(),
            completed_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An income/expense ledger entry for a project. Append/delete only;
/// immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier (e.g., "dvx-a1b2")
    pub id: String,

    /// Owning project ID
    pub project_id: String,

    /// Amount (positive; direction is carried by `kind`)
    pub amount: f64,

    /// Income or expense
    pub kind: TransactionKind,

    /// Optional category label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Transaction date
    pub date: NaiveDate,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction dated today.
    pub fn new(id: String, project_id: String, amount: f64, kind: TransactionKind) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            amount,
            kind,
            category: None,
            date: now.date_naive(),
            created_at: now,
        }
    }

    /// Signed amount: income positive, expense negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// A derived per-partner contribution percentage for a project.
///
/// Never hand-edited: the whole set for a project is atomically replaced
/// on each recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// Project the percentage applies to
    pub project_id: String,

    /// Credited partner
    pub partner_id: String,

    /// Percentage, 0-100; all entries for a project sum to exactly 100
    pub percentage: f64,

    /// When this set was computed
    pub computed_at: DateTime<Utc>,
}

/// The last-computed financial snapshot for a project.
///
/// Pool figures are absent until the project has any contribution; the
/// balance and value are always recorded so financial visibility is
/// never blocked by an empty contribution set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financial {
    /// Project this snapshot belongs to
    pub project_id: String,

    /// 10% of the realized balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_reserve: Option<f64>,

    /// 5% of the realized balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religious_allocation: Option<f64>,

    /// Balance after reserve and charity allocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_distributable: Option<f64>,

    /// 20% of net distributable, split equally among all partners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_pool: Option<f64>,

    /// 80% of net distributable, split by contribution percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_pool: Option<f64>,

    /// Realized balance: income minus expenses. May be negative.
    pub actual_balance: f64,

    /// The project's agreed value at computation time
    pub total_value: f64,

    /// When this snapshot was computed
    pub computed_at: DateTime<Utc>,
}

/// An immutable capital ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalInjection {
    /// Unique identifier (e.g., "dvc-a1b2")
    pub id: String,

    /// Partner the capital belongs to
    pub partner_id: String,

    /// Injected amount (positive)
    pub amount: f64,

    /// Equity change caused by this entry. Informational only; never an
    /// input to recomputation.
    pub equity_delta: f64,

    /// The partner's equity immediately after this entry
    pub post_equity: f64,

    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Injection date
    pub date: NaiveDate,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl CapitalInjection {
    /// Create a new injection entry dated today.
    pub fn new(id: String, partner_id: String, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id,
            partner_id,
            amount,
            equity_delta: 0.0,
            post_equity: 0.0,
            notes: None,
            date: now.date_naive(),
            created_at: now,
        }
    }
}

/// A per-partner payout generated at project finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Unique identifier (e.g., "dvy-a1b2")
    pub id: String,

    /// Finalized project
    pub project_id: String,

    /// Receiving partner
    pub partner_id: String,

    /// Equal share of the base pool
    pub base_share: f64,

    /// Contribution-proportional share of the performance pool
    pub performance_share: f64,

    /// base_share + performance_share
    pub total_payout: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
