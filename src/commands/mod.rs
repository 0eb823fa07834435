//! Command implementations for the Divvy CLI.
//!
//! Each command opens storage for the workspace, calls into the storage
//! or engine layer, and returns a result struct implementing [`Output`]
//! so `main` can print JSON (default) or a human rendering (`-H`).
//!
//! Task and transaction mutations trigger a financial sync for the
//! affected project before returning, per the engine's data flow; a
//! failed sync fails the whole command.

use crate::action_log::{self, ActionLog};
use crate::engine::{contribution, equity, sync};
use crate::models::{
    CapitalInjection, Contribution, Financial, Partner, Payout, Project, Task, TaskStatus,
    Transaction, TransactionKind,
};
use crate::storage::{generate_id, validate_id, Storage};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn open(workspace: &Path) -> Result<Storage> {
    Storage::open(workspace)
}

// === System ===

/// Result of `dv system init`.
#[derive(Debug, Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub location: String,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.initialized {
            format!("Initialized divvy at {}", self.location)
        } else {
            format!("Already initialized at {}", self.location)
        }
    }
}

/// Initialize divvy for the given workspace.
pub fn system_init(workspace: &Path) -> Result<InitResult> {
    let already = Storage::exists(workspace)?;
    let storage = if already {
        Storage::open(workspace)?
    } else {
        Storage::init(workspace)?
    };
    Ok(InitResult {
        initialized: !already,
        location: storage.root.display().to_string(),
    })
}

/// Result of `dv system version`.
#[derive(Debug, Serialize)]
pub struct VersionResult {
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub git_commit: &'static str,
}

impl Output for VersionResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "dv {} (built {} from {})",
            self.version, self.build_timestamp, self.git_commit
        )
    }
}

/// Report the binary's version and build info.
pub fn system_version() -> VersionResult {
    VersionResult {
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("DV_BUILD_TIMESTAMP"),
        git_commit: env!("DV_GIT_COMMIT"),
    }
}

// === Partners ===

/// A single partner, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PartnerResult(pub Partner);

impl Output for PartnerResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let p = &self.0;
        format!(
            "Partner {} \"{}\" (user {}) equity {}% capital {} earnings {}",
            p.id,
            p.name,
            p.user_id,
            money(p.equity_percentage),
            money(p.total_capital_contributed),
            money(p.total_earnings),
        )
    }
}

/// Result of `dv partner list`.
#[derive(Debug, Serialize)]
pub struct PartnerListResult {
    pub partners: Vec<Partner>,
}

impl Output for PartnerListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.partners.is_empty() {
            return "No partners".to_string();
        }
        self.partners
            .iter()
            .map(|p| {
                format!(
                    "{}  {:<20} equity {:>6}%  capital {:>12}  earnings {:>12}",
                    p.id,
                    p.name,
                    money(p.equity_percentage),
                    money(p.total_capital_contributed),
                    money(p.total_earnings),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Add a new partner.
pub fn partner_add(workspace: &Path, name: &str, user_id: &str) -> Result<PartnerResult> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("Partner name must not be empty".to_string()));
    }
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput("User id must not be empty".to_string()));
    }

    let mut storage = open(workspace)?;
    if let Some(existing) = storage.get_partner_by_user(user_id)? {
        return Err(Error::Conflict(format!(
            "User {} already owns partner {}",
            user_id, existing.id
        )));
    }

    let partner = Partner::new(
        generate_id("dvp", user_id),
        user_id.to_string(),
        name.to_string(),
    );
    storage.create_partner(&partner)?;
    Ok(PartnerResult(partner))
}

/// List all partners.
pub fn partner_list(workspace: &Path) -> Result<PartnerListResult> {
    let storage = open(workspace)?;
    Ok(PartnerListResult {
        partners: storage.list_partners()?,
    })
}

/// Show one partner.
pub fn partner_show(workspace: &Path, id: &str) -> Result<PartnerResult> {
    validate_id(id, "dvp")?;
    let storage = open(workspace)?;
    Ok(PartnerResult(storage.get_partner(id)?))
}

// === Projects ===

/// A single project, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ProjectResult(pub Project);

impl Output for ProjectResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let p = &self.0;
        let lock = if p.is_locked { " [locked]" } else { "" };
        let weights = if p.weights.is_empty() {
            "none".to_string()
        } else {
            p.weights
                .iter()
                .map(|(c, w)| format!("{}={}", c, w))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Project {} \"{}\"{} value {} weights: {}",
            p.id,
            p.name,
            lock,
            money(p.total_value),
            weights,
        )
    }
}

/// Result of `dv project list`.
#[derive(Debug, Serialize)]
pub struct ProjectListResult {
    pub projects: Vec<Project>,
}

impl Output for ProjectListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects".to_string();
        }
        self.projects
            .iter()
            .map(|p| {
                format!(
                    "{}  {:<24} value {:>12}{}",
                    p.id,
                    p.name,
                    money(p.total_value),
                    if p.is_locked { "  [locked]" } else { "" },
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Optional lead assignments for project create/update.
#[derive(Debug, Default, Clone)]
pub struct LeadArgs {
    pub project_lead: Option<String>,
    pub tech_lead: Option<String>,
    pub comms_lead: Option<String>,
    pub qa_lead: Option<String>,
    pub sales_lead: Option<String>,
}

impl LeadArgs {
    fn all(&self) -> impl Iterator<Item = &String> {
        [
            &self.project_lead,
            &self.tech_lead,
            &self.comms_lead,
            &self.qa_lead,
            &self.sales_lead,
        ]
        .into_iter()
        .flatten()
    }

    fn apply(&self, project: &mut Project) {
        if self.project_lead.is_some() {
            project.project_lead_id = self.project_lead.clone();
        }
        if self.tech_lead.is_some() {
            project.tech_lead_id = self.tech_lead.clone();
        }
        if self.comms_lead.is_some() {
            project.comms_lead_id = self.comms_lead.clone();
        }
        if self.qa_lead.is_some() {
            project.qa_lead_id = self.qa_lead.clone();
        }
        if self.sales_lead.is_some() {
            project.sales_lead_id = self.sales_lead.clone();
        }
    }
}

fn check_leads_exist(storage: &Storage, leads: &LeadArgs) -> Result<()> {
    for lead in leads.all() {
        validate_id(lead, "dvp")?;
        storage.get_partner(lead)?;
    }
    Ok(())
}

/// Create a new project.
pub fn project_create(
    workspace: &Path,
    name: &str,
    total_value: Option<f64>,
    leads: &LeadArgs,
) -> Result<ProjectResult> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("Project name must not be empty".to_string()));
    }
    if let Some(value) = total_value {
        if value < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Project value must not be negative, got {:.2}",
                value
            )));
        }
    }

    let mut storage = open(workspace)?;
    check_leads_exist(&storage, leads)?;

    let mut project = Project::new(generate_id("dvj", name), name.to_string());
    project.total_value = total_value.unwrap_or(0.0);
    leads.apply(&mut project);
    storage.create_project(&project)?;
    Ok(ProjectResult(project))
}

/// Update a project's name, value, or leads.
pub fn project_update(
    workspace: &Path,
    id: &str,
    name: Option<String>,
    total_value: Option<f64>,
    leads: &LeadArgs,
) -> Result<ProjectResult> {
    validate_id(id, "dvj")?;
    let mut storage = open(workspace)?;
    let mut project = storage.get_project(id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!("Project is locked: {}", id)));
    }
    check_leads_exist(&storage, leads)?;

    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("Project name must not be empty".to_string()));
        }
        project.name = name;
    }
    if let Some(value) = total_value {
        if value < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Project value must not be negative, got {:.2}",
                value
            )));
        }
        project.total_value = value;
    }
    leads.apply(&mut project);
    project.updated_at = Utc::now();
    storage.update_project(&project)?;
    Ok(ProjectResult(project))
}

/// List all projects.
pub fn project_list(workspace: &Path) -> Result<ProjectListResult> {
    let storage = open(workspace)?;
    Ok(ProjectListResult {
        projects: storage.list_projects()?,
    })
}

/// Show one project.
pub fn project_show(workspace: &Path, id: &str) -> Result<ProjectResult> {
    validate_id(id, "dvj")?;
    let storage = open(workspace)?;
    Ok(ProjectResult(storage.get_project(id)?))
}

/// Set one category weight on a project.
pub fn project_weight(
    workspace: &Path,
    id: &str,
    category: &str,
    weight: f64,
) -> Result<ProjectResult> {
    validate_id(id, "dvj")?;
    if category.trim().is_empty() {
        return Err(Error::InvalidInput("Category must not be empty".to_string()));
    }
    if weight < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Weight must not be negative, got {}",
            weight
        )));
    }

    let mut storage = open(workspace)?;
    let project = storage.get_project(id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!("Project is locked: {}", id)));
    }
    storage.set_project_weight(id, category, weight)?;
    Ok(ProjectResult(storage.get_project(id)?))
}

/// Result of `dv project finalize`.
#[derive(Debug, Serialize)]
pub struct FinalizeResult {
    pub project_id: String,
    pub payouts: Vec<Payout>,
}

impl Output for FinalizeResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Finalized project {}", self.project_id)];
        for payout in &self.payouts {
            lines.push(format!(
                "  {} base {} + performance {} = {}",
                payout.partner_id,
                money(payout.base_share),
                money(payout.performance_share),
                money(payout.total_payout),
            ));
        }
        lines.join("\n")
    }
}

/// Finalize a project: lock it and generate payouts.
pub fn project_finalize(workspace: &Path, id: &str) -> Result<FinalizeResult> {
    validate_id(id, "dvj")?;
    let mut storage = open(workspace)?;
    let payouts = sync::finalize_project(&mut storage, id)?;
    Ok(FinalizeResult {
        project_id: id.to_string(),
        payouts,
    })
}

// === Tasks ===

/// A single task, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TaskResult(pub Task);

impl Output for TaskResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let t = &self.0;
        format!(
            "Task {} \"{}\" [{}] category {} effort {} assignee {}",
            t.id,
            t.title,
            t.status,
            t.category.as_deref().unwrap_or("-"),
            t.effort_weight,
            t.assigned_partner_id.as_deref().unwrap_or("-"),
        )
    }
}

/// Result of `dv task list`.
#[derive(Debug, Serialize)]
pub struct TaskListResult {
    pub tasks: Vec<Task>,
}

impl Output for TaskListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks".to_string();
        }
        self.tasks
            .iter()
            .map(|t| {
                format!(
                    "{}  [{:<11}] {:<32} {} x{}",
                    t.id,
                    t.status.to_string(),
                    t.title,
                    t.category.as_deref().unwrap_or("-"),
                    t.effort_weight,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Generic deletion acknowledgement.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: String,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted {}", self.deleted)
    }
}

fn require_unlocked(storage: &Storage, project_id: &str) -> Result<Project> {
    let project = storage.get_project(project_id)?;
    if project.is_locked {
        return Err(Error::Conflict(format!("Project is locked: {}", project_id)));
    }
    Ok(project)
}

/// Create a new task and resync the project's financials.
pub fn task_create(
    workspace: &Path,
    project_id: &str,
    title: &str,
    category: Option<String>,
    effort: f64,
    assignee: Option<String>,
) -> Result<TaskResult> {
    validate_id(project_id, "dvj")?;
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Task title must not be empty".to_string()));
    }
    if effort <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Effort weight must be positive, got {}",
            effort
        )));
    }

    let mut storage = open(workspace)?;
    require_unlocked(&storage, project_id)?;
    if let Some(assignee) = assignee.as_deref() {
        validate_id(assignee, "dvp")?;
        storage.get_partner(assignee)?;
    }

    let mut task = Task::new(
        generate_id("dvt", title),
        project_id.to_string(),
        title.to_string(),
    );
    task.category = category.filter(|c| !c.trim().is_empty());
    task.effort_weight = effort;
    task.assigned_partner_id = assignee;
    storage.create_task(&task)?;

    sync::sync_financials(&mut storage, project_id)?;
    Ok(TaskResult(task))
}

/// Optional field updates for `dv task update`.
#[derive(Debug, Default, Clone)]
pub struct TaskUpdateArgs {
    pub title: Option<String>,
    pub category: Option<String>,
    pub effort: Option<f64>,
    pub assignee: Option<String>,
    pub status: Option<String>,
    pub completed_by: Option<String>,
}

/// Update a task and resync the project's financials.
pub fn task_update(workspace: &Path, id: &str, args: &TaskUpdateArgs) -> Result<TaskResult> {
    validate_id(id, "dvt")?;
    let mut storage = open(workspace)?;
    let mut task = storage.get_task(id)?;
    require_unlocked(&storage, &task.project_id)?;

    if let Some(title) = &args.title {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("Task title must not be empty".to_string()));
        }
        task.title = title.clone();
    }
    if let Some(category) = &args.category {
        task.category = if category.trim().is_empty() {
            None
        } else {
            Some(category.clone())
        };
    }
    if let Some(effort) = args.effort {
        if effort <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Effort weight must be positive, got {}",
                effort
            )));
        }
        task.effort_weight = effort;
    }
    if let Some(assignee) = &args.assignee {
        validate_id(assignee, "dvp")?;
        storage.get_partner(assignee)?;
        task.assigned_partner_id = Some(assignee.clone());
    }
    if let Some(status) = &args.status {
        task.status = status
            .parse::<TaskStatus>()
            .map_err(Error::InvalidInput)?;
    }
    if let Some(completed_by) = &args.completed_by {
        task.completed_by_id = Some(completed_by.clone());
    }

    task.updated_at = Utc::now();
    storage.update_task(&task)?;
    sync::sync_financials(&mut storage, &task.project_id)?;
    Ok(TaskResult(task))
}

/// List a project's tasks, optionally filtered by status.
pub fn task_list(
    workspace: &Path,
    project_id: &str,
    status: Option<String>,
) -> Result<TaskListResult> {
    validate_id(project_id, "dvj")?;
    let storage = open(workspace)?;
    storage.get_project(project_id)?;
    let status = match status {
        Some(s) => Some(s.parse::<TaskStatus>().map_err(Error::InvalidInput)?),
        None => None,
    };
    Ok(TaskListResult {
        tasks: storage.list_tasks(project_id, status)?,
    })
}

/// Delete a task and resync the project's financials.
pub fn task_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    validate_id(id, "dvt")?;
    let mut storage = open(workspace)?;
    let task = storage.get_task(id)?;
    require_unlocked(&storage, &task.project_id)?;
    storage.delete_task(id)?;
    sync::sync_financials(&mut storage, &task.project_id)?;
    Ok(DeleteResult {
        deleted: id.to_string(),
    })
}

// === Transactions ===

/// A single transaction, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TransactionResult(pub Transaction);

impl Output for TransactionResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let t = &self.0;
        format!(
            "Transaction {} {} {} on {} ({})",
            t.id,
            t.kind,
            money(t.amount),
            t.date,
            t.category.as_deref().unwrap_or("uncategorized"),
        )
    }
}

/// Result of `dv tx list`.
#[derive(Debug, Serialize)]
pub struct TransactionListResult {
    pub transactions: Vec<Transaction>,
    pub balance: f64,
}

impl Output for TransactionListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .transactions
            .iter()
            .map(|t| {
                format!(
                    "{}  {}  {:>7} {:>12}  {}",
                    t.id,
                    t.date,
                    t.kind.to_string(),
                    money(t.amount),
                    t.category.as_deref().unwrap_or("-"),
                )
            })
            .collect();
        lines.push(format!("Balance: {}", money(self.balance)));
        lines.join("\n")
    }
}

/// Record a transaction and resync the project's financials.
pub fn tx_add(
    workspace: &Path,
    project_id: &str,
    amount: f64,
    kind: &str,
    category: Option<String>,
    date: Option<String>,
) -> Result<TransactionResult> {
    validate_id(project_id, "dvj")?;
    if amount <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Transaction amount must be positive, got {:.2}",
            amount
        )));
    }
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(Error::InvalidInput)?;
    let date = match date {
        Some(s) => Some(NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            Error::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {}", s))
        })?),
        None => None,
    };

    let mut storage = open(workspace)?;
    require_unlocked(&storage, project_id)?;

    let mut tx = Transaction::new(
        generate_id("dvx", project_id),
        project_id.to_string(),
        amount,
        kind,
    );
    tx.category = category.filter(|c| !c.trim().is_empty());
    if let Some(date) = date {
        tx.date = date;
    }
    storage.create_transaction(&tx)?;

    sync::sync_financials(&mut storage, project_id)?;
    Ok(TransactionResult(tx))
}

/// List a project's transactions with the running balance.
pub fn tx_list(workspace: &Path, project_id: &str) -> Result<TransactionListResult> {
    validate_id(project_id, "dvj")?;
    let storage = open(workspace)?;
    storage.get_project(project_id)?;
    let transactions = storage.list_transactions(project_id)?;
    let balance = sync::ledger_balance(&transactions);
    Ok(TransactionListResult {
        transactions,
        balance,
    })
}

/// Delete a transaction and resync the project's financials.
pub fn tx_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    validate_id(id, "dvx")?;
    let mut storage = open(workspace)?;
    let tx = storage.get_transaction(id)?;
    require_unlocked(&storage, &tx.project_id)?;
    storage.delete_transaction(id)?;
    sync::sync_financials(&mut storage, &tx.project_id)?;
    Ok(DeleteResult {
        deleted: id.to_string(),
    })
}

// === Contributions ===

/// A project's contribution set.
#[derive(Debug, Serialize)]
pub struct ContributionListResult {
    pub project_id: String,
    pub contributions: Vec<Contribution>,
}

impl Output for ContributionListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.contributions.is_empty() {
            return format!("No contributions for {}", self.project_id);
        }
        self.contributions
            .iter()
            .map(|c| format!("{}  {:>6}%", c.partner_id, money(c.percentage)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Recompute and store a project's contribution set.
pub fn contrib_recompute(workspace: &Path, project_id: &str) -> Result<ContributionListResult> {
    validate_id(project_id, "dvj")?;
    let mut storage = open(workspace)?;
    let contributions = contribution::recompute(&mut storage, project_id)?;
    Ok(ContributionListResult {
        project_id: project_id.to_string(),
        contributions,
    })
}

/// Read a project's stored contribution set.
pub fn contrib_list(workspace: &Path, project_id: &str) -> Result<ContributionListResult> {
    validate_id(project_id, "dvj")?;
    let storage = open(workspace)?;
    storage.get_project(project_id)?;
    Ok(ContributionListResult {
        project_id: project_id.to_string(),
        contributions: storage.list_contributions(project_id)?,
    })
}

// === Financials ===

/// A project's financial snapshot, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct FinancialResult(pub Financial);

impl Output for FinancialResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let f = &self.0;
        let mut lines = vec![
            format!("Financial snapshot for {}", f.project_id),
            format!("  balance          {}", money(f.actual_balance)),
            format!("  project value    {}", money(f.total_value)),
        ];
        match (
            f.business_reserve,
            f.religious_allocation,
            f.net_distributable,
            f.base_pool,
            f.performance_pool,
        ) {
            (Some(reserve), Some(charity), Some(ndp), Some(base), Some(perf)) => {
                lines.push(format!("  business reserve {}", money(reserve)));
                lines.push(format!("  charity          {}", money(charity)));
                lines.push(format!("  net distributable {}", money(ndp)));
                lines.push(format!("  base pool        {}", money(base)));
                lines.push(format!("  performance pool {}", money(perf)));
            }
            _ => lines.push("  (no contributions yet; pools not computed)".to_string()),
        }
        lines.join("\n")
    }
}

/// Recompute a project's contributions and financial snapshot.
pub fn financial_sync(workspace: &Path, project_id: &str) -> Result<FinancialResult> {
    validate_id(project_id, "dvj")?;
    let mut storage = open(workspace)?;
    Ok(FinancialResult(sync::sync_financials(
        &mut storage,
        project_id,
    )?))
}

/// Read a project's stored financial snapshot.
pub fn financial_show(workspace: &Path, project_id: &str) -> Result<FinancialResult> {
    validate_id(project_id, "dvj")?;
    let storage = open(workspace)?;
    storage.get_project(project_id)?;
    Ok(FinancialResult(storage.get_financial(project_id)?))
}

// === Capital ===

/// A single capital injection, rendered as the bare entity in JSON.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CapitalResult(pub CapitalInjection);

impl Output for CapitalResult {
    fn to_json(&self) -> String {
        json(&self.0)
    }

    fn to_human(&self) -> String {
        let c = &self.0;
        format!(
            "Capital {} partner {} amount {} equity {}% (delta {:+.2})",
            c.id,
            c.partner_id,
            money(c.amount),
            money(c.post_equity),
            c.equity_delta,
        )
    }
}

/// Result of `dv capital list`.
#[derive(Debug, Serialize)]
pub struct CapitalListResult {
    pub injections: Vec<CapitalInjection>,
}

impl Output for CapitalListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.injections.is_empty() {
            return "No capital injections".to_string();
        }
        self.injections
            .iter()
            .map(|c| {
                format!(
                    "{}  {}  {}  {:>12}  post-equity {:>6}%",
                    c.id,
                    c.date,
                    c.partner_id,
                    money(c.amount),
                    money(c.post_equity),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Inject capital for a partner; recomputes all equity percentages.
pub fn capital_inject(
    workspace: &Path,
    partner_id: &str,
    amount: f64,
    notes: Option<String>,
) -> Result<CapitalResult> {
    validate_id(partner_id, "dvp")?;
    let mut storage = open(workspace)?;
    let entry = equity::inject_capital(&mut storage, partner_id, amount, notes)?;
    Ok(CapitalResult(entry))
}

/// List capital injections, optionally for one partner.
pub fn capital_list(workspace: &Path, partner_id: Option<&str>) -> Result<CapitalListResult> {
    if let Some(pid) = partner_id {
        validate_id(pid, "dvp")?;
    }
    let storage = open(workspace)?;
    Ok(CapitalListResult {
        injections: storage.list_capital_injections(partner_id)?,
    })
}

/// Delete a capital injection; recomputes all equity percentages.
pub fn capital_delete(workspace: &Path, id: &str) -> Result<DeleteResult> {
    validate_id(id, "dvc")?;
    let mut storage = open(workspace)?;
    equity::delete_capital_injection(&mut storage, id)?;
    Ok(DeleteResult {
        deleted: id.to_string(),
    })
}

// === Payouts ===

/// Result of `dv payout list`.
#[derive(Debug, Serialize)]
pub struct PayoutListResult {
    pub project_id: String,
    pub payouts: Vec<Payout>,
}

impl Output for PayoutListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.payouts.is_empty() {
            return format!("No payouts for {}", self.project_id);
        }
        self.payouts
            .iter()
            .map(|p| {
                format!(
                    "{}  {}  base {:>12} + performance {:>12} = {:>12}",
                    p.id,
                    p.partner_id,
                    money(p.base_share),
                    money(p.performance_share),
                    money(p.total_payout),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List a finalized project's payout rows.
pub fn payout_list(workspace: &Path, project_id: &str) -> Result<PayoutListResult> {
    validate_id(project_id, "dvj")?;
    let storage = open(workspace)?;
    storage.get_project(project_id)?;
    Ok(PayoutListResult {
        project_id: project_id.to_string(),
        payouts: storage.list_payouts(project_id)?,
    })
}

// === Action log ===

/// Result of `dv log`.
#[derive(Debug, Serialize)]
pub struct LogResult {
    pub entries: Vec<ActionLog>,
}

impl Output for LogResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No logged actions".to_string();
        }
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{}  {:<24} {}  {}ms",
                    e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    e.command,
                    if e.success { "ok" } else { "failed" },
                    e.duration_ms,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Show recent entries from the action log.
pub fn log_show(limit: usize) -> Result<LogResult> {
    Ok(LogResult {
        entries: action_log::read_recent(limit)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    // The command layer resolves storage through the workspace path, so
    // these tests go through Storage's DI constructors instead.

    #[test]
    fn test_output_json_is_bare_entity() {
        let partner = Partner::new(
            "dvp-aaaa".to_string(),
            "asha".to_string(),
            "Asha".to_string(),
        );
        let out = PartnerResult(partner);
        let parsed: serde_json::Value = serde_json::from_str(&out.to_json()).unwrap();
        assert_eq!(parsed["id"], "dvp-aaaa");
        assert_eq!(parsed["user_id"], "asha");
    }

    #[test]
    fn test_delete_result_human() {
        let out = DeleteResult {
            deleted: "dvt-aaaa".to_string(),
        };
        assert_eq!(out.to_human(), "Deleted dvt-aaaa");
        assert!(out.to_json().contains("\"deleted\":\"dvt-aaaa\""));
    }

    #[test]
    fn test_financial_human_without_pools() {
        let financial = Financial {
            project_id: "dvj-aaaa".to_string(),
            business_reserve: None,
            religious_allocation: None,
            net_distributable: None,
            base_pool: None,
            performance_pool: None,
            actual_balance: 42.0,
            total_value: 0.0,
            computed_at: Utc::now(),
        };
        let human = FinancialResult(financial).to_human();
        assert!(human.contains("no contributions yet"));
    }

    #[test]
    fn test_init_storage_di_roundtrip() {
        let env = TestEnv::new();
        env.init_storage();
        let storage = env.open_storage();
        assert!(storage.list_projects().unwrap().is_empty());
    }
}
