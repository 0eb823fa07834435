//! Storage layer for Divvy data.
//!
//! This module handles persistence of partners, projects, tasks,
//! transactions, and the derived financial records.
//!
//! All data lives in a single SQLite database per workspace, located at
//! `~/.local/share/divvy/<workspace-hash>/divvy.db` (override the root
//! with `DV_DATA_DIR`). Every multi-statement write - contribution
//! replace-all, financial sync, finalization, equity recomputation -
//! runs inside one SQLite transaction so partial state is never
//! observable.

use crate::models::{
    CapitalInjection, Contribution, Financial, Partner, Payout, Project, Task, TaskStatus,
    Transaction, TransactionKind,
};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A partner's recomputed capital position, written back in one pass by
/// the equity recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerCapital {
    pub partner_id: String,
    pub equity_percentage: f64,
    pub total_capital_contributed: f64,
}

/// Storage manager for a single workspace.
pub struct Storage {
    /// Root directory for this workspace's data
    pub root: PathBuf,
    /// SQLite connection
    conn: Connection,
}

impl Storage {
    /// Open or create storage for the given workspace path.
    pub fn open(workspace: &Path) -> Result<Self> {
        let root = get_storage_dir(workspace)?;
        Self::open_at(root)
    }

    /// Initialize storage for a new workspace.
    pub fn init(workspace: &Path) -> Result<Self> {
        let root = get_storage_dir(workspace)?;
        Self::init_at(root)
    }

    /// Check if storage exists for the given workspace.
    pub fn exists(workspace: &Path) -> Result<bool> {
        let root = get_storage_dir(workspace)?;
        Ok(root.join("divvy.db").exists())
    }

    /// Open storage rooted under an explicit data directory (DI for tests).
    pub fn open_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        let root = storage_dir_under(workspace, data_dir)?;
        Self::open_at(root)
    }

    /// Initialize storage rooted under an explicit data directory (DI for tests).
    pub fn init_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        let root = storage_dir_under(workspace, data_dir)?;
        Self::init_at(root)
    }

    /// Open a throwaway in-memory store. Used as the storage fake in
    /// engine unit tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::init_schema(&conn)?;
        Ok(Self {
            root: PathBuf::from(":memory:"),
            conn,
        })
    }

    fn open_at(root: PathBuf) -> Result<Self> {
        let db_path = root.join("divvy.db");
        if !db_path.exists() {
            return Err(Error::NotInitialized);
        }
        let conn = Connection::open(&db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    fn init_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        let db_path = root.join("divvy.db");
        let conn = Connection::open(&db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::init_schema(&conn)?;
        Ok(Self { root, conn })
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS partners (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                equity_percentage REAL NOT NULL DEFAULT 0,
                total_capital_contributed REAL NOT NULL DEFAULT 0,
                total_earnings REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                total_value REAL NOT NULL DEFAULT 0,
                is_locked INTEGER NOT NULL DEFAULT 0,
                project_lead_id TEXT,
                tech_lead_id TEXT,
                comms_lead_id TEXT,
                qa_lead_id TEXT,
                sales_lead_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS project_weights (
                project_id TEXT NOT NULL,
                category TEXT NOT NULL,
                weight REAL NOT NULL,
                PRIMARY KEY (project_id, category),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT,
                effort_weight REAL NOT NULL DEFAULT 1,
                assigned_partner_id TEXT,
                status TEXT NOT NULL DEFAULT 'backlog',
                completed_by_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_project ON transactions(project_id);

            CREATE TABLE IF NOT EXISTS contributions (
                project_id TEXT NOT NULL,
                partner_id TEXT NOT NULL,
                percentage REAL NOT NULL,
                computed_at TEXT NOT NULL,
                PRIMARY KEY (project_id, partner_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS financials (
                project_id TEXT PRIMARY KEY,
                business_reserve REAL,
                religious_allocation REAL,
                net_distributable REAL,
                base_pool REAL,
                performance_pool REAL,
                actual_balance REAL NOT NULL,
                total_value REAL NOT NULL,
                computed_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS capital_injections (
                id TEXT PRIMARY KEY,
                partner_id TEXT NOT NULL,
                amount REAL NOT NULL,
                equity_delta REAL NOT NULL DEFAULT 0,
                post_equity REAL NOT NULL DEFAULT 0,
                notes TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (partner_id) REFERENCES partners(id)
            );

            CREATE INDEX IF NOT EXISTS idx_capital_partner ON capital_injections(partner_id);

            CREATE TABLE IF NOT EXISTS payouts (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                partner_id TEXT NOT NULL,
                base_share REAL NOT NULL,
                performance_share REAL NOT NULL,
                total_payout REAL NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (project_id, partner_id),
                FOREIGN KEY (project_id) REFERENCES projects(id)
            );

            CREATE INDEX IF NOT EXISTS idx_payouts_project ON payouts(project_id);
            "#,
        )?;
        Ok(())
    }

    // === Partner Operations ===

    /// Create a new partner.
    pub fn create_partner(&mut self, partner: &Partner) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO partners
            (id, user_id, name, equity_percentage, total_capital_contributed,
             total_earnings, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                partner.id,
                partner.user_id,
                partner.name,
                partner.equity_percentage,
                partner.total_capital_contributed,
                partner.total_earnings,
                partner.created_at.to_rfc3339(),
                partner.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a partner by ID.
    pub fn get_partner(&self, id: &str) -> Result<Partner> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, equity_percentage, total_capital_contributed,
                        total_earnings, created_at, updated_at
                 FROM partners WHERE id = ?1",
                [id],
                row_to_partner,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Partner not found: {}", id)))
    }

    /// Get the partner owned by a user, if any.
    pub fn get_partner_by_user(&self, user_id: &str) -> Result<Option<Partner>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, user_id, name, equity_percentage, total_capital_contributed,
                        total_earnings, created_at, updated_at
                 FROM partners WHERE user_id = ?1",
                [user_id],
                row_to_partner,
            )
            .optional()?)
    }

    /// List all partners.
    pub fn list_partners(&self) -> Result<Vec<Partner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, equity_percentage, total_capital_contributed,
                    total_earnings, created_at, updated_at
             FROM partners ORDER BY created_at ASC, id ASC",
        )?;
        let partners = stmt
            .query_map([], row_to_partner)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(partners)
    }

    // === Project Operations ===

    /// Create a new project with its category weights.
    pub fn create_project(&mut self, project: &Project) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO projects
            (id, name, total_value, is_locked, project_lead_id, tech_lead_id,
             comms_lead_id, qa_lead_id, sales_lead_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                project.id,
                project.name,
                project.total_value,
                project.is_locked,
                project.project_lead_id,
                project.tech_lead_id,
                project.comms_lead_id,
                project.qa_lead_id,
                project.sales_lead_id,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )?;
        for (category, weight) in &project.weights {
            tx.execute(
                "INSERT INTO project_weights (project_id, category, weight) VALUES (?1, ?2, ?3)",
                params![project.id, category, weight],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get a project by ID, with its weight map hydrated.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        let mut project = self
            .conn
            .query_row(
                "SELECT id, name, total_value, is_locked, project_lead_id, tech_lead_id,
                        comms_lead_id, qa_lead_id, sales_lead_id, created_at, updated_at
                 FROM projects WHERE id = ?1",
                [id],
                row_to_project,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))?;
        project.weights = self.project_weights(id)?;
        Ok(project)
    }

    /// List all projects, weight maps hydrated.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, total_value, is_locked, project_lead_id, tech_lead_id,
                    comms_lead_id, qa_lead_id, sales_lead_id, created_at, updated_at
             FROM projects ORDER BY created_at ASC, id ASC",
        )?;
        let mut projects = stmt
            .query_map([], row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for project in &mut projects {
            project.weights = self.project_weights(&project.id)?;
        }
        Ok(projects)
    }

    fn project_weights(&self, project_id: &str) -> Result<BTreeMap<String, f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, weight FROM project_weights WHERE project_id = ?1")?;
        let rows = stmt
            .query_map([project_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Update a project's row fields (name, value, leads, timestamps).
    /// Weights are managed through `set_project_weight`.
    pub fn update_project(&mut self, project: &Project) -> Result<()> {
        let n = self.conn.execute(
            r#"
            UPDATE projects
            SET name = ?2, total_value = ?3, project_lead_id = ?4, tech_lead_id = ?5,
                comms_lead_id = ?6, qa_lead_id = ?7, sales_lead_id = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                project.id,
                project.name,
                project.total_value,
                project.project_lead_id,
                project.tech_lead_id,
                project.comms_lead_id,
                project.qa_lead_id,
                project.sales_lead_id,
                project.updated_at.to_rfc3339(),
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("Project not found: {}", project.id)));
        }
        Ok(())
    }

    /// Set one category weight for a project (insert or replace).
    pub fn set_project_weight(&mut self, project_id: &str, category: &str, weight: f64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO project_weights (project_id, category, weight)
             VALUES (?1, ?2, ?3)",
            params![project_id, category, weight],
        )?;
        self.conn.execute(
            "UPDATE projects SET updated_at = ?2 WHERE id = ?1",
            params![project_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // === Task Operations ===

    /// Create a new task.
    pub fn create_task(&mut self, task: &Task) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO tasks
            (id, project_id, title, category, effort_weight, assigned_partner_id,
             status, completed_by_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                task.id,
                task.project_id,
                task.title,
                task.category,
                task.effort_weight,
                task.assigned_partner_id,
                task.status.to_string(),
                task.completed_by_id,
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.conn
            .query_row(
                "SELECT id, project_id, title, category, effort_weight, assigned_partner_id,
                        status, completed_by_id, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                [id],
                row_to_task,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
    }

    /// List a project's tasks, optionally filtered by status.
    pub fn list_tasks(&self, project_id: &str, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let mut sql = String::from(
            "SELECT id, project_id, title, category, effort_weight, assigned_partner_id,
                    status, completed_by_id, created_at, updated_at
             FROM tasks WHERE project_id = ?1",
        );
        if status.is_some() {
            sql.push_str(" AND status = ?2");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = match status {
            Some(s) => stmt
                .query_map(params![project_id, s.to_string()], row_to_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([project_id], row_to_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(tasks)
    }

    /// Update a task.
    pub fn update_task(&mut self, task: &Task) -> Result<()> {
        let n = self.conn.execute(
            r#"
            UPDATE tasks
            SET title = ?2, category = ?3, effort_weight = ?4, assigned_partner_id = ?5,
                status = ?6, completed_by_id = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                task.id,
                task.title,
                task.category,
                task.effort_weight,
                task.assigned_partner_id,
                task.status.to_string(),
                task.completed_by_id,
                task.updated_at.to_rfc3339(),
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("Task not found: {}", task.id)));
        }
        Ok(())
    }

    /// Delete a task by ID.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let n = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Task not found: {}", id)));
        }
        Ok(())
    }

    // === Transaction Operations ===

    /// Create a new ledger transaction.
    pub fn create_transaction(&mut self, tx: &Transaction) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO transactions
            (id, project_id, amount, kind, category, date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                tx.id,
                tx.project_id,
                tx.amount,
                tx.kind.to_string(),
                tx.category,
                tx.date.to_string(),
                tx.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a transaction by ID.
    pub fn get_transaction(&self, id: &str) -> Result<Transaction> {
        self.conn
            .query_row(
                "SELECT id, project_id, amount, kind, category, date, created_at
                 FROM transactions WHERE id = ?1",
                [id],
                row_to_transaction,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Transaction not found: {}", id)))
    }

    /// List a project's transactions, oldest first.
    pub fn list_transactions(&self, project_id: &str) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, amount, kind, category, date, created_at
             FROM transactions WHERE project_id = ?1 ORDER BY date ASC, created_at ASC, id ASC",
        )?;
        let txs = stmt
            .query_map([project_id], row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(txs)
    }

    /// Delete a transaction by ID.
    pub fn delete_transaction(&mut self, id: &str) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Transaction not found: {}", id)));
        }
        Ok(())
    }

    // === Contribution Operations ===

    /// List a project's stored contribution set.
    pub fn list_contributions(&self, project_id: &str) -> Result<Vec<Contribution>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, partner_id, percentage, computed_at
             FROM contributions WHERE project_id = ?1 ORDER BY partner_id ASC",
        )?;
        let rows = stmt
            .query_map([project_id], row_to_contribution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Atomically replace a project's contribution set
    /// (delete-all-then-insert in one transaction).
    pub fn replace_contributions(&mut self, project_id: &str, rows: &[Contribution]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx_replace_contributions(&tx, project_id, rows)?;
        tx.commit()?;
        Ok(())
    }

    // === Financial Operations ===

    /// Get a project's financial snapshot.
    pub fn get_financial(&self, project_id: &str) -> Result<Financial> {
        self.conn
            .query_row(
                "SELECT project_id, business_reserve, religious_allocation, net_distributable,
                        base_pool, performance_pool, actual_balance, total_value, computed_at
                 FROM financials WHERE project_id = ?1",
                [project_id],
                row_to_financial,
            )
            .optional()?
            .ok_or_else(|| {
                Error::NotFound(format!("Financial snapshot not found: {}", project_id))
            })
    }

    /// Persist one financial sync: replace the contribution set and
    /// upsert the snapshot, as a single atomic unit.
    pub fn persist_sync(
        &mut self,
        project_id: &str,
        contributions: &[Contribution],
        financial: &Financial,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx_replace_contributions(&tx, project_id, contributions)?;
        tx_upsert_financial(&tx, financial)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist a finalization: lock the project, replace the contribution
    /// set, upsert the snapshot, insert the payout rows, and credit each
    /// partner's earnings - one transaction.
    ///
    /// The lock flag is re-checked inside the transaction; a concurrent
    /// finalize loses the race and gets `Conflict`.
    pub fn persist_finalize(
        &mut self,
        project_id: &str,
        contributions: &[Contribution],
        financial: &Financial,
        payouts: &[Payout],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let locked = tx.execute(
            "UPDATE projects SET is_locked = 1, updated_at = ?2 WHERE id = ?1 AND is_locked = 0",
            params![project_id, now],
        )?;
        if locked == 0 {
            return Err(Error::Conflict(format!(
                "Project already finalized: {}",
                project_id
            )));
        }
        tx_replace_contributions(&tx, project_id, contributions)?;
        tx_upsert_financial(&tx, financial)?;
        for payout in payouts {
            tx.execute(
                r#"
                INSERT INTO payouts
                (id, project_id, partner_id, base_share, performance_share, total_payout, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    payout.id,
                    payout.project_id,
                    payout.partner_id,
                    payout.base_share,
                    payout.performance_share,
                    payout.total_payout,
                    payout.created_at.to_rfc3339(),
                ],
            )?;
            tx.execute(
                "UPDATE partners SET total_earnings = total_earnings + ?2, updated_at = ?3
                 WHERE id = ?1",
                params![payout.partner_id, payout.total_payout, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// List a project's payout rows.
    pub fn list_payouts(&self, project_id: &str) -> Result<Vec<Payout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, partner_id, base_share, performance_share, total_payout,
                    created_at
             FROM payouts WHERE project_id = ?1 ORDER BY partner_id ASC",
        )?;
        let rows = stmt
            .query_map([project_id], row_to_payout)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // === Capital Operations ===

    /// Get a capital injection by ID.
    pub fn get_capital_injection(&self, id: &str) -> Result<CapitalInjection> {
        self.conn
            .query_row(
                "SELECT id, partner_id, amount, equity_delta, post_equity, notes, date, created_at
                 FROM capital_injections WHERE id = ?1",
                [id],
                row_to_capital_injection,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Capital injection not found: {}", id)))
    }

    /// List capital injections, newest first, optionally for one partner.
    pub fn list_capital_injections(&self, partner_id: Option<&str>) -> Result<Vec<CapitalInjection>> {
        let mut sql = String::from(
            "SELECT id, partner_id, amount, equity_delta, post_equity, notes, date, created_at
             FROM capital_injections",
        );
        if partner_id.is_some() {
            sql.push_str(" WHERE partner_id = ?1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match partner_id {
            Some(pid) => stmt
                .query_map([pid], row_to_capital_injection)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], row_to_capital_injection)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }

    /// Apply a capital injection: write every partner's recomputed
    /// position and record the ledger entry - one transaction.
    pub fn apply_capital_injection(
        &mut self,
        entry: &CapitalInjection,
        updates: &[PartnerCapital],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx_update_partner_capital(&tx, updates, &now)?;
        tx.execute(
            r#"
            INSERT INTO capital_injections
            (id, partner_id, amount, equity_delta, post_equity, notes, date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.id,
                entry.partner_id,
                entry.amount,
                entry.equity_delta,
                entry.post_equity,
                entry.notes,
                entry.date.to_string(),
                entry.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Apply a capital injection deletion: remove the ledger entry and
    /// write every partner's recomputed position - one transaction.
    pub fn apply_capital_deletion(&mut self, id: &str, updates: &[PartnerCapital]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let n = tx.execute("DELETE FROM capital_injections WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Capital injection not found: {}", id)));
        }
        tx_update_partner_capital(&tx, updates, &now)?;
        tx.commit()?;
        Ok(())
    }
}

// === Transaction-scoped statement helpers ===
//
// These run plain statements against a connection that is already inside
// a transaction; the caller owns commit/rollback.

fn tx_replace_contributions(
    conn: &Connection,
    project_id: &str,
    rows: &[Contribution],
) -> Result<()> {
    conn.execute(
        "DELETE FROM contributions WHERE project_id = ?1",
        [project_id],
    )?;
    for c in rows {
        conn.execute(
            "INSERT INTO contributions (project_id, partner_id, percentage, computed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![c.project_id, c.partner_id, c.percentage, c.computed_at.to_rfc3339()],
        )?;
    }
    Ok(())
}

fn tx_upsert_financial(conn: &Connection, f: &Financial) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO financials
        (project_id, business_reserve, religious_allocation, net_distributable,
         base_pool, performance_pool, actual_balance, total_value, computed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            f.project_id,
            f.business_reserve,
            f.religious_allocation,
            f.net_distributable,
            f.base_pool,
            f.performance_pool,
            f.actual_balance,
            f.total_value,
            f.computed_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn tx_update_partner_capital(
    conn: &Connection,
    updates: &[PartnerCapital],
    now: &str,
) -> Result<()> {
    for u in updates {
        conn.execute(
            "UPDATE partners
             SET equity_percentage = ?2, total_capital_contributed = ?3, updated_at = ?4
             WHERE id = ?1",
            params![u.partner_id, u.equity_percentage, u.total_capital_contributed, now],
        )?;
    }
    Ok(())
}

// === Row mappers ===

fn row_to_partner(row: &rusqlite::Row<'_>) -> rusqlite::Result<Partner> {
    Ok(Partner {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        equity_percentage: row.get(3)?,
        total_capital_contributed: row.get(4)?,
        total_earnings: row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
        updated_at: parse_ts(7, row.get(7)?)?,
    })
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        total_value: row.get(2)?,
        is_locked: row.get(3)?,
        weights: BTreeMap::new(),
        project_lead_id: row.get(4)?,
        tech_lead_id: row.get(5)?,
        comms_lead_id: row.get(6)?,
        qa_lead_id: row.get(7)?,
        sales_lead_id: row.get(8)?,
        created_at: parse_ts(9, row.get(9)?)?,
        updated_at: parse_ts(10, row.get(10)?)?,
    })
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        effort_weight: row.get(4)?,
        assigned_partner_id: row.get(5)?,
        status: parse_enum(6, &status)?,
        completed_by_id: row.get(7)?,
        created_at: parse_ts(8, row.get(8)?)?,
        updated_at: parse_ts(9, row.get(9)?)?,
    })
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(3)?;
    Ok(Transaction {
        id: row.get(0)?,
        project_id: row.get(1)?,
        amount: row.get(2)?,
        kind: parse_enum(3, &kind)?,
        category: row.get(4)?,
        date: parse_date(5, row.get(5)?)?,
        created_at: parse_ts(6, row.get(6)?)?,
    })
}

fn row_to_contribution(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contribution> {
    Ok(Contribution {
        project_id: row.get(0)?,
        partner_id: row.get(1)?,
        percentage: row.get(2)?,
        computed_at: parse_ts(3, row.get(3)?)?,
    })
}

fn row_to_financial(row: &rusqlite::Row<'_>) -> rusqlite::Result<Financial> {
    Ok(Financial {
        project_id: row.get(0)?,
        business_reserve: row.get(1)?,
        religious_allocation: row.get(2)?,
        net_distributable: row.get(3)?,
        base_pool: row.get(4)?,
        performance_pool: row.get(5)?,
        actual_balance: row.get(6)?,
        total_value: row.get(7)?,
        computed_at: parse_ts(8, row.get(8)?)?,
    })
}

fn row_to_capital_injection(row: &rusqlite::Row<'_>) -> rusqlite::Result<CapitalInjection> {
    Ok(CapitalInjection {
        id: row.get(0)?,
        partner_id: row.get(1)?,
        amount: row.get(2)?,
        equity_delta: row.get(3)?,
        post_equity: row.get(4)?,
        notes: row.get(5)?,
        date: parse_date(6, row.get(6)?)?,
        created_at: parse_ts(7, row.get(7)?)?,
    })
}

fn row_to_payout(row: &rusqlite::Row<'_>) -> rusqlite::Result<Payout> {
    Ok(Payout {
        id: row.get(0)?,
        project_id: row.get(1)?,
        partner_id: row.get(2)?,
        base_share: row.get(3)?,
        performance_share: row.get(4)?,
        total_payout: row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
    })
}

fn parse_ts(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_enum<T: std::str::FromStr<Err = String>>(idx: usize, s: &str) -> rusqlite::Result<T> {
    s.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

// === Storage location ===

/// Root of the divvy data tree: `DV_DATA_DIR` if set, otherwise
/// `~/.local/share/divvy` (platform equivalent).
pub fn data_root() -> Result<PathBuf> {
    if let Ok(dir) = env::var("DV_DATA_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("divvy"))
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under
/// the data root.
pub fn get_storage_dir(workspace: &Path) -> Result<PathBuf> {
    storage_dir_under(workspace, &data_root()?)
}

fn storage_dir_under(workspace: &Path, data_root: &Path) -> Result<PathBuf> {
    let canonical = workspace
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    let short_hash = &hash_hex[..12];

    Ok(data_root.join(short_hash))
}

// === ID helpers ===

/// Generate a unique ID.
///
/// Format: `<prefix>-<4 hex chars>`
/// - Partner prefix: "dvp"
/// - Project prefix: "dvj"
/// - Task prefix: "dvt"
/// - Transaction prefix: "dvx"
/// - Capital injection prefix: "dvc"
/// - Payout prefix: "dvy"
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..4])
}

/// Validate that an ID matches the expected format.
pub fn validate_id(id: &str, prefix: &str) -> Result<()> {
    if !id.starts_with(&format!("{}-", prefix)) {
        return Err(Error::InvalidId(format!(
            "ID must start with '{}-', got: {}",
            prefix, id
        )));
    }

    let suffix = &id[prefix.len() + 1..];
    if suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidId(format!(
            "ID suffix must be 4 hex characters, got: {}",
            suffix
        )));
    }

    Ok(())
}
