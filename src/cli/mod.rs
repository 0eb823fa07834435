//! CLI argument definitions for Divvy.

use clap::{Parser, Subcommand};

/// Divvy - partnership project tracking and profit sharing.
///
/// Track partners, projects, tasks and cash flows; derive contribution
/// percentages, financial snapshots, payouts, and equity.
#[derive(Parser, Debug)]
#[command(name = "dv")]
#[command(author, version, about = "A CLI tool for partnership project tracking and profit sharing", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if dv was started in <path> instead of the current directory.
    /// The path must exist. Can also be set via the DV_DIR environment
    /// variable.
    #[arg(short = 'C', long = "dir", global = true, env = "DV_DIR")]
    pub workspace: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Partner management commands
    Partner {
        #[command(subcommand)]
        command: PartnerCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Ledger transaction commands
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },

    /// Contribution percentage commands
    Contrib {
        #[command(subcommand)]
        command: ContribCommands,
    },

    /// Financial snapshot commands
    Financial {
        #[command(subcommand)]
        command: FinancialCommands,
    },

    /// Capital and equity commands
    Capital {
        #[command(subcommand)]
        command: CapitalCommands,
    },

    /// Payout commands
    Payout {
        #[command(subcommand)]
        command: PayoutCommands,
    },

    /// Show the audit trail of executed commands
    Log {
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// System administration commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Initialize divvy for the current workspace
    Init,

    /// Show version and build information
    Version,
}

/// Partner subcommands
#[derive(Subcommand, Debug)]
pub enum PartnerCommands {
    /// Add a new partner
    Add {
        /// Partner display name
        name: String,

        /// User who owns this partner profile
        #[arg(short, long)]
        user: String,
    },

    /// List all partners
    List,

    /// Show partner details
    Show {
        /// Partner ID (e.g., dvp-a1b2)
        id: String,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name
        name: String,

        /// Agreed project value
        #[arg(short, long)]
        value: Option<f64>,

        /// Designated project lead (partner ID)
        #[arg(long)]
        lead: Option<String>,

        /// Designated tech lead (partner ID)
        #[arg(long)]
        tech_lead: Option<String>,

        /// Designated comms lead (partner ID)
        #[arg(long)]
        comms_lead: Option<String>,

        /// Designated QA lead (partner ID)
        #[arg(long)]
        qa_lead: Option<String>,

        /// Designated sales lead (partner ID)
        #[arg(long)]
        sales_lead: Option<String>,
    },

    /// Update a project's name, value, or leads
    Update {
        /// Project ID (e.g., dvj-a1b2)
        id: String,

        /// New project name
        #[arg(long)]
        name: Option<String>,

        /// New agreed project value
        #[arg(short, long)]
        value: Option<f64>,

        /// Designated project lead (partner ID)
        #[arg(long)]
        lead: Option<String>,

        /// Designated tech lead (partner ID)
        #[arg(long)]
        tech_lead: Option<String>,

        /// Designated comms lead (partner ID)
        #[arg(long)]
        comms_lead: Option<String>,

        /// Designated QA lead (partner ID)
        #[arg(long)]
        qa_lead: Option<String>,

        /// Designated sales lead (partner ID)
        #[arg(long)]
        sales_lead: Option<String>,
    },

    /// List all projects
    List,

    /// Show project details
    Show {
        /// Project ID (e.g., dvj-a1b2)
        id: String,
    },

    /// Set one category weight on a project
    Weight {
        /// Project ID (e.g., dvj-a1b2)
        id: String,

        /// Category name
        category: String,

        /// Percentage weight
        weight: f64,
    },

    /// Finalize a project: lock it and generate payouts (terminal)
    Finalize {
        /// Project ID (e.g., dvj-a1b2)
        id: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Owning project ID (e.g., dvj-a1b2)
        project: String,

        /// Task title
        title: String,

        /// Category (key into the project's weight map)
        #[arg(short, long)]
        category: Option<String>,

        /// Relative effort units (positive)
        #[arg(short, long, default_value = "1.0")]
        effort: f64,

        /// Assigned partner ID
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Update a task (status: backlog, in_progress, review, done)
    Update {
        /// Task ID (e.g., dvt-a1b2)
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New category (empty string clears it)
        #[arg(short, long)]
        category: Option<String>,

        /// New effort weight
        #[arg(short, long)]
        effort: Option<f64>,

        /// New assigned partner ID
        #[arg(short, long)]
        assignee: Option<String>,

        /// New status (backlog, in_progress, review, done)
        #[arg(short, long)]
        status: Option<String>,

        /// User credited with completion (takes effect on done tasks)
        #[arg(long)]
        completed_by: Option<String>,
    },

    /// List a project's tasks
    List {
        /// Project ID (e.g., dvj-a1b2)
        project: String,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID (e.g., dvt-a1b2)
        id: String,
    },
}

/// Transaction subcommands
#[derive(Subcommand, Debug)]
pub enum TxCommands {
    /// Record a transaction
    Add {
        /// Owning project ID (e.g., dvj-a1b2)
        project: String,

        /// Amount (positive)
        amount: f64,

        /// Transaction kind (income, expense)
        #[arg(short, long)]
        kind: String,

        /// Category label
        #[arg(short, long)]
        category: Option<String>,

        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List a project's transactions
    List {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID (e.g., dvx-a1b2)
        id: String,
    },
}

/// Contribution subcommands
#[derive(Subcommand, Debug)]
pub enum ContribCommands {
    /// Recompute and store a project's contribution percentages
    Recompute {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },

    /// Show a project's stored contribution percentages
    List {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },
}

/// Financial subcommands
#[derive(Subcommand, Debug)]
pub enum FinancialCommands {
    /// Recompute a project's contributions and financial snapshot
    Sync {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },

    /// Show a project's stored financial snapshot
    Show {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },
}

/// Capital subcommands
#[derive(Subcommand, Debug)]
pub enum CapitalCommands {
    /// Inject capital for a partner (recomputes all equity)
    Inject {
        /// Partner ID (e.g., dvp-a1b2)
        partner: String,

        /// Amount (positive)
        amount: f64,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List capital injections
    List {
        /// Filter by partner ID
        #[arg(short, long)]
        partner: Option<String>,
    },

    /// Delete a capital injection (recomputes all equity)
    Delete {
        /// Capital injection ID (e.g., dvc-a1b2)
        id: String,
    },
}

/// Payout subcommands
#[derive(Subcommand, Debug)]
pub enum PayoutCommands {
    /// List a finalized project's payouts
    List {
        /// Project ID (e.g., dvj-a1b2)
        project: String,
    },
}
