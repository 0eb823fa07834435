//! Divvy CLI - partnership project tracking and profit sharing.

use clap::Parser;
use divvy::action_log;
use divvy::cli::{
    CapitalCommands, Cli, Commands, ContribCommands, FinancialCommands, PartnerCommands,
    PayoutCommands, ProjectCommands, SystemCommands, TaskCommands, TxCommands,
};
use divvy::commands::{self, LeadArgs, Output, TaskUpdateArgs};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine workspace path: --dir flag > DV_DIR env > current directory
    let workspace = resolve_workspace(cli.workspace, human);

    // Serialize command for logging
    let (cmd_name, args_json) = serialize_command(&cli.command);

    // Start timing
    let start = Instant::now();

    // Execute command
    let result = run_command(cli.command, &workspace, human);

    // Calculate duration
    let duration = start.elapsed().as_millis() as u64;

    // Determine success/error
    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Log the action (warns on stderr if logging itself fails)
    action_log::log_action(&workspace, &cmd_name, args_json, success, error, duration);

    // Handle result
    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace path from the explicit flag/env or fall back to
/// the current working directory.
fn resolve_workspace(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!(
                        "Error: Specified workspace path does not exist: {}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!(
                                "Specified workspace path does not exist: {}",
                                path.display()
                            )
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(command: Commands, workspace: &Path, human: bool) -> Result<(), divvy::Error> {
    match command {
        Commands::System { command } => match command {
            SystemCommands::Init => {
                let result = commands::system_init(workspace)?;
                output(&result, human);
            }
            SystemCommands::Version => {
                let result = commands::system_version();
                output(&result, human);
            }
        },

        Commands::Partner { command } => match command {
            PartnerCommands::Add { name, user } => {
                let result = commands::partner_add(workspace, &name, &user)?;
                output(&result, human);
            }
            PartnerCommands::List => {
                let result = commands::partner_list(workspace)?;
                output(&result, human);
            }
            PartnerCommands::Show { id } => {
                let result = commands::partner_show(workspace, &id)?;
                output(&result, human);
            }
        },

        Commands::Project { command } => match command {
            ProjectCommands::Create {
                name,
                value,
                lead,
                tech_lead,
                comms_lead,
                qa_lead,
                sales_lead,
            } => {
                let leads = LeadArgs {
                    project_lead: lead,
                    tech_lead,
                    comms_lead,
                    qa_lead,
                    sales_lead,
                };
                let result = commands::project_create(workspace, &name, value, &leads)?;
                output(&result, human);
            }
            ProjectCommands::Update {
                id,
                name,
                value,
                lead,
                tech_lead,
                comms_lead,
                qa_lead,
                sales_lead,
            } => {
                let leads = LeadArgs {
                    project_lead: lead,
                    tech_lead,
                    comms_lead,
                    qa_lead,
                    sales_lead,
                };
                let result = commands::project_update(workspace, &id, name, value, &leads)?;
                output(&result, human);
            }
            ProjectCommands::List => {
                let result = commands::project_list(workspace)?;
                output(&result, human);
            }
            ProjectCommands::Show { id } => {
                let result = commands::project_show(workspace, &id)?;
                output(&result, human);
            }
            ProjectCommands::Weight {
                id,
                category,
                weight,
            } => {
                let result = commands::project_weight(workspace, &id, &category, weight)?;
                output(&result, human);
            }
            ProjectCommands::Finalize { id } => {
                let result = commands::project_finalize(workspace, &id)?;
                output(&result, human);
            }
        },

        Commands::Task { command } => match command {
            TaskCommands::Create {
                project,
                title,
                category,
                effort,
                assignee,
            } => {
                let result =
                    commands::task_create(workspace, &project, &title, category, effort, assignee)?;
                output(&result, human);
            }
            TaskCommands::Update {
                id,
                title,
                category,
                effort,
                assignee,
                status,
                completed_by,
            } => {
                let args = TaskUpdateArgs {
                    title,
                    category,
                    effort,
                    assignee,
                    status,
                    completed_by,
                };
                let result = commands::task_update(workspace, &id, &args)?;
                output(&result, human);
            }
            TaskCommands::List { project, status } => {
                let result = commands::task_list(workspace, &project, status)?;
                output(&result, human);
            }
            TaskCommands::Delete { id } => {
                let result = commands::task_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Commands::Tx { command } => match command {
            TxCommands::Add {
                project,
                amount,
                kind,
                category,
                date,
            } => {
                let result = commands::tx_add(workspace, &project, amount, &kind, category, date)?;
                output(&result, human);
            }
            TxCommands::List { project } => {
                let result = commands::tx_list(workspace, &project)?;
                output(&result, human);
            }
            TxCommands::Delete { id } => {
                let result = commands::tx_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Commands::Contrib { command } => match command {
            ContribCommands::Recompute { project } => {
                let result = commands::contrib_recompute(workspace, &project)?;
                output(&result, human);
            }
            ContribCommands::List { project } => {
                let result = commands::contrib_list(workspace, &project)?;
                output(&result, human);
            }
        },

        Commands::Financial { command } => match command {
            FinancialCommands::Sync { project } => {
                let result = commands::financial_sync(workspace, &project)?;
                output(&result, human);
            }
            FinancialCommands::Show { project } => {
                let result = commands::financial_show(workspace, &project)?;
                output(&result, human);
            }
        },

        Commands::Capital { command } => match command {
            CapitalCommands::Inject {
                partner,
                amount,
                notes,
            } => {
                let result = commands::capital_inject(workspace, &partner, amount, notes)?;
                output(&result, human);
            }
            CapitalCommands::List { partner } => {
                let result = commands::capital_list(workspace, partner.as_deref())?;
                output(&result, human);
            }
            CapitalCommands::Delete { id } => {
                let result = commands::capital_delete(workspace, &id)?;
                output(&result, human);
            }
        },

        Commands::Payout { command } => match command {
            PayoutCommands::List { project } => {
                let result = commands::payout_list(workspace, &project)?;
                output(&result, human);
            }
        },

        Commands::Log { limit } => {
            let result = commands::log_show(limit)?;
            output(&result, human);
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Serialize the command name and arguments for action logging.
fn serialize_command(command: &Commands) -> (String, serde_json::Value) {
    match command {
        Commands::System { command } => match command {
            SystemCommands::Init => ("system init".to_string(), serde_json::json!({})),
            SystemCommands::Version => ("system version".to_string(), serde_json::json!({})),
        },

        Commands::Partner { command } => match command {
            PartnerCommands::Add { name, user } => (
                "partner add".to_string(),
                serde_json::json!({ "name": name, "user": user }),
            ),
            PartnerCommands::List => ("partner list".to_string(), serde_json::json!({})),
            PartnerCommands::Show { id } => {
                ("partner show".to_string(), serde_json::json!({ "id": id }))
            }
        },

        Commands::Project { command } => match command {
            ProjectCommands::Create { name, value, .. } => (
                "project create".to_string(),
                serde_json::json!({ "name": name, "value": value }),
            ),
            ProjectCommands::Update { id, name, value, .. } => (
                "project update".to_string(),
                serde_json::json!({ "id": id, "name": name, "value": value }),
            ),
            ProjectCommands::List => ("project list".to_string(), serde_json::json!({})),
            ProjectCommands::Show { id } => {
                ("project show".to_string(), serde_json::json!({ "id": id }))
            }
            ProjectCommands::Weight {
                id,
                category,
                weight,
            } => (
                "project weight".to_string(),
                serde_json::json!({ "id": id, "category": category, "weight": weight }),
            ),
            ProjectCommands::Finalize { id } => (
                "project finalize".to_string(),
                serde_json::json!({ "id": id }),
            ),
        },

        Commands::Task { command } => match command {
            TaskCommands::Create {
                project,
                title,
                category,
                effort,
                assignee,
            } => (
                "task create".to_string(),
                serde_json::json!({
                    "project": project,
                    "title": title,
                    "category": category,
                    "effort": effort,
                    "assignee": assignee,
                }),
            ),
            TaskCommands::Update {
                id,
                status,
                effort,
                completed_by,
                ..
            } => (
                "task update".to_string(),
                serde_json::json!({
                    "id": id,
                    "status": status,
                    "effort": effort,
                    "completed_by": completed_by,
                }),
            ),
            TaskCommands::List { project, status } => (
                "task list".to_string(),
                serde_json::json!({ "project": project, "status": status }),
            ),
            TaskCommands::Delete { id } => {
                ("task delete".to_string(), serde_json::json!({ "id": id }))
            }
        },

        Commands::Tx { command } => match command {
            TxCommands::Add {
                project,
                amount,
                kind,
                category,
                date,
            } => (
                "tx add".to_string(),
                serde_json::json!({
                    "project": project,
                    "amount": amount,
                    "kind": kind,
                    "category": category,
                    "date": date,
                }),
            ),
            TxCommands::List { project } => (
                "tx list".to_string(),
                serde_json::json!({ "project": project }),
            ),
            TxCommands::Delete { id } => {
                ("tx delete".to_string(), serde_json::json!({ "id": id }))
            }
        },

        Commands::Contrib { command } => match command {
            ContribCommands::Recompute { project } => (
                "contrib recompute".to_string(),
                serde_json::json!({ "project": project }),
            ),
            ContribCommands::List { project } => (
                "contrib list".to_string(),
                serde_json::json!({ "project": project }),
            ),
        },

        Commands::Financial { command } => match command {
            FinancialCommands::Sync { project } => (
                "financial sync".to_string(),
                serde_json::json!({ "project": project }),
            ),
            FinancialCommands::Show { project } => (
                "financial show".to_string(),
                serde_json::json!({ "project": project }),
            ),
        },

        Commands::Capital { command } => match command {
            CapitalCommands::Inject {
                partner, amount, ..
            } => (
                "capital inject".to_string(),
                serde_json::json!({ "partner": partner, "amount": amount }),
            ),
            CapitalCommands::List { partner } => (
                "capital list".to_string(),
                serde_json::json!({ "partner": partner }),
            ),
            CapitalCommands::Delete { id } => (
                "capital delete".to_string(),
                serde_json::json!({ "id": id }),
            ),
        },

        Commands::Payout { command } => match command {
            PayoutCommands::List { project } => (
                "payout list".to_string(),
                serde_json::json!({ "project": project }),
            ),
        },

        Commands::Log { limit } => ("log".to_string(), serde_json::json!({ "limit": limit })),
    }
}
