//! Reconciliation issue handlers.
//!
//! The controller only keeps issues in memory, so each CLI run appends
//! the issues it produced to `reconciliation.json` in the cache directory.

use std::path::{Path, PathBuf};

use tabled::Tabled;
use tracing::debug;

use boutique_core::{Controller, ReconciliationIssue};

use crate::cli::{GlobalOpts, ReconcileArgs, ReconcileCommand};
use crate::error::CliError;
use crate::output;

const ISSUES_FILE: &str = "reconciliation.json";

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "When")]
    at: String,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn issues_path(controller: &Controller) -> Option<PathBuf> {
    controller.cache().dir().map(|dir| dir.join(ISSUES_FILE))
}

fn load(path: &Path) -> Result<Vec<ReconciliationIssue>, CliError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Append the controller's in-memory issues to the issues file.
pub fn record(controller: &Controller) -> Result<(), CliError> {
    let fresh = controller.reconciliation_issues();
    if fresh.is_empty() {
        return Ok(());
    }
    let Some(path) = issues_path(controller) else {
        return Ok(());
    };

    let mut issues = load(&path)?;
    issues.extend(fresh.iter().cloned());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&issues)?)?;
    controller.clear_reconciliation_issues();
    debug!(count = fresh.len(), path = %path.display(), "reconciliation issues recorded");
    Ok(())
}

pub fn handle(
    controller: &Controller,
    args: ReconcileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = issues_path(controller);

    match args.command {
        ReconcileCommand::List => {
            let mut issues = match &path {
                Some(path) => load(path)?,
                None => Vec::new(),
            };
            issues.extend(controller.reconciliation_issues().iter().cloned());

            let out = output::render_list(
                &global.output,
                &issues,
                |i| IssueRow {
                    at: i.at.format("%Y-%m-%d %H:%M").to_string(),
                    operation: i.operation.clone(),
                    entity: i.entity.clone(),
                    id: i.id.to_string(),
                    detail: i.detail.clone(),
                },
                |i| i.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReconcileCommand::Clear => {
            if let Some(path) = &path {
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
            controller.clear_reconciliation_issues();
            output::success(global, "Reconciliation issues cleared");
            Ok(())
        }
    }
}
