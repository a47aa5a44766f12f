//! Applying a migration script to a database backend, one statement at a time.

mod error;
mod sqlite;
mod supabase;

use crate::config::DeployTarget;
use crate::sql::split_statements;
use thiserror::Error;
use tracing::{info, warn};

pub use sqlite::SqliteExecutor;
pub use supabase::SupabaseExecutor;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Missing backend credentials: {0} is not set")]
    MissingCredentials(String),
    #[error("No active session: sign in and provide SUPABASE_ACCESS_TOKEN")]
    NoSession,
    #[error("No deployment target configured (use --sqlite or --supabase-url)")]
    NoTarget,
    #[error("The SQL script contains no statements")]
    EmptyScript,
    #[error("Failed to open backend: {0}")]
    Backend(String),
    #[error("Command execution failed (statement {index}): {message}")]
    Command {
        index: usize,
        statement: String,
        message: String,
    },
}

/// Backend that runs one raw SQL command per call
pub trait SqlExecutor: Send {
    fn describe(&self) -> String;
    fn execute(&mut self, statement: &str) -> anyhow::Result<()>;
}

/// Stages reported while deploying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    PreparingSql,
    PreparingCommands,
    Executing,
    Complete,
}

impl DeployStep {
    pub const ALL: [DeployStep; 4] = [
        DeployStep::PreparingSql,
        DeployStep::PreparingCommands,
        DeployStep::Executing,
        DeployStep::Complete,
    ];

    /// 1-based position in [`DeployStep::ALL`]
    pub fn number(self) -> usize {
        match self {
            DeployStep::PreparingSql => 1,
            DeployStep::PreparingCommands => 2,
            DeployStep::Executing => 3,
            DeployStep::Complete => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeployStep::PreparingSql => "Preparing SQL script",
            DeployStep::PreparingCommands => "Preparing commands",
            DeployStep::Executing => "Executing commands",
            DeployStep::Complete => "Deployment complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub executed: usize,
    pub target: String,
}

/// Open the executor for a configured target, refusing missing credentials up front
pub fn open_executor(target: Option<&DeployTarget>) -> Result<Box<dyn SqlExecutor>, DeployError> {
    match target {
        None => Err(DeployError::NoTarget),
        Some(DeployTarget::Sqlite(path)) => SqliteExecutor::open(path)
            .map(|e| Box::new(e) as Box<dyn SqlExecutor>)
            .map_err(|e| DeployError::Backend(format!("{:#}", e))),
        Some(DeployTarget::Supabase(config)) => {
            SupabaseExecutor::new(config).map(|e| Box::new(e) as Box<dyn SqlExecutor>)
        }
    }
}

/// Run every statement of `script` in order, stopping at the first failure.
///
/// Statements already applied stay applied.
pub fn deploy(
    script: &str,
    executor: &mut dyn SqlExecutor,
    mut progress: impl FnMut(DeployStep),
) -> Result<DeployReport, DeployError> {
    progress(DeployStep::PreparingSql);
    let statements = split_statements(script);

    progress(DeployStep::PreparingCommands);
    if statements.is_empty() {
        return Err(DeployError::EmptyScript);
    }
    let target = executor.describe();
    info!(count = statements.len(), %target, "deploying schema");

    progress(DeployStep::Executing);
    for (idx, statement) in statements.iter().enumerate() {
        if let Err(e) = executor.execute(statement) {
            warn!(index = idx + 1, error = %e, "statement failed, aborting deployment");
            return Err(DeployError::Command {
                index: idx + 1,
                statement: statement.clone(),
                message: format!("{:#}", e),
            });
        }
    }

    progress(DeployStep::Complete);
    info!(count = statements.len(), "deployment finished");
    Ok(DeployReport {
        executed: statements.len(),
        target,
    })
}
