use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use super::MigrateError;
use crate::executor::exit_code_from_status;

/// Result of moving one resource address between state files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The target state already tracks this address.
    Duplicate,
    Failed(String),
}

/// The `terraform state` operations the migration needs.
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn list(&self, state: &Path) -> Result<Vec<String>, MigrateError>;

    async fn mv(&self, from: &Path, to: &Path, address: &str)
    -> Result<MoveOutcome, MigrateError>;
}

/// Shells out to the `terraform` binary.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
}

impl TerraformCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new("terraform")
    }
}

#[async_trait]
impl StateBackend for TerraformCli {
    async fn list(&self, state: &Path) -> Result<Vec<String>, MigrateError> {
        let output = Command::new(&self.binary)
            .args(["state", "list"])
            .arg(format!("-state={}", state.display()))
            .output()
            .await
            .map_err(MigrateError::Spawn)?;

        if !output.status.success() {
            return Err(MigrateError::StateList {
                path: state.to_path_buf(),
                message: format!(
                    "exit status {}: {}",
                    exit_code_from_status(output.status),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn mv(
        &self,
        from: &Path,
        to: &Path,
        address: &str,
    ) -> Result<MoveOutcome, MigrateError> {
        tracing::debug!(
            address,
            from = %from.display(),
            to = %to.display(),
            "moving resource between state files"
        );
        let output = Command::new(&self.binary)
            .args(["state", "mv"])
            .arg(format!("-state={}", from.display()))
            .arg(format!("-state-out={}", to.display()))
            .arg(address)
            .arg(address)
            .output()
            .await
            .map_err(MigrateError::Spawn)?;

        if output.status.success() {
            tracing::info!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
            return Ok(MoveOutcome::Moved);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("Invalid target address") {
            Ok(MoveOutcome::Duplicate)
        } else {
            Ok(MoveOutcome::Failed(stderr.trim().to_string()))
        }
    }
}

/// Empties the `outputs` map of a state file, keeping 4-space indentation.
pub fn clear_outputs(path: &Path) -> Result<(), MigrateError> {
    let content = std::fs::read_to_string(path).map_err(MigrateError::io(path))?;
    let mut state: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| MigrateError::StateFile {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(object) = state.as_object_mut() {
        object.insert("outputs".to_string(), serde_json::json!({}));
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    state
        .serialize(&mut serializer)
        .map_err(|source| MigrateError::StateFile {
            path: path.to_path_buf(),
            source,
        })?;

    std::fs::write(path, buf).map_err(MigrateError::io(path))
}
