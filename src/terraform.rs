//! Post-import merging of split Terraform state.
//!
//! Filtered imports land in one directory per filter (`monitor/ids`,
//! `monitor/tagsets/team_a`, ...). `migrate` folds those back into a single
//! `monitor/` directory so the result is one Terraform root per kind.

mod files;
mod migrate;
mod state;

use std::path::PathBuf;

use thiserror::Error;

pub use files::{PINNED_PROVIDER, append_tf, copy_and_remove, remove_resource_block};
pub use migrate::{MigrationReport, Migrator};
pub use state::{MoveOutcome, StateBackend, TerraformCli, clear_outputs};

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no terraformer output found at '{}', run an import first", path.display())]
    NoOutput { path: PathBuf },

    #[error("failed to run terraform: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("terraform state list failed for '{}': {message}", path.display())]
    StateList { path: PathBuf, message: String },

    #[error("invalid state file '{}': {source}", path.display())]
    StateFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected resource address '{0}'")]
    Address(String),
}

impl MigrateError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| MigrateError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = MigrateError::io("/terraform/datadog/monitor")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(
            err.to_string(),
            "I/O error at '/terraform/datadog/monitor': denied"
        );
    }

    #[test]
    fn test_state_list_error_display() {
        let err = MigrateError::StateList {
            path: PathBuf::from("ids/terraform.tfstate"),
            message: "no state".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "terraform state list failed for 'ids/terraform.tfstate': no state"
        );
    }
}
