use std::fs;
use std::path::{Path, PathBuf};

use super::files::{append_tf, copy_and_remove, pin_provider, remove_resource_block};
use super::state::{MoveOutcome, StateBackend, clear_outputs};
use super::MigrateError;
use crate::config::ImportConfig;
use crate::resource::ResourceKind;

const STATE_FILE: &str = "terraform.tfstate";

/// Filter keys whose import writes one sub-directory per name.
const GROUPED_KEYS: [&str; 2] = ["tagsets", "slack_account_channels"];

#[derive(Debug, Default, PartialEq)]
pub struct MigrationReport {
    pub merged: Vec<ResourceKind>,
    /// Kind or directory name with the error that stopped it.
    pub failed: Vec<(String, String)>,
    /// Directories whose state, outputs and provider were finalized.
    pub finalized: usize,
}

pub struct Migrator {
    root: PathBuf,
    backend: Box<dyn StateBackend>,
}

impl Migrator {
    /// `root` is the provider output directory, e.g. `/terraform/datadog`.
    pub fn new(root: impl Into<PathBuf>, backend: Box<dyn StateBackend>) -> Self {
        Self {
            root: root.into(),
            backend,
        }
    }

    /// Merges every split kind, then finalizes every directory under the
    /// root. Per-kind and per-directory failures land in the report; only a
    /// missing or unreadable root is an error.
    pub async fn migrate(&self, config: &ImportConfig) -> Result<MigrationReport, MigrateError> {
        if !self.root.is_dir() {
            return Err(MigrateError::NoOutput {
                path: self.root.clone(),
            });
        }
        let mut report = MigrationReport::default();

        for entry in config.entries.iter().filter(|e| e.writes_split_state()) {
            let keys = entry.conf.filter_keys();
            match self.merge_kind(entry.kind, &keys).await {
                Ok(true) => report.merged.push(entry.kind),
                Ok(false) => {
                    tracing::debug!(kind = %entry.kind, "no split directories to merge");
                }
                Err(e) => {
                    tracing::error!(kind = %entry.kind, error = %e, "failed to merge state");
                    report.failed.push((entry.kind.to_string(), e.to_string()));
                }
            }
        }

        self.finalize(&mut report)?;
        Ok(report)
    }

    /// Leaf directories (relative to the kind directory) in merge order:
    /// flat keys first, then every named sub-directory of grouped keys.
    fn leaves(kind_dir: &Path, keys: &[&str]) -> Result<Vec<PathBuf>, MigrateError> {
        let existing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| kind_dir.join(key).is_dir())
            .collect();

        let mut leaves: Vec<PathBuf> = existing
            .iter()
            .filter(|key| !GROUPED_KEYS.contains(*key))
            .map(PathBuf::from)
            .collect();

        for key in existing.iter().filter(|key| GROUPED_KEYS.contains(*key)) {
            let group_dir = kind_dir.join(key);
            let mut names = Vec::new();
            for entry in fs::read_dir(&group_dir).map_err(MigrateError::io(&group_dir))? {
                let entry = entry.map_err(MigrateError::io(&group_dir))?;
                if entry.path().is_dir() {
                    names.push(entry.file_name());
                }
            }
            names.sort();
            leaves.extend(names.into_iter().map(|name| Path::new(key).join(name)));
        }
        Ok(leaves)
    }

    async fn merge_kind(&self, kind: ResourceKind, keys: &[&str]) -> Result<bool, MigrateError> {
        let kind_dir = self.root.join(kind.as_str());
        let leaves = Self::leaves(&kind_dir, keys)?;
        let Some((first, rest)) = leaves.split_first() else {
            return Ok(false);
        };

        tracing::info!(%kind, leaves = leaves.len(), "merging split state");
        copy_and_remove(&kind_dir.join(first), &kind_dir)?;

        let tf_name = format!("{kind}.tf");
        for leaf in rest {
            let leaf_dir = kind_dir.join(leaf);
            self.merge_leaf(&leaf_dir, &kind_dir, &tf_name).await?;
            fs::remove_dir_all(&leaf_dir).map_err(MigrateError::io(&leaf_dir))?;
        }

        for key in keys {
            let key_dir = kind_dir.join(key);
            if key_dir.is_dir() {
                fs::remove_dir_all(&key_dir).map_err(MigrateError::io(&key_dir))?;
            }
        }
        Ok(true)
    }

    /// Moves every resource of one leaf into the kind's state and appends
    /// its definitions. Addresses the target already holds are dropped
    /// from the leaf's `.tf` before it is appended.
    async fn merge_leaf(
        &self,
        leaf_dir: &Path,
        kind_dir: &Path,
        tf_name: &str,
    ) -> Result<(), MigrateError> {
        let source_state = leaf_dir.join(STATE_FILE);
        let target_state = kind_dir.join(STATE_FILE);
        let leaf_tf = leaf_dir.join(tf_name);

        if source_state.is_file() {
            for address in self.backend.list(&source_state).await? {
                match self.backend.mv(&source_state, &target_state, &address).await? {
                    MoveOutcome::Moved => {}
                    MoveOutcome::Duplicate => {
                        tracing::warn!(%address, "duplicate resource found, removing from tf file");
                        if leaf_tf.is_file() {
                            remove_resource_block(&leaf_tf, &address)?;
                        }
                    }
                    MoveOutcome::Failed(message) => {
                        tracing::error!(%address, %message, "failed to move resource");
                    }
                }
            }
        }

        append_tf(&leaf_tf, &kind_dir.join(tf_name))?;
        Ok(())
    }

    /// Finalizes every kind directory under the root, sorted by name.
    fn finalize(&self, report: &mut MigrationReport) -> Result<(), MigrateError> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(MigrateError::io(&self.root))? {
            let dir = entry.map_err(MigrateError::io(&self.root))?.path();
            if dir.is_dir() {
                dirs.push(dir);
            }
        }
        dirs.sort();

        for dir in dirs {
            match finalize_dir(&dir) {
                Ok(()) => report.finalized += 1,
                Err(e) => {
                    tracing::error!(dir = %dir.display(), error = %e, "failed to finalize directory");
                    let name = dir
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Clears state outputs, drops `outputs.tf` and pins `provider.tf`.
fn finalize_dir(dir: &Path) -> Result<(), MigrateError> {
    let state = dir.join(STATE_FILE);
    if state.is_file() {
        clear_outputs(&state)?;
    }
    let outputs = dir.join("outputs.tf");
    if outputs.is_file() {
        fs::remove_file(&outputs).map_err(MigrateError::io(&outputs))?;
    }
    let provider = dir.join("provider.tf");
    if provider.is_file() {
        pin_provider(&provider)?;
    }
    Ok(())
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").field("root", &self.root).finish()
    }
}
