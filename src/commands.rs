//! Entry points behind each CLI subcommand.

use std::path::Path;

use crate::config::ImportConfig;
use crate::dispatch::{self, ImportContext, Plan, RunReport};
use crate::error::DdtfError;
use crate::executor::RetryingExecutor;
use crate::terraform::{MigrationReport, Migrator, StateBackend};

/// Directory terraformer writes the provider's output into.
pub const PROVIDER_DIR: &str = "datadog";

/// Loads and validates the configuration at `path`.
pub fn validate(path: &Path) -> Result<ImportConfig, DdtfError> {
    let config = ImportConfig::load(path)?;
    tracing::info!(
        path = %path.display(),
        resources = config.entries.len(),
        unsupported = config.unsupported.len(),
        "configuration is valid"
    );
    Ok(config)
}

/// Validates the configuration and builds the commands an import would run.
pub fn plan(path: &Path, ctx: &ImportContext) -> Result<Plan, DdtfError> {
    let config = validate(path)?;
    Ok(dispatch::plan(&config, &ctx.builder()))
}

/// Validates, then runs every command through the shell.
pub async fn import(path: &Path, ctx: &ImportContext) -> Result<RunReport, DdtfError> {
    import_with(path, ctx, &ctx.executor()).await
}

/// Same as [`import`] with a caller-supplied executor.
pub async fn import_with(
    path: &Path,
    ctx: &ImportContext,
    executor: &RetryingExecutor,
) -> Result<RunReport, DdtfError> {
    let plan = plan(path, ctx)?;
    tracing::info!(
        commands = plan.commands().len(),
        retries = executor.retries(),
        working_dir = %ctx.working_dir.display(),
        "starting import"
    );
    Ok(dispatch::run(&plan, executor).await)
}

/// Merges the split state written by filtered imports under
/// `<working_dir>/datadog`.
pub async fn migrate(
    path: &Path,
    working_dir: &Path,
    backend: Box<dyn StateBackend>,
) -> Result<MigrationReport, DdtfError> {
    let config = validate(path)?;
    let root = working_dir.join(PROVIDER_DIR);
    tracing::info!(root = %root.display(), "migrating state");
    let report = Migrator::new(root, backend).migrate(&config).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate(&dir.path().join("conf.yaml")).unwrap_err();
        assert!(matches!(err, DdtfError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_plan_uses_context_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        std::fs::write(&path, "resources:\n  - role:\n").unwrap();
        let ctx = ImportContext {
            terraformer: "/opt/terraformer".to_string(),
            ..ImportContext::default()
        };

        let plan = plan(&path, &ctx).unwrap();

        let commands = plan.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].to_string().starts_with("/opt/terraformer import datadog"));
    }
}
