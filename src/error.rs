use thiserror::Error;

use crate::config::ConfigError;
use crate::terraform::MigrateError;

#[derive(Debug, Error)]
pub enum DdtfError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("state migration failed: {0}")]
    Migrate(#[from] MigrateError),
}
