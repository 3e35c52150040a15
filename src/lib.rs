//! ddtf - Datadog Terraformer import driver
//!
//! A library for turning a declarative list of Datadog resources into
//! `terraformer` import commands, running them with retries, and merging the
//! split Terraform state they produce.

pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod logging;
pub mod output;
pub mod resource;
pub mod terraform;

mod error;

pub use command::{CommandBuilder, ImportCommand};
pub use config::{ConfigError, ImportConfig, ResourceConf, ResourceEntry};
pub use dispatch::{ImportContext, Plan, RunReport};
pub use error::DdtfError;
pub use executor::{CommandReport, Outcome, RetryingExecutor};
pub use resource::{Category, ResourceKind};
pub use terraform::{MigrateError, MigrationReport, Migrator, TerraformCli};
