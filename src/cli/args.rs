use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ddtf::command::TERRAFORMER_BIN;
use ddtf::executor::DEFAULT_RETRIES;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Import configuration file
    #[arg(long, global = true, env = "DDTF_CONFIG", default_value = "conf.yaml")]
    pub config: PathBuf,

    /// Directory terraformer runs in and writes `datadog/` under
    #[arg(long, global = true, env = "DDTF_WORKING_DIR", default_value = "/terraform")]
    pub working_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and import every configured resource
    Import(ImportArgs),
    /// Print the import commands without running them
    Plan(PlanArgs),
    /// Validate the configuration only
    Validate,
    /// Merge split state directories left by filtered imports
    Migrate(MigrateArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    #[arg(long, env = "DDTF_TERRAFORMER", default_value = TERRAFORMER_BIN)]
    pub terraformer: String,

    /// Extra attempts after the first failure of a command
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    #[arg(long, env = "DDTF_TERRAFORMER", default_value = TERRAFORMER_BIN)]
    pub terraformer: String,
}

#[derive(clap::Args, Debug)]
pub struct MigrateArgs {
    #[arg(long, env = "DDTF_TERRAFORM", default_value = "terraform")]
    pub terraform: PathBuf,
}
