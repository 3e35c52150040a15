mod cli;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Command};
use ddtf::dispatch::ImportContext;
use ddtf::{TerraformCli, commands, logging, output};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(
            std::env::var(logging::LOG_LEVEL_ENV).ok().as_deref(),
        ))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate => {
            commands::validate(&cli.config)?;
        }
        Command::Plan(args) => {
            let ctx = ImportContext {
                terraformer: args.terraformer,
                working_dir: cli.working_dir,
                ..ImportContext::default()
            };
            let plan = commands::plan(&cli.config, &ctx)?;
            println!("{}", output::plan_tree(&plan));
        }
        Command::Import(args) => {
            let ctx = ImportContext {
                terraformer: args.terraformer,
                working_dir: cli.working_dir,
                retries: args.retries,
            };
            let report = commands::import(&cli.config, &ctx).await?;
            println!("{}", output::summary_table(&report));
        }
        Command::Migrate(args) => {
            let backend = Box::new(TerraformCli::new(args.terraform));
            let report = commands::migrate(&cli.config, &cli.working_dir, backend).await?;
            tracing::info!(
                merged = report.merged.len(),
                failed = report.failed.len(),
                finalized = report.finalized,
                "migration complete"
            );
        }
    }

    Ok(())
}
