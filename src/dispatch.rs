//! Categorizes configured resources and drives the import, one command at a
//! time.

use std::path::PathBuf;

use crate::command::{CommandBuilder, ImportCommand, TERRAFORMER_BIN};
use crate::config::ImportConfig;
use crate::executor::{CommandReport, DEFAULT_RETRIES, RetryingExecutor, ShellRunner};
use crate::resource::{Category, ResourceKind};

/// Settings for one import run, passed down explicitly.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub terraformer: String,
    pub working_dir: PathBuf,
    pub retries: u32,
}

impl Default for ImportContext {
    fn default() -> Self {
        Self {
            terraformer: TERRAFORMER_BIN.to_string(),
            working_dir: PathBuf::from("/terraform"),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl ImportContext {
    pub fn builder(&self) -> CommandBuilder {
        CommandBuilder::new(self.terraformer.clone())
    }

    pub fn executor(&self) -> RetryingExecutor {
        RetryingExecutor::new(Box::new(ShellRunner::new(&self.working_dir)), self.retries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanGroup {
    pub category: Category,
    pub commands: Vec<ImportCommand>,
}

/// Every command a run will execute, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// `all` was configured: one global import and nothing else.
    Everything(ImportCommand),
    Categorized(Vec<PlanGroup>),
}

impl Plan {
    pub fn commands(&self) -> Vec<&ImportCommand> {
        match self {
            Plan::Everything(command) => vec![command],
            Plan::Categorized(groups) => groups.iter().flat_map(|g| &g.commands).collect(),
        }
    }
}

/// Buckets every supported entry into exactly one category and builds its
/// commands. Unsupported names are reported and left out.
pub fn plan(config: &ImportConfig, builder: &CommandBuilder) -> Plan {
    for name in &config.unsupported {
        tracing::warn!(
            resource = %name,
            "resource type found in config, but it is not supported; it will not be imported"
        );
    }

    if config.imports_everything() {
        tracing::info!("found \"all\" in configuration; importing all supported resources");
        return Plan::Everything(builder.global());
    }

    let mut groups = Vec::with_capacity(Category::DISPATCH_ORDER.len());
    for category in Category::DISPATCH_ORDER {
        let entries = config.entries.iter().filter(|e| e.category() == category);
        let commands: Vec<ImportCommand> = match category {
            Category::NoIdentifier => {
                let kinds: Vec<ResourceKind> = entries.map(|e| e.kind).collect();
                builder.unfiltered(&kinds).into_iter().collect()
            }
            Category::FlatList | Category::Nested | Category::Bespoke => {
                entries.flat_map(|e| builder.build(e)).collect()
            }
            Category::Global => Vec::new(),
        };
        if !commands.is_empty() {
            groups.push(PlanGroup { category, commands });
        }
    }
    Plan::Categorized(groups)
}

/// Per-command outcomes of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub commands: Vec<CommandReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.commands.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.commands.len() - self.succeeded()
    }
}

/// Executes the plan strictly in order. Individual command failures are
/// recorded in the report and never stop the run.
pub async fn run(plan: &Plan, executor: &RetryingExecutor) -> RunReport {
    let mut report = RunReport::default();
    for command in plan.commands() {
        report.commands.push(executor.execute(command).await);
    }
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "import finished"
    );
    report
}
