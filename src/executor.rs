//! Runs import commands with a bounded retry budget.
//!
//! Failures never escape this module: a command that exhausts its retries
//! is logged and reported, and the caller moves on to the next one.

mod classifier;
mod runner;

pub use classifier::{FALSE_SUCCESS_PHRASES, Outcome, OutcomeClassifier, PhraseClassifier};
pub use runner::{CommandRunner, ExecutionResult, ShellRunner};

pub(crate) use runner::exit_code_from_status;

use crate::command::ImportCommand;

pub const DEFAULT_RETRIES: u32 = 3;

/// Result of running one command to success or exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    pub label: String,
    pub attempts: u32,
    pub outcome: Outcome,
}

impl CommandReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }
}

pub struct RetryingExecutor {
    runner: Box<dyn CommandRunner>,
    classifier: Box<dyn OutcomeClassifier>,
    retries: u32,
}

impl RetryingExecutor {
    pub fn new(runner: Box<dyn CommandRunner>, retries: u32) -> Self {
        Self::with_classifier(runner, Box::new(PhraseClassifier::default()), retries)
    }

    pub fn with_classifier(
        runner: Box<dyn CommandRunner>,
        classifier: Box<dyn OutcomeClassifier>,
        retries: u32,
    ) -> Self {
        Self {
            runner,
            classifier,
            retries,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Runs `command` until it succeeds or `retries + 1` attempts are spent.
    pub async fn execute(&self, command: &ImportCommand) -> CommandReport {
        self.run_with_label(&command.to_string(), command.label()).await
    }

    /// Same as [`execute`](Self::execute) for an already rendered line.
    pub async fn execute_line(&self, command: &str) -> CommandReport {
        self.run_with_label(command, command.to_string()).await
    }

    async fn run_with_label(&self, command: &str, label: String) -> CommandReport {
        tracing::debug!(command, "running command");
        let max_attempts = self.retries.saturating_add(1);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let (reason, output) = match self.runner.run(command).await {
                Ok(result) => match self.classifier.classify(&result) {
                    Outcome::Success => {
                        tracing::info!(command, attempt, "{}", result.stdout.trim_end());
                        return CommandReport {
                            command: command.to_string(),
                            label,
                            attempts: attempt,
                            outcome: Outcome::Success,
                        };
                    }
                    Outcome::Failure(reason) => (reason, combined_output(&result)),
                },
                Err(e) => (format!("failed to run: {e}"), String::new()),
            };

            let retries_left = max_attempts.saturating_sub(attempt);
            if retries_left == 0 {
                tracing::error!(
                    command,
                    attempts = attempt,
                    %reason,
                    %output,
                    "command failed, no retries left"
                );
                return CommandReport {
                    command: command.to_string(),
                    label,
                    attempts: attempt,
                    outcome: Outcome::Failure(reason),
                };
            }

            tracing::warn!(
                command,
                %reason,
                %output,
                retries_left,
                "command failed, retrying"
            );
        }
    }
}

/// Stdout followed by stderr, each trimmed, skipping empty streams.
fn combined_output(result: &ExecutionResult) -> String {
    [result.stdout.trim(), result.stderr.trim()]
        .into_iter()
        .filter(|stream| !stream.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl std::fmt::Debug for RetryingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingExecutor")
            .field("retries", &self.retries)
            .finish()
    }
}
