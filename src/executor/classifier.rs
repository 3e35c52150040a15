use super::ExecutionResult;

/// Phrases terraformer prints while still exiting 0 after a resource failed.
pub const FALSE_SUCCESS_PHRASES: &[&str] = &[
    "error initializing resources in service",
    "Unable to refresh resource",
    "cannot assign requested address",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Decides whether one attempt succeeded.
pub trait OutcomeClassifier: Send + Sync {
    fn classify(&self, result: &ExecutionResult) -> Outcome;
}

/// Requires exit code 0 and none of the known false-success phrases on stdout.
#[derive(Debug, Clone)]
pub struct PhraseClassifier {
    phrases: Vec<String>,
}

impl Default for PhraseClassifier {
    fn default() -> Self {
        Self::new(FALSE_SUCCESS_PHRASES.iter().copied())
    }
}

impl PhraseClassifier {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }
}

impl OutcomeClassifier for PhraseClassifier {
    fn classify(&self, result: &ExecutionResult) -> Outcome {
        if let Some(phrase) = self.phrases.iter().find(|p| result.stdout.contains(p.as_str())) {
            return Outcome::Failure(format!("output reported \"{phrase}\""));
        }
        if result.exit_code != 0 {
            let stderr = result.stderr.trim();
            return Outcome::Failure(if stderr.is_empty() {
                format!("exited with status {}", result.exit_code)
            } else {
                format!("exited with status {}: {stderr}", result.exit_code)
            });
        }
        Outcome::Success
    }
}
