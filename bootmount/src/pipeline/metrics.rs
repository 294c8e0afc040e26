use crate::pipeline::FailurePolicy;

/// How a step ended without aborting the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped,
    /// The target was already mounted and the policy tolerated it.
    AlreadyMounted,
    /// The step failed under a warn-only policy.
    Warned(String),
}

#[derive(Debug, Clone)]
pub struct StepMetrics {
    pub index: usize,
    pub name: String,
    pub policy: FailurePolicy,
    pub outcome: StepOutcome,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub total_duration_ms: u128,
    pub steps: Vec<StepMetrics>,
}

impl PipelineMetrics {
    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| &step.outcome)
    }

    /// Names of the steps that failed under a warn-only policy.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Warned(_)))
            .map(|step| step.name.as_str())
    }
}
