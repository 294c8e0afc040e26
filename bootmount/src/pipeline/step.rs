//! Step definition for table-driven execution.

/// What a failed step means for the rest of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the sequence and return the error.
    Fatal,
    /// Log the error and continue with the next step.
    Warn,
    /// Treat "already mounted" as success; any other error is fatal.
    TolerateBusy,
}

/// A task and the failure policy it runs under.
#[derive(Debug, Clone)]
pub struct Step<T> {
    pub task: T,
    pub policy: FailurePolicy,
}

impl<T> Step<T> {
    pub fn new(task: T, policy: FailurePolicy) -> Self {
        Self { task, policy }
    }

    pub fn fatal(task: T) -> Self {
        Self::new(task, FailurePolicy::Fatal)
    }

    pub fn warn(task: T) -> Self {
        Self::new(task, FailurePolicy::Warn)
    }

    pub fn tolerate_busy(task: T) -> Self {
        Self::new(task, FailurePolicy::TolerateBusy)
    }
}
