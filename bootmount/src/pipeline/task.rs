//! Generic task trait for pipeline execution.

use bootmount_shared::errors::BootResult;

/// What a successful task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task performed its side effect.
    Done,
    /// The task found nothing to do.
    NotNeeded,
    /// The target was already mounted before the task ran.
    AlreadyMounted,
}

/// Trait for tasks that can be executed in a pipeline.
///
/// Tasks borrow a shared context; they run one at a time.
pub trait PipelineTask<Ctx> {
    /// Execute the task against the shared pipeline context.
    fn run(&self, ctx: &Ctx) -> BootResult<TaskStatus>;

    /// Get human-readable task name for logging.
    fn name(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
