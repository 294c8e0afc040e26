//! Generic pipeline execution framework.
//!
//! Runs the steps of an execution plan in order and applies each step's
//! failure policy.

use super::metrics::{PipelineMetrics, StepMetrics, StepOutcome};
use super::step::{FailurePolicy, Step};
use super::task::{BoxedTask, TaskStatus};
use bootmount_shared::errors::BootResult;
use std::time::Instant;

pub struct ExecutionPlan<Ctx> {
    steps: Vec<Step<BoxedTask<Ctx>>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(steps: Vec<Step<BoxedTask<Ctx>>>) -> Self {
        Self { steps }
    }

    pub fn steps(self) -> Vec<Step<BoxedTask<Ctx>>> {
        self.steps
    }

    /// Task names and policies in execution order.
    pub fn describe(&self) -> Vec<(&str, FailurePolicy)> {
        self.steps
            .iter()
            .map(|step| (step.task.name(), step.policy))
            .collect()
    }
}

/// Pipeline executor framework.
///
/// This provides the generic infrastructure for executing a table-driven plan.
/// The actual work is provided by task implementations.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Execute a plan.
    ///
    /// Returns the first error raised by a step whose policy makes it fatal.
    /// Every other failure is logged and recorded in the metrics.
    pub fn execute<Ctx>(plan: ExecutionPlan<Ctx>, ctx: &Ctx) -> BootResult<PipelineMetrics> {
        let total_start = Instant::now();
        let mut step_metrics = Vec::new();

        for (index, step) in plan.steps().into_iter().enumerate() {
            let Step { task, policy } = step;
            let name = task.name().to_string();
            let step_start = Instant::now();

            let outcome = match (task.run(ctx), policy) {
                (Ok(TaskStatus::Done), _) => StepOutcome::Completed,
                (Ok(TaskStatus::NotNeeded), _) => StepOutcome::Skipped,
                (Ok(TaskStatus::AlreadyMounted), _) => StepOutcome::AlreadyMounted,
                (Err(e), FailurePolicy::TolerateBusy) if e.is_busy() => {
                    tracing::debug!(step = %name, "Already mounted, continuing");
                    StepOutcome::AlreadyMounted
                }
                (Err(e), FailurePolicy::Warn) => {
                    tracing::warn!(step = %name, error = %e, "Non-fatal boot step failed");
                    StepOutcome::Warned(e.to_string())
                }
                (Err(e), FailurePolicy::Fatal | FailurePolicy::TolerateBusy) => {
                    tracing::error!(step = %name, error = %e, "Boot step failed");
                    return Err(e);
                }
            };

            step_metrics.push(StepMetrics {
                index,
                name,
                policy,
                outcome,
                duration_ms: step_start.elapsed().as_millis(),
            });
        }

        Ok(PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            steps: step_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineTask;
    use bootmount_shared::errors::BootError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Trace {
        ran: RefCell<Vec<&'static str>>,
    }

    enum Behaviour {
        Ok,
        Busy,
        Fail,
    }

    struct FakeTask(&'static str, Behaviour);

    impl PipelineTask<Trace> for FakeTask {
        fn run(&self, ctx: &Trace) -> BootResult<TaskStatus> {
            ctx.ran.borrow_mut().push(self.0);
            match self.1 {
                Behaviour::Ok => Ok(TaskStatus::Done),
                Behaviour::Busy => Err(BootError::Busy(self.0.to_string())),
                Behaviour::Fail => Err(BootError::Mount(self.0.to_string())),
            }
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    fn task(name: &'static str, behaviour: Behaviour) -> BoxedTask<Trace> {
        Box::new(FakeTask(name, behaviour))
    }

    #[test]
    fn test_warn_continues() {
        let trace = Trace::default();
        let plan = ExecutionPlan::new(vec![
            Step::warn(task("a", Behaviour::Fail)),
            Step::fatal(task("b", Behaviour::Ok)),
        ]);

        let metrics = PipelineExecutor::execute(plan, &trace).unwrap();
        assert_eq!(*trace.ran.borrow(), vec!["a", "b"]);
        assert!(matches!(metrics.outcome("a"), Some(StepOutcome::Warned(_))));
        assert_eq!(metrics.warnings().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_fatal_stops_sequence() {
        let trace = Trace::default();
        let plan = ExecutionPlan::new(vec![
            Step::fatal(task("a", Behaviour::Fail)),
            Step::fatal(task("b", Behaviour::Ok)),
        ]);

        assert!(PipelineExecutor::execute(plan, &trace).is_err());
        assert_eq!(*trace.ran.borrow(), vec!["a"]);
    }

    #[test]
    fn test_tolerate_busy_only_tolerates_busy() {
        let trace = Trace::default();
        let plan = ExecutionPlan::new(vec![Step::tolerate_busy(task("dev", Behaviour::Busy))]);
        let metrics = PipelineExecutor::execute(plan, &trace).unwrap();
        assert_eq!(metrics.outcome("dev"), Some(&StepOutcome::AlreadyMounted));

        let plan = ExecutionPlan::new(vec![Step::tolerate_busy(task("dev", Behaviour::Fail))]);
        assert!(PipelineExecutor::execute(plan, &trace).is_err());
    }

    #[test]
    fn test_busy_is_fatal_under_fatal_policy() {
        let trace = Trace::default();
        let plan = ExecutionPlan::new(vec![Step::fatal(task("pts", Behaviour::Busy))]);
        assert!(PipelineExecutor::execute(plan, &trace).unwrap_err().is_busy());
    }
}
