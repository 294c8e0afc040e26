//! Generic table-driven step execution framework.
//!
//! The boot sequence is an ordered list of fallible steps, each tagged with the
//! policy that decides what a failure means:
//!
//! ```text
//! ExecutionPlan → Steps → (Task, FailurePolicy)
//!
//! - ExecutionPlan: the ordered table
//! - Step: one task plus its failure policy (fatal / warn / tolerate busy)
//! - Task: atomic unit of work
//! ```
//!
//! Steps run strictly one after another; later steps may depend on the
//! filesystem state earlier steps established.
//!
//! ## Example
//!
//! ```ignore
//! use pipeline::{ExecutionPlan, FailurePolicy, PipelineExecutor, Step};
//!
//! let plan = ExecutionPlan::new(vec![
//!     Step::fatal(Box::new(MountTmp)),
//!     Step::warn(Box::new(MountRun)),
//! ]);
//!
//! let metrics = PipelineExecutor::execute(plan, &ctx)?;
//! println!("sequence took {}ms", metrics.total_duration_ms);
//! ```

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod step;
mod task;

pub use metrics::{PipelineMetrics, StepMetrics, StepOutcome};
pub use pipeline::{ExecutionPlan, PipelineExecutor};
pub use step::{FailurePolicy, Step};
pub use task::{BoxedTask, PipelineTask, TaskStatus};
