// ABOUTME: Deployment orchestration: workflows, steps and the pipeline that runs them.
// ABOUTME: Also exports the operation waiter and the route table mapping helper.

mod deployment;
mod error;
mod pipeline;
pub mod routing;
mod state;
mod step;
mod waiter;
mod workflow;

pub use deployment::DeploymentRequest;
pub use error::{PipelineError, StepError};
pub use pipeline::{Pipeline, RunReport};
pub use routing::{Mapping, RouteError, create_mapping};
pub use state::RunState;
pub use step::Step;
pub use waiter::{Completion, OperationWaiter, WaitError};
pub use workflow::{Action, Target, Workflow};
