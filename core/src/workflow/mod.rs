// bazaar/src/workflow/mod.rs

//! A small ordered-step pipeline. The purchase sequence is declared as named
//! steps over a shared [`ContextData`] and driven by [`Pipeline::run`].

pub mod context_data;
pub mod control;
pub mod pipeline;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use pipeline::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};

use thiserror::Error;

/// Failures raised by the pipeline machinery itself, as opposed to its handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}
