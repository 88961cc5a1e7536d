// bazaar/src/workflow/pipeline.rs

//! `Pipeline<TData, Err>`: an ordered list of named steps, the handlers
//! registered against them, and the `run` loop that drives them.

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineResult};
use super::step::{SkipCondition, StepDef};
use super::WorkflowError;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{event, instrument, span, Instrument, Level};

/// A step handler. Takes a clone of the run's `ContextData` and resolves to a
/// flow signal or the pipeline's error type.
///
/// Handlers must drop every lock guard before their first `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  steps: Vec<StepDef<TData>>,
  on: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples, in run order.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      on: HashMap::new(),
    }
  }

  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      // A typo in a step name is a setup bug, not a runtime condition.
      panic!("Pipeline setup error: step '{}' is not defined.", step_name);
    }
  }

  /// Registers a handler for `step_name`. Handlers of one step run in
  /// registration order.
  ///
  /// # Panics
  /// If `step_name` was not declared in [`Pipeline::new`].
  pub fn on_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn step_names(&self) -> Vec<String> {
    self.steps.iter().map(|s| s.name.clone()).collect()
  }

  /// Runs every step in declaration order against `ctx_data`.
  ///
  /// A handler error ends the run and is returned unchanged; it is recorded on
  /// the run span at debug level only, so the caller picks the log level for
  /// its own outcomes. A non-optional step with no handlers fails with
  /// [`WorkflowError::HandlerMissing`].
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>(), num_steps = self.steps.len()),
    err(level = "debug", Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx
      );

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          step_span.in_scope(|| event!(Level::DEBUG, "Step skipped by condition."));
          continue;
        }
      }

      let handlers = match self.on.get(&step_def.name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          continue;
        }
        _ => {
          step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
          return Err(Err::from(WorkflowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for handler in handlers {
        match handler(ctx_data.clone()).instrument(step_span.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            step_span.in_scope(|| event!(Level::DEBUG, "Pipeline stopped by handler."));
            return Ok(PipelineResult::Stopped);
          }
          Err(e) => {
            step_span.in_scope(|| event!(Level::DEBUG, error = %e, "Step handler failed."));
            return Err(e);
          }
        }
      }
    }

    Ok(PipelineResult::Completed)
  }
}
