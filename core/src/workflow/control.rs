// bazaar/src/workflow/control.rs

//! Signals for controlling pipeline flow and the outcome of a run.

/// Returned by a handler to keep going or halt the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt immediately. No later handler or step runs.
  Stop,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step either ran or was skipped.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
