// flow/src/core/control.rs

//! Flow-control signals returned by handlers and by a whole pipeline run.

/// Returned by a handler to continue with the next handler/step or to halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt immediately. Remaining handlers of this step and all later steps are not run.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  Stopped,
}
