// storyflow/src/core/control.rs

//! Flow signals returned by handlers and the outcome of a whole run.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Keep going: remaining handlers of this step, then the next step.
  Continue,
  /// Halt the pipeline. Nothing after the current handler runs.
  Stop,
}

/// Outcome of a run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran (or was skipped) to the end.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
