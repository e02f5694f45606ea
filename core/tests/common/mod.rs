// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use storyflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// A print job moving through the test pipelines.
#[derive(Clone, Debug, Default)]
pub struct JobContext {
  pub pages_checked: i32,
  pub trail: String,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
  pub resubmission: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records the step, bumps the counter and honours `stop_at`.
pub fn recording_handler(step_name: &'static str, mark: &'static str) -> storyflow::Handler<JobContext, TestError> {
  Box::new(move |ctx: ContextData<JobContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.pages_checked += 1;
      guard.trail.push_str(mark);
      guard.steps_executed.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> storyflow::Handler<JobContext, TestError> {
  Box::new(move |ctx: ContextData<JobContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
