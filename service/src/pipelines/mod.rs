// service/src/pipelines/mod.rs

//! Registered storyflow pipelines.

use storyflow::Registry;

use crate::errors::AppError;

pub mod contexts;
pub mod submission_pipeline;
pub mod webhook_pipeline;

pub use contexts::{SubmissionCtxData, SubmissionMode, SubmissionOutcome, WebhookCtxData, WebhookOutcome};
pub use webhook_pipeline::ingest_webhook;

/// Registers every pipeline; called once while building `AppState`.
pub fn register_all_pipelines(flows: &Registry<AppError>) {
  submission_pipeline::register_submission_pipeline(flows);
  webhook_pipeline::register_webhook_pipeline(flows);
  tracing::info!("All application pipelines registered.");
}
