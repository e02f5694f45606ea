// service/src/pipelines/contexts.rs

//! Data carried through each registered pipeline. Handlers receive these
//! wrapped in `storyflow::ContextData`.

use actix_web::web::Bytes;
use serde::Serialize;

use crate::models::{FulfillmentStatus, PostalAddress, PrintOrder, ProcessLogEntry};
use crate::state::AppState;
use crate::vendor::{JobDocument, SubmissionReceipt, VendorCallError, VendorEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
  Initial,
  /// From `on_hold`; supersedes any vendor order the order already has.
  Resubmission,
}

impl SubmissionMode {
  pub const fn action(self) -> &'static str {
    match self {
      SubmissionMode::Initial => "submit",
      SubmissionMode::Resubmission => "resubmit",
    }
  }
}

/// What a successful (re)submission hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
  pub order_id: String,
  pub mixam_order_id: String,
  pub mixam_job_number: String,
  pub status: FulfillmentStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous_mixam_order_id: Option<String>,
}

#[derive(Clone)]
pub struct SubmissionCtxData {
  pub app_state: AppState,
  pub order_id: String,
  pub actor: Option<String>,
  pub mode: SubmissionMode,

  // Filled in by the pipeline.
  pub order: Option<PrintOrder>,
  pub billing_address: Option<PostalAddress>,
  pub job: Option<JobDocument>,
  pub receipt: Option<SubmissionReceipt>,
  pub failure: Option<VendorCallError>,
  /// Audit entries gathered along the way, written with the outcome whether or
  /// not the status write wins.
  pub pending_log: Vec<ProcessLogEntry>,
  pub outcome: Option<SubmissionOutcome>,
}

impl SubmissionCtxData {
  pub fn new(app_state: AppState, order_id: &str, actor: Option<&str>, mode: SubmissionMode) -> Self {
    Self {
      app_state,
      order_id: order_id.to_string(),
      actor: actor.map(str::to_string),
      mode,
      order: None,
      billing_address: None,
      job: None,
      receipt: None,
      failure: None,
      pending_log: Vec::new(),
      outcome: None,
    }
  }
}

/// How a verified webhook delivery ended. Every variant is acknowledged to the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
  Applied { status: FulfillmentStatus },
  Ignored { reason: String },
  UnknownOrder { order_id: String },
  Malformed { reason: String },
  Failed { reason: String },
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  /// Exactly as received; the signature covers these bytes.
  pub raw_body: Bytes,
  pub signature: Option<String>,

  pub event: Option<VendorEvent>,
  pub order: Option<PrintOrder>,
  pub target: Option<FulfillmentStatus>,
  /// The order as stored after the update, for notifications.
  pub updated: Option<PrintOrder>,
  pub outcome: Option<WebhookOutcome>,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      signature,
      event: None,
      order: None,
      target: None,
      updated: None,
      outcome: None,
    }
  }
}
