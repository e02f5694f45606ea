// service/src/actions.rs

//! Admin and system actions on print orders, plus the read views.
//!
//! Each commanded action checks its source state, then writes one patch that
//! expects the status it checked, so a concurrent change surfaces as a 409
//! instead of silently overwriting it.

use serde_json::json;
use storyflow::{ContextData, PipelineResult};
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::lifecycle::{self, APPROVABLE_FROM, ASSETS_EDITABLE_IN, REJECTABLE_FROM, VALIDATABLE_FROM};
use crate::models::{
  ApprovalStatus, EventSource, FulfillmentStatus, NewPrintOrder, ParentOrderView, PaymentStatus, PrintOrder,
  PrintableAssets, ProcessLogEntry, VendorInteraction,
};
use crate::pipelines::{SubmissionCtxData, SubmissionMode, SubmissionOutcome};
use crate::services::best_effort;
use crate::services::Notification;
use crate::state::AppState;
use crate::store::OrderPatch;
use crate::validation;
use crate::vendor::events::status_for_vendor_status;

fn source_of(actor: Option<&str>) -> EventSource {
  if actor.is_some() {
    EventSource::Admin
  } else {
    EventSource::System
  }
}

async fn load(state: &AppState, order_id: &str) -> Result<PrintOrder> {
  state
    .store
    .get(order_id)
    .await?
    .ok_or_else(|| AppError::not_found(order_id))
}

fn require(field: &str, value: &str, missing: &mut Vec<String>) {
  if value.trim().is_empty() {
    missing.push(format!("{field} is required"));
  }
}

#[instrument(name = "action::create_order", skip_all, fields(book_id = %new.book_id))]
pub async fn create_order(state: &AppState, new: NewPrintOrder) -> Result<PrintOrder> {
  let mut missing = Vec::new();
  require("parentUid", &new.parent_uid, &mut missing);
  require("storyId", &new.story_id, &mut missing);
  require("bookId", &new.book_id, &mut missing);
  require("shipping.contactEmail", &new.shipping.contact_email, &mut missing);
  require("shipping.recipient.name", &new.shipping.recipient.name, &mut missing);
  require("shipping.recipient.countryCode", &new.shipping.recipient.country_code, &mut missing);
  if !missing.is_empty() {
    return Err(AppError::Validation { errors: missing });
  }

  let order = PrintOrder::create(new);
  state.store.insert(&order).await?;
  info!(order_id = %order.order_id, "Print order created.");
  Ok(order)
}

/// Runs the asset checks on an order still in `validating` or `validation_failed`.
#[instrument(name = "action::validate_order", skip(state))]
pub async fn validate_order(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<PrintOrder> {
  let order = load(state, order_id).await?;
  let current = order.fulfillment_status;
  lifecycle::ensure_source("validate", current, VALIDATABLE_FROM)?;

  let report = validation::validate(&order.printable, order.shipping.quantity);
  if !report.valid {
    return Err(AppError::Validation { errors: report.errors });
  }

  let target = if order.requires_approval {
    FulfillmentStatus::AwaitingApproval
  } else {
    FulfillmentStatus::ReadyToSubmit
  };
  lifecycle::ensure_transition(current, target)?;

  let source = source_of(actor);
  let mut patch = OrderPatch::new()
    .expecting(current)
    .transition(target, "Assets passed validation", source)
    .log(ProcessLogEntry::new("validation.passed", format!("Assets valid; now '{target}'"), source).by(actor));
  if order.requires_approval {
    patch.approval_status = Some(ApprovalStatus::AwaitingApproval);
  }
  Ok(state.store.apply(order_id, patch).await?)
}

#[instrument(name = "action::approve", skip(state))]
pub async fn approve(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<PrintOrder> {
  let order = load(state, order_id).await?;
  let current = order.fulfillment_status;
  lifecycle::ensure_source("approve", current, APPROVABLE_FROM)?;
  lifecycle::ensure_transition(current, FulfillmentStatus::ReadyToSubmit)?;

  let source = source_of(actor);
  let patch = OrderPatch {
    approval_status: Some(ApprovalStatus::Approved),
    ..OrderPatch::new()
  }
  .expecting(current)
  .transition(FulfillmentStatus::ReadyToSubmit, "Approved for printing", source)
  .log(ProcessLogEntry::new("approval.granted", "Order approved for printing", source).by(actor));
  Ok(state.store.apply(order_id, patch).await?)
}

async fn run_submission(
  state: &AppState,
  order_id: &str,
  actor: Option<&str>,
  mode: SubmissionMode,
) -> Result<SubmissionOutcome> {
  let ctx = ContextData::new(SubmissionCtxData::new(state.clone(), order_id, actor, mode));
  match state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let outcome = ctx.read().outcome.clone();
      outcome.ok_or_else(|| AppError::Internal("submission finished without an outcome".to_string()))
    }
    PipelineResult::Stopped => Err(AppError::Internal("submission pipeline was halted".to_string())),
  }
}

/// First submission, from `ready_to_submit` or `awaiting_approval`.
#[instrument(name = "action::submit", skip(state))]
pub async fn submit(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<SubmissionOutcome> {
  run_submission(state, order_id, actor, SubmissionMode::Initial).await
}

/// Retry from `on_hold`, cancelling the superseded vendor order first when there is one.
#[instrument(name = "action::resubmit", skip(state))]
pub async fn resubmit(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<SubmissionOutcome> {
  run_submission(state, order_id, actor, SubmissionMode::Resubmission).await
}

#[instrument(name = "action::reject", skip(state, reason))]
pub async fn reject(state: &AppState, order_id: &str, actor: Option<&str>, reason: &str) -> Result<PrintOrder> {
  let reason = reason.trim();
  if reason.is_empty() {
    return Err(AppError::BadRequest("a rejection reason is required".to_string()));
  }
  let order = load(state, order_id).await?;
  let current = order.fulfillment_status;
  lifecycle::ensure_source("reject", current, REJECTABLE_FROM)?;
  lifecycle::ensure_transition(current, FulfillmentStatus::Cancelled)?;

  let patch = OrderPatch {
    approval_status: Some(ApprovalStatus::Rejected),
    rejection_reason: Some(reason.to_string()),
    rejected_by: actor.map(str::to_string),
    fulfillment_notes: Some(reason.to_string()),
    ..OrderPatch::new()
  }
  .expecting(current)
  .transition(FulfillmentStatus::Cancelled, format!("Rejected: {reason}"), EventSource::Admin)
  .log(ProcessLogEntry::new("order.rejected", format!("Rejected: {reason}"), EventSource::Admin).by(actor));
  let rejected = state.store.apply(order_id, patch).await?;
  info!(%order_id, "Order rejected.");

  let notification = Notification::rejected(&rejected, reason);
  let outcome = best_effort::attempt(
    "notification",
    "Notifying parent of rejection",
    EventSource::Admin,
    state.notifier.send(&notification),
  )
  .await;
  match state.store.apply(order_id, OrderPatch::new().log(outcome.entry)).await {
    Ok(order) => Ok(order),
    Err(e) => {
      tracing::warn!(%order_id, error = %e, "Could not record rejection notification outcome.");
      Ok(rejected)
    }
  }
}

/// Legal in any state; touches neither the vendor nor the fulfillment status.
#[instrument(name = "action::mark_paid", skip(state))]
pub async fn mark_paid(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<PrintOrder> {
  let source = source_of(actor);
  let patch = OrderPatch {
    payment_status: Some(PaymentStatus::Paid),
    ..OrderPatch::new()
  }
  .log(ProcessLogEntry::new("payment.marked_paid", "Marked as paid", source).by(actor));
  Ok(state.store.apply(order_id, patch).await?)
}

/// Replaces the print files, e.g. after the vendor rejected them.
#[instrument(name = "action::update_printable_assets", skip(state, assets))]
pub async fn update_printable_assets(
  state: &AppState,
  order_id: &str,
  assets: PrintableAssets,
  actor: Option<&str>,
) -> Result<PrintOrder> {
  let order = load(state, order_id).await?;
  let current = order.fulfillment_status;
  lifecycle::ensure_source("update the files of", current, ASSETS_EDITABLE_IN)?;

  let source = source_of(actor);
  let data = json!({
    "interiorPageCount": assets.interior_page_count,
    "binding": assets.binding,
    "trimSize": assets.trim_size,
  });
  let patch = OrderPatch {
    printable: Some(assets),
    ..OrderPatch::new()
  }
  .expecting(current)
  .log(
    ProcessLogEntry::new("printable.updated", "Print files replaced", source)
      .by(actor)
      .with_data(data),
  );
  Ok(state.store.apply(order_id, patch).await?)
}

/// Asks the vendor for its view of the order and stores the raw status. Never transitions.
#[instrument(name = "action::refresh_vendor_status", skip(state))]
pub async fn refresh_vendor_status(state: &AppState, order_id: &str, actor: Option<&str>) -> Result<PrintOrder> {
  let order = load(state, order_id).await?;
  let vendor_order_id = order
    .mixam_order_id
    .clone()
    .ok_or_else(|| AppError::BadRequest(format!("order '{order_id}' has not been submitted to the vendor")))?;

  let status = state.vendor.order_status(order_id, &vendor_order_id).await?;
  let mapped = status_for_vendor_status(&status.status);
  let source = source_of(actor);
  let patch = OrderPatch {
    mixam_status: Some(status.status.clone()),
    ..OrderPatch::new()
  }
  .log(
    ProcessLogEntry::new(
      "vendor.status_refreshed",
      format!("Vendor reports '{}'", status.status),
      source,
    )
    .by(actor)
    .with_data(json!({ "mixamOrderId": vendor_order_id, "vendorStatus": status.status, "mapsTo": mapped })),
  );
  Ok(state.store.apply(order_id, patch).await?)
}

pub async fn get_order(state: &AppState, order_id: &str) -> Result<PrintOrder> {
  load(state, order_id).await
}

pub async fn parent_view(state: &AppState, order_id: &str) -> Result<ParentOrderView> {
  Ok(load(state, order_id).await?.parent_view())
}

pub async fn interaction_log(state: &AppState, order_id: &str) -> Result<Vec<VendorInteraction>> {
  load(state, order_id).await?;
  Ok(state.store.interactions(order_id).await?)
}
