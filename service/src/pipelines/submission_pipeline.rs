// service/src/pipelines/submission_pipeline.rs

//! First submission and resubmission of an order to the print vendor.
//!
//! A vendor failure is not a pipeline error: `submit_to_vendor` stores it in the
//! context and `record_outcome` parks the order in `on_hold` before returning
//! `AppError::Submission`, so the order is always left retryable.

use std::sync::Arc;

use serde_json::json;
use storyflow::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::lifecycle::{self, TransitionError, RESUBMITTABLE_FROM, SUBMITTABLE_FROM};
use crate::models::{ApprovalStatus, EventSource, FulfillmentStatus, ProcessLogEntry};
use crate::pipelines::contexts::{SubmissionCtxData, SubmissionMode, SubmissionOutcome};
use crate::services::best_effort;
use crate::services::billing::resolve_billing_address;
use crate::store::{OrderPatch, StoreError};
use crate::validation;
use crate::vendor::JobDocument;

type Ctx = ContextData<SubmissionCtxData>;

fn source_of(actor: &Option<String>) -> EventSource {
  if actor.is_some() {
    EventSource::Admin
  } else {
    EventSource::System
  }
}

/// Runs only for a resubmission of an order whose vendor order was not already
/// cancelled by an earlier attempt.
fn skip_unless_superseding() -> SkipCondition<SubmissionCtxData> {
  Arc::new(|ctx: Ctx| {
    let guard = ctx.read();
    let live_vendor_order = guard
      .order
      .as_ref()
      .is_some_and(|o| o.mixam_order_id.is_some() && o.mixam_order_id != o.previous_mixam_order_id);
    !(guard.mode == SubmissionMode::Resubmission && live_vendor_order)
  })
}

pub fn register_submission_pipeline(flows: &Registry<AppError>) {
  let mut p = Pipeline::<SubmissionCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("validate_assets", false, None),
    ("resolve_billing_address", false, None),
    ("cancel_previous_vendor_order", true, Some(skip_unless_superseding())),
    ("build_job_document", false, None),
    ("submit_to_vendor", false, None),
    ("record_outcome", false, None),
  ]);

  p.on_root("load_order", load_order);
  p.on_root("validate_assets", validate_assets);
  p.on_root("resolve_billing_address", resolve_billing);
  p.on_root("cancel_previous_vendor_order", cancel_previous_vendor_order);
  p.on_root("build_job_document", build_job_document);
  p.before_root("submit_to_vendor", |ctx: Ctx| {
    Box::pin(async move {
      let mut guard = ctx.write();
      let reference = guard.order_id.clone();
      let actor = guard.actor.clone();
      let source = source_of(&actor);
      let mode = guard.mode;
      guard.pending_log.push(
        ProcessLogEntry::new(
          "submission.attempted",
          format!("Sending job to vendor ({})", mode.action()),
          source,
        )
        .by(actor.as_deref())
        .with_data(json!({ "reference": reference })),
      );
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });
  p.on_root("submit_to_vendor", submit_to_vendor);
  p.on_root("record_outcome", record_outcome);

  flows.register_pipeline(p);
  info!("Submission pipeline registered.");
}

#[instrument(name = "submission::load_order", skip_all)]
async fn load_order(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, order_id, mode) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.order_id.clone(), guard.mode)
  };

  let order = store.get(&order_id).await?.ok_or_else(|| AppError::not_found(&order_id))?;
  let allowed = match mode {
    SubmissionMode::Initial => SUBMITTABLE_FROM,
    SubmissionMode::Resubmission => RESUBMITTABLE_FROM,
  };
  lifecycle::ensure_source(mode.action(), order.fulfillment_status, allowed)?;

  info!(%order_id, status = %order.fulfillment_status, ?mode, "Order loaded for submission.");
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn validate_assets(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let guard = ctx.read();
  let order = guard
    .order
    .as_ref()
    .ok_or_else(|| AppError::Internal("order not loaded".to_string()))?;
  let report = validation::validate(&order.printable, order.shipping.quantity);
  if !report.valid {
    warn!(order_id = %order.order_id, errors = ?report.errors, "Assets failed validation; vendor not called.");
    return Err(AppError::Validation { errors: report.errors });
  }
  Ok(PipelineControl::Continue)
}

async fn resolve_billing(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let mut guard = ctx.write();
  let address = resolve_billing_address(&guard.app_state.config.billing);
  if address.is_none() {
    let source = source_of(&guard.actor);
    guard.pending_log.push(ProcessLogEntry::new(
      "billing.unresolved",
      "No billing address configured; submitted without one",
      source,
    ));
  }
  guard.billing_address = address;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "submission::cancel_previous", skip_all)]
async fn cancel_previous_vendor_order(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, vendor, order_id, previous, previous_job, actor) = {
    let guard = ctx.read();
    let order = guard.order.as_ref();
    (
      guard.app_state.store.clone(),
      guard.app_state.vendor.clone(),
      guard.order_id.clone(),
      order.and_then(|o| o.mixam_order_id.clone()),
      order.and_then(|o| o.mixam_job_number.clone()),
      guard.actor.clone(),
    )
  };
  let Some(previous) = previous else {
    return Ok(PipelineControl::Continue);
  };

  let outcome = best_effort::attempt(
    "vendor.cancel_previous",
    &format!("Cancelling superseded vendor order {previous}"),
    source_of(&actor),
    vendor.cancel_order(&order_id, &previous),
  )
  .await;
  let cancelled = outcome.succeeded();
  let mut patch = OrderPatch::new().log(
    outcome
      .entry
      .by(actor.as_deref())
      .with_data(json!({ "mixamOrderId": previous, "jobNumber": previous_job })),
  );
  // Written before the new job is sent: webhooks for the cancelled job must
  // already be recognised as superseded while the submission is in flight.
  if cancelled {
    patch.previous_mixam_order_id = Some(previous);
    patch.previous_mixam_job_number = previous_job;
  }
  store.apply(&order_id, patch).await?;
  Ok(PipelineControl::Continue)
}

async fn build_job_document(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let mut guard = ctx.write();
  let job = {
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("order not loaded".to_string()))?;
    JobDocument::for_order(order, guard.billing_address.clone())?
  };
  guard.job = Some(job);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "submission::submit_to_vendor", skip_all)]
async fn submit_to_vendor(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (vendor, order_id, job) = {
    let guard = ctx.read();
    let job = guard
      .job
      .clone()
      .ok_or_else(|| AppError::Internal("job document not built".to_string()))?;
    (guard.app_state.vendor.clone(), guard.order_id.clone(), job)
  };

  match vendor.submit_order(&order_id, &job).await {
    Ok(receipt) => {
      info!(%order_id, vendor_order_id = %receipt.order_id, "Vendor accepted the job.");
      ctx.write().receipt = Some(receipt);
    }
    Err(e) => {
      warn!(%order_id, error = %e, "Vendor submission failed.");
      ctx.write().failure = Some(e);
    }
  }
  Ok(PipelineControl::Continue)
}

fn with_log(patch: OrderPatch, entries: &[ProcessLogEntry]) -> OrderPatch {
  entries.iter().cloned().fold(patch, OrderPatch::log)
}

/// Writes the vendor's answer. The status write is a compare-and-set against the
/// status loaded at the start; when a concurrent writer moved the order first,
/// the vendor ids and every gathered audit entry are still recorded, the status
/// is left alone and the caller gets a conflict.
#[instrument(name = "submission::record_outcome", skip_all)]
async fn record_outcome(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, vendor, order, actor, mode, receipt, failure, pending_log) = {
    let mut guard = ctx.write();
    let order = guard
      .order
      .clone()
      .ok_or_else(|| AppError::Internal("order not loaded".to_string()))?;
    (
      guard.app_state.store.clone(),
      guard.app_state.vendor.clone(),
      order,
      guard.actor.clone(),
      guard.mode,
      guard.receipt.clone(),
      guard.failure.clone(),
      std::mem::take(&mut guard.pending_log),
    )
  };
  let source = source_of(&actor);
  let order_id = order.order_id.clone();
  let expected = order.fulfillment_status;
  let superseded = match mode {
    SubmissionMode::Resubmission => order.mixam_order_id.clone(),
    SubmissionMode::Initial => None,
  };

  if let Some(receipt) = receipt {
    let vendor_ids = OrderPatch {
      mixam_order_id: Some(receipt.order_id.clone()),
      mixam_job_number: Some(receipt.job_number.clone()),
      mixam_status: Some(receipt.status.clone()),
      previous_mixam_order_id: superseded.clone(),
      previous_mixam_job_number: superseded.as_ref().and(order.mixam_job_number.clone()),
      ..OrderPatch::new()
    };
    let mut patch = with_log(vendor_ids.clone().expecting(expected), &pending_log);
    if order.approval_status == ApprovalStatus::AwaitingApproval {
      patch.approval_status = Some(ApprovalStatus::Approved);
    }
    let note = format!("Submitted to vendor as {} (job {})", receipt.order_id, receipt.job_number);
    let patch = patch
      .transition(FulfillmentStatus::Submitted, note.clone(), source)
      .log(
        ProcessLogEntry::new("submission.succeeded", note, source)
          .by(actor.as_deref())
          .with_data(json!({
            "mixamOrderId": receipt.order_id,
            "jobNumber": receipt.job_number,
            "vendorStatus": receipt.status,
            "mode": mode.action(),
          })),
      );

    match store.apply(&order_id, patch).await {
      Ok(stored) => {
        ctx.write().outcome = Some(SubmissionOutcome {
          order_id,
          mixam_order_id: receipt.order_id,
          mixam_job_number: receipt.job_number,
          status: stored.fulfillment_status,
          previous_mixam_order_id: superseded,
        });
        return Ok(PipelineControl::Continue);
      }
      Err(StoreError::StatusChanged { actual, .. }) => {
        warn!(%order_id, %actual, "Order changed during submission; recording vendor ids only.");
        let mut late = with_log(vendor_ids, &pending_log).log(
          ProcessLogEntry::new(
            "submission.recorded_late",
            format!("Vendor accepted job {} after the order moved to '{actual}'", receipt.order_id),
            source,
          )
          .by(actor.as_deref())
          .with_data(json!({
            "mixamOrderId": receipt.order_id,
            "jobNumber": receipt.job_number,
            "status": actual,
            "mode": mode.action(),
          })),
        );
        if actual.is_terminal() {
          let orphan = best_effort::attempt(
            "vendor.cancel_orphan",
            &format!("Cancelling vendor order {} placed for a '{actual}' order", receipt.order_id),
            source,
            vendor.cancel_order(&order_id, &receipt.order_id),
          )
          .await;
          late = late.log(
            orphan
              .entry
              .by(actor.as_deref())
              .with_data(json!({ "mixamOrderId": receipt.order_id })),
          );
        }
        store.apply(&order_id, late).await?;
        return Err(TransitionError::Stale { expected, actual }.into());
      }
      Err(e) => return Err(e.into()),
    }
  }

  let message = failure
    .as_ref()
    .map(ToString::to_string)
    .unwrap_or_else(|| "vendor returned no receipt".to_string());
  let transient = failure.as_ref().is_some_and(|f| f.is_transient());
  let noted = OrderPatch {
    fulfillment_notes: Some(message.clone()),
    ..OrderPatch::new()
  };
  let failed = ProcessLogEntry::new("submission.failed", format!("Vendor submission failed: {message}"), source)
    .by(actor.as_deref());
  let patch = with_log(noted.clone().expecting(expected), &pending_log)
    .transition(FulfillmentStatus::OnHold, format!("Vendor submission failed: {message}"), source)
    .log(
      failed
        .clone()
        .with_data(json!({ "transient": transient, "mode": mode.action() })),
    );

  match store.apply(&order_id, patch).await {
    Ok(_) => Err(AppError::Submission { order_id, message }),
    Err(StoreError::StatusChanged { actual, .. }) => {
      warn!(%order_id, %actual, "Order changed during a failed submission; not parking it in on_hold.");
      let fallback = with_log(noted, &pending_log).log(failed.with_data(json!({
        "transient": transient,
        "mode": mode.action(),
        "status": actual,
      })));
      store.apply(&order_id, fallback).await?;
      Err(TransitionError::Stale { expected, actual }.into())
    }
    Err(e) => {
      error!(%order_id, error = %e, "Could not park failed submission in on_hold.");
      Err(e.into())
    }
  }
}
