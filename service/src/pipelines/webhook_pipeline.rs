// service/src/pipelines/webhook_pipeline.rs

//! Vendor webhook ingestion: verify, parse, look up, match the vendor job, map,
//! apply, notify.
//!
//! Only signature verification may fail the request. Everything after it ends
//! in a [`WebhookOutcome`] that is acknowledged to the vendor, so a bad event
//! never turns into a retry storm.

use std::sync::Arc;

use actix_web::web::Bytes;
use serde_json::json;
use storyflow::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::lifecycle::{webhook_decision, WebhookDecision};
use crate::models::{EventSource, ProcessLogEntry};
use crate::pipelines::contexts::{WebhookCtxData, WebhookOutcome};
use crate::services::best_effort;
use crate::services::signature;
use crate::services::Notification;
use crate::state::AppState;
use crate::store::{OrderPatch, StoreError};
use crate::vendor::events::{map_event, VendorEvent};

type Ctx = ContextData<WebhookCtxData>;

/// Concurrent writers can move the order between our read and our write.
const APPLY_ATTEMPTS: usize = 3;

fn skip_unless_notifiable() -> SkipCondition<WebhookCtxData> {
  Arc::new(|ctx: Ctx| {
    let guard = ctx.read();
    !matches!(&guard.outcome, Some(WebhookOutcome::Applied { status }) if status.should_notify())
  })
}

pub fn register_webhook_pipeline(flows: &Registry<AppError>) {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("parse_envelope", false, None),
    ("load_order", false, None),
    ("match_vendor_job", false, None),
    ("map_event", false, None),
    ("apply_status", false, None),
    ("notify", true, Some(skip_unless_notifiable())),
  ]);

  p.on_root("verify_signature", verify_signature);
  p.on_root("parse_envelope", parse_envelope);
  p.on_root("load_order", load_order);
  p.on_root("match_vendor_job", match_vendor_job);
  p.on_root("map_event", map_event_step);
  p.on_root("apply_status", apply_status);
  p.on_root("notify", notify);

  flows.register_pipeline(p);
  info!("Webhook pipeline registered.");
}

/// Runs a webhook delivery through the pipeline. Returns `Err` only for
/// `Auth` (bad or missing signature) and `Config` (no secret configured).
#[instrument(name = "webhook::ingest", skip_all, fields(body_len = body.len()))]
pub async fn ingest_webhook(
  state: &AppState,
  body: Bytes,
  signature: Option<String>,
) -> Result<WebhookOutcome, AppError> {
  let ctx = ContextData::new(WebhookCtxData::new(state.clone(), body, signature));
  match state.flows.run(ctx.clone()).await {
    Ok(_) => {
      let outcome = ctx.read().outcome.clone();
      Ok(outcome.unwrap_or_else(|| WebhookOutcome::Failed {
        reason: "pipeline finished without an outcome".to_string(),
      }))
    }
    Err(e @ (AppError::Auth(_) | AppError::Config(_))) => Err(e),
    Err(e) => {
      error!(error = %e, "Webhook processing failed after verification; acknowledging anyway.");
      Ok(WebhookOutcome::Failed { reason: e.to_string() })
    }
  }
}

fn finish(ctx: &Ctx, outcome: WebhookOutcome) -> Result<PipelineControl, AppError> {
  ctx.write().outcome = Some(outcome);
  Ok(PipelineControl::Stop)
}

async fn verify_signature(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let guard = ctx.read();
  let secret = guard
    .app_state
    .config
    .webhook_secret
    .as_deref()
    .ok_or_else(|| AppError::Config("VENDOR_WEBHOOK_SECRET is not configured".to_string()))?;
  let header = guard
    .signature
    .as_deref()
    .ok_or_else(|| AppError::Auth("missing webhook signature".to_string()))?;
  if !signature::verify(secret.as_bytes(), &guard.raw_body, header) {
    warn!("Webhook signature mismatch.");
    return Err(AppError::Auth("webhook signature mismatch".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn parse_envelope(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let parsed = serde_json::from_slice::<VendorEvent>(&ctx.read().raw_body);
  match parsed {
    Ok(event) => {
      info!(event = %event.event, order_id = %event.order_id, "Webhook event received.");
      ctx.write().event = Some(event);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(error = %e, "Malformed webhook envelope.");
      finish(&ctx, WebhookOutcome::Malformed { reason: e.to_string() })
    }
  }
}

async fn load_order(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, order_id) = {
    let guard = ctx.read();
    let order_id = guard.event.as_ref().map(|e| e.order_id.clone()).unwrap_or_default();
    (guard.app_state.store.clone(), order_id)
  };
  match store.get(&order_id).await? {
    Some(order) => {
      ctx.write().order = Some(order);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(%order_id, "Webhook for unknown order; acknowledged, not processed.");
      finish(&ctx, WebhookOutcome::UnknownOrder { order_id })
    }
  }
}

/// Events for a vendor job the order no longer tracks (a superseded or
/// cancelled-for-resubmission job) are logged and left unapplied.
async fn match_vendor_job(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, event, order) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.event.clone(), guard.order.clone())
  };
  let (Some(event), Some(order)) = (event, order) else {
    return Err(AppError::Internal("webhook context incomplete".to_string()));
  };
  let Some(job) = event.job_number.as_deref() else {
    return Ok(PipelineControl::Continue);
  };

  let superseded = order.previous_mixam_job_number.as_deref() == Some(job)
    || order.mixam_job_number.as_deref().is_some_and(|current| current != job);
  if !superseded {
    return Ok(PipelineControl::Continue);
  }

  let reason = format!("event '{}' is for superseded vendor job {job}", event.event);
  warn!(order_id = %order.order_id, %reason, current_job = ?order.mixam_job_number, "Webhook for a superseded job.");
  let patch = OrderPatch::new().log(
    ProcessLogEntry::new("webhook.superseded", format!("Ignored {reason}"), EventSource::Webhook).with_data(json!({
      "event": event.event,
      "jobNumber": job,
      "currentJobNumber": order.mixam_job_number,
      "vendorStatus": event.raw_status(),
    })),
  );
  store.apply(&order.order_id, patch).await?;
  finish(&ctx, WebhookOutcome::Ignored { reason })
}

async fn map_event_step(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, event) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.event.clone())
  };
  let Some(event) = event else {
    return Err(AppError::Internal("event not parsed".to_string()));
  };

  if let Some(target) = map_event(&event) {
    ctx.write().target = Some(target);
    return Ok(PipelineControl::Continue);
  }

  let reason = format!("unmapped vendor event '{}'", event.event);
  warn!(order_id = %event.order_id, event = %event.event, "Unmapped vendor event.");
  let patch = OrderPatch::new().log(
    ProcessLogEntry::new("webhook.unmapped", format!("Ignored {reason}"), EventSource::Webhook)
      .with_data(json!({ "event": event.event, "vendorStatus": event.data.status })),
  );
  store.apply(&event.order_id, patch).await?;
  finish(&ctx, WebhookOutcome::Ignored { reason })
}

#[instrument(name = "webhook::apply_status", skip_all)]
async fn apply_status(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, event, order, target) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.event.clone(), guard.order.clone(), guard.target)
  };
  let (Some(event), Some(order), Some(target)) = (event, order, target) else {
    return Err(AppError::Internal("webhook context incomplete".to_string()));
  };

  let order_id = order.order_id.clone();
  let raw_status = event.raw_status();
  let mut current = order.fulfillment_status;

  for _ in 0..APPLY_ATTEMPTS {
    let patch = match webhook_decision(current, target) {
      WebhookDecision::Ignore => {
        let reason = format!("illegal transition '{current}' -> '{target}' from event '{}'", event.event);
        warn!(%order_id, %reason, "Webhook transition ignored.");
        let patch = OrderPatch::new().log(
          ProcessLogEntry::new("webhook.ignored", format!("Ignored {reason}"), EventSource::Webhook)
            .with_data(json!({ "event": event.event, "from": current, "to": target, "vendorStatus": raw_status })),
        );
        store.apply(&order_id, patch).await?;
        return finish(&ctx, WebhookOutcome::Ignored { reason });
      }
      decision => {
        let note = event
          .data
          .note()
          .unwrap_or_else(|| format!("Vendor event {}", event.event));
        let patch = OrderPatch {
          mixam_status: Some(raw_status.clone()),
          tracking: event.data.tracking(),
          fulfillment_notes: event.data.note(),
          ..OrderPatch::new()
        };
        patch
          .expecting(current)
          .transition(target, note, EventSource::Webhook)
          .log(
            ProcessLogEntry::new(
              "webhook.applied",
              format!("Vendor event {} set status '{target}'", event.event),
              EventSource::Webhook,
            )
            .with_data(json!({
              "event": event.event,
              "vendorStatus": raw_status,
              "jobNumber": event.job_number,
              "reasserted": decision == WebhookDecision::Reassert,
              "eventTimestamp": event.timestamp,
            })),
          )
      }
    };

    match store.apply(&order_id, patch).await {
      Ok(updated) => {
        info!(%order_id, status = %target, "Webhook status applied.");
        let mut guard = ctx.write();
        guard.updated = Some(updated);
        guard.outcome = Some(WebhookOutcome::Applied { status: target });
        return Ok(PipelineControl::Continue);
      }
      Err(StoreError::StatusChanged { actual, .. }) => {
        info!(%order_id, %actual, "Order moved concurrently; re-deciding.");
        current = actual;
      }
      Err(e) => return Err(e.into()),
    }
  }

  Err(AppError::Internal(format!("order {order_id} kept changing; webhook not applied")))
}

async fn notify(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (store, notifier, updated) = {
    let guard = ctx.read();
    (guard.app_state.store.clone(), guard.app_state.notifier.clone(), guard.updated.clone())
  };
  let Some(order) = updated else {
    return Ok(PipelineControl::Continue);
  };

  let notification = Notification::status_changed(&order, order.fulfillment_status);
  let outcome = best_effort::attempt(
    "notification",
    &format!("Notifying parent of '{}'", order.fulfillment_status),
    EventSource::Webhook,
    notifier.send(&notification),
  )
  .await;

  // The audit entry is best-effort as well; the status update already landed.
  if let Err(e) = store.apply(&order.order_id, OrderPatch::new().log(outcome.entry)).await {
    warn!(order_id = %order.order_id, error = %e, "Could not record notification outcome.");
  }
  Ok(PipelineControl::Continue)
}
