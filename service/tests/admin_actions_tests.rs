// tests/admin_actions_tests.rs
mod common;

use common::*;
use serde_json::json;
use storyprint::actions;
use storyprint::lifecycle::TransitionError;
use storyprint::models::{ApprovalStatus, BindingType, EventSource, FulfillmentStatus, PaymentStatus};
use storyprint::services::NotificationKind;
use storyprint::vendor::{VendorCallRecord, VendorErrorKind};
use storyprint::AppError;

#[tokio::test]
async fn new_orders_start_in_validating_with_empty_history() {
  let app = build_app();
  let order = create_order(&app).await;

  assert_eq!(order.fulfillment_status, FulfillmentStatus::Validating);
  assert_eq!(order.approval_status, ApprovalStatus::None);
  assert_eq!(order.payment_status, PaymentStatus::Unpaid);
  assert!(order.status_history.is_empty());
  assert_eq!(order.process_log.len(), 1);
  assert_eq!(order.process_log[0].event, "order.created");
  assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn create_order_reports_every_missing_field() {
  let app = build_app();
  let mut new = new_order(24, BindingType::Case);
  new.parent_uid = " ".to_string();
  new.shipping.contact_email = String::new();

  match actions::create_order(&app.state, new).await {
    Err(AppError::Validation { errors }) => {
      assert_eq!(errors.len(), 2);
      assert!(errors.iter().any(|e| e.contains("parentUid")));
      assert!(errors.iter().any(|e| e.contains("contactEmail")));
    }
    other => panic!("expected validation error, got {:?}", other),
  }
  assert!(app.store.is_empty());
}

#[tokio::test]
async fn validation_moves_order_to_ready_to_submit() {
  let app = build_app();
  let order = ready_order(&app).await;

  assert_eq!(order.fulfillment_status, FulfillmentStatus::ReadyToSubmit);
  assert_eq!(order.status_history.len(), 1);
  assert_eq!(order.status_history[0].status, FulfillmentStatus::ReadyToSubmit);
  assert_eq!(order.status_history[0].source, EventSource::Admin);
  let last = order.process_log.last().unwrap();
  assert_eq!(last.event, "validation.passed");
  assert_eq!(last.actor_id.as_deref(), Some(ADMIN));
}

#[tokio::test]
async fn failed_validation_returns_all_errors_and_changes_nothing() {
  let app = build_app();
  let order = actions::create_order(&app.state, new_order(23, BindingType::Case)).await.unwrap();

  match actions::validate_order(&app.state, &order.order_id, Some(ADMIN)).await {
    Err(AppError::Validation { errors }) => {
      assert_eq!(errors.len(), 2, "{errors:?}");
      assert!(errors.iter().any(|e| e.contains("minimum page count")));
      assert!(errors.iter().any(|e| e.contains("multiple of 4")));
    }
    other => panic!("expected validation error, got {:?}", other),
  }

  let stored = actions::get_order(&app.state, &order.order_id).await.unwrap();
  assert_eq!(stored, order);
}

#[tokio::test]
async fn approval_gate_routes_through_awaiting_approval() {
  let app = build_app();
  let mut new = new_order(24, BindingType::Case);
  new.requires_approval = true;
  let order = actions::create_order(&app.state, new).await.unwrap();

  let validated = actions::validate_order(&app.state, &order.order_id, Some(ADMIN)).await.unwrap();
  assert_eq!(validated.fulfillment_status, FulfillmentStatus::AwaitingApproval);
  assert_eq!(validated.approval_status, ApprovalStatus::AwaitingApproval);

  let approved = actions::approve(&app.state, &order.order_id, Some(ADMIN)).await.unwrap();
  assert_eq!(approved.fulfillment_status, FulfillmentStatus::ReadyToSubmit);
  assert_eq!(approved.approval_status, ApprovalStatus::Approved);
  assert_eq!(approved.status_history.len(), 2);

  let again = actions::approve(&app.state, &order.order_id, Some(ADMIN)).await;
  assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn reject_cancels_and_notifies_the_parent() {
  let app = build_app();
  let order = ready_order(&app).await;

  let rejected = actions::reject(&app.state, &order.order_id, Some(ADMIN), "  blurry cover art ")
    .await
    .unwrap();

  assert_eq!(rejected.fulfillment_status, FulfillmentStatus::Cancelled);
  assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
  assert_eq!(rejected.rejection_reason.as_deref(), Some("blurry cover art"));
  assert_eq!(rejected.rejected_by.as_deref(), Some(ADMIN));
  assert_eq!(rejected.status_history.len(), 2);
  assert_eq!(rejected.status_history[1].status, FulfillmentStatus::Cancelled);

  let events: Vec<_> = rejected.process_log.iter().map(|e| e.event.as_str()).collect();
  assert!(events.contains(&"order.rejected"));
  assert!(events.contains(&"notification.succeeded"));

  let sent = app.notifier.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].kind, NotificationKind::Rejected);
  assert_eq!(sent[0].recipient, "ada@example.com");
  assert!(sent[0].body.contains("blurry cover art"));
}

#[tokio::test]
async fn reject_survives_a_notification_failure() {
  let app = build_app();
  let order = ready_order(&app).await;
  app.notifier.fail_all();

  let rejected = actions::reject(&app.state, &order.order_id, Some(ADMIN), "duplicate order").await.unwrap();

  assert_eq!(rejected.fulfillment_status, FulfillmentStatus::Cancelled);
  assert_eq!(rejected.process_log.last().unwrap().event, "notification.failed");
}

#[tokio::test]
async fn reject_needs_a_reason() {
  let app = build_app();
  let order = ready_order(&app).await;

  let result = actions::reject(&app.state, &order.order_id, Some(ADMIN), "   ").await;
  assert!(matches!(result, Err(AppError::BadRequest(_))));

  let stored = actions::get_order(&app.state, &order.order_id).await.unwrap();
  assert_eq!(stored.fulfillment_status, FulfillmentStatus::ReadyToSubmit);
}

#[tokio::test]
async fn reject_from_shipped_is_a_conflict_and_leaves_the_order_alone() {
  let app = build_app();
  let order = submitted_order(&app).await;
  deliver_event(&app, "order.shipped", &order.order_id, json!({ "trackingNumber": "TRK1" })).await;
  let before = actions::get_order(&app.state, &order.order_id).await.unwrap();
  assert_eq!(before.fulfillment_status, FulfillmentStatus::Shipped);

  match actions::reject(&app.state, &order.order_id, Some(ADMIN), "too late").await {
    Err(AppError::Conflict(TransitionError::WrongSourceState { current, .. })) => {
      assert_eq!(current, FulfillmentStatus::Shipped);
    }
    other => panic!("expected conflict, got {:?}", other),
  }

  let after = actions::get_order(&app.state, &order.order_id).await.unwrap();
  assert_eq!(after.fulfillment_status, FulfillmentStatus::Shipped);
  assert_eq!(after.status_history.len(), before.status_history.len());
  assert_eq!(after.approval_status, before.approval_status);
}

#[tokio::test]
async fn unknown_orders_are_not_found() {
  let app = build_app();

  assert!(matches!(
    actions::get_order(&app.state, "po_missing").await,
    Err(AppError::NotFound(_))
  ));
  assert!(matches!(
    actions::reject(&app.state, "po_missing", Some(ADMIN), "x").await,
    Err(AppError::NotFound(_))
  ));
  assert!(matches!(
    actions::mark_paid(&app.state, "po_missing", Some(ADMIN)).await,
    Err(AppError::NotFound(_))
  ));
  assert!(matches!(
    actions::interaction_log(&app.state, "po_missing").await,
    Err(AppError::NotFound(_))
  ));
}

#[tokio::test]
async fn mark_paid_touches_payment_only() {
  let app = build_app();
  let order = submitted_order(&app).await;

  let paid = actions::mark_paid(&app.state, &order.order_id, Some(ADMIN)).await.unwrap();

  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  assert_eq!(paid.fulfillment_status, order.fulfillment_status);
  assert_eq!(paid.status_history.len(), order.status_history.len());
  assert_eq!(paid.process_log.last().unwrap().event, "payment.marked_paid");
  assert_eq!(app.vendor.calls().len(), 1);
}

#[tokio::test]
async fn printable_assets_can_be_fixed_after_vendor_file_rejection() {
  let app = build_app();
  let order = submitted_order(&app).await;
  deliver_event(
    &app,
    "file.validation.failed",
    &order.order_id,
    json!({ "validationErrors": ["bleed too small"] }),
  )
  .await;

  let fixed = actions::update_printable_assets(&app.state, &order.order_id, assets(32, BindingType::Case), Some(ADMIN))
    .await
    .unwrap();
  assert_eq!(fixed.fulfillment_status, FulfillmentStatus::ValidationFailed);
  assert_eq!(fixed.printable.interior_page_count, 32);

  let revalidated = actions::validate_order(&app.state, &order.order_id, Some(ADMIN)).await.unwrap();
  assert_eq!(revalidated.fulfillment_status, FulfillmentStatus::ReadyToSubmit);
}

#[tokio::test]
async fn printable_assets_are_frozen_once_submitted() {
  let app = build_app();
  let order = submitted_order(&app).await;

  let result =
    actions::update_printable_assets(&app.state, &order.order_id, assets(32, BindingType::Case), Some(ADMIN)).await;
  assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn refresh_stores_the_raw_vendor_status_without_transitioning() {
  let app = build_app();
  let order = submitted_order(&app).await;
  let vendor_id = order.mixam_order_id.clone().unwrap();
  app.vendor.set_status(&vendor_id, "IN_PRODUCTION");

  let refreshed = actions::refresh_vendor_status(&app.state, &order.order_id, Some(ADMIN)).await.unwrap();

  assert_eq!(refreshed.mixam_status.as_deref(), Some("IN_PRODUCTION"));
  assert_eq!(refreshed.fulfillment_status, FulfillmentStatus::Submitted);
  assert_eq!(refreshed.status_history.len(), order.status_history.len());
  let entry = refreshed.process_log.last().unwrap();
  assert_eq!(entry.event, "vendor.status_refreshed");
  assert_eq!(entry.data.as_ref().unwrap()["mapsTo"], "in_production");
  assert_eq!(
    app.vendor.calls().last(),
    Some(&VendorCallRecord::Status { vendor_order_id: vendor_id })
  );
}

#[tokio::test]
async fn refresh_needs_a_vendor_order() {
  let app = build_app();
  let order = ready_order(&app).await;

  let result = actions::refresh_vendor_status(&app.state, &order.order_id, Some(ADMIN)).await;
  assert!(matches!(result, Err(AppError::BadRequest(_))));
  assert!(app.vendor.calls().is_empty());
}

#[tokio::test]
async fn refresh_surfaces_vendor_failures_and_records_them() {
  let app = build_app();
  let order = submitted_order(&app).await;
  let before = actions::interaction_log(&app.state, &order.order_id).await.unwrap().len();
  app.vendor.fail_next_status(VendorErrorKind::Rejected { status: 503 }, "maintenance");

  let result = actions::refresh_vendor_status(&app.state, &order.order_id, Some(ADMIN)).await;
  assert!(matches!(result, Err(AppError::Vendor(_))));

  let interactions = actions::interaction_log(&app.state, &order.order_id).await.unwrap();
  assert_eq!(interactions.len(), before + 2);
  assert_eq!(interactions.last().unwrap().http_status, Some(503));
}
