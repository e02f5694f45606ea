// tests/end_to_end_tests.rs
mod common;

use common::*;
use serde_json::json;
use storyprint::actions;
use storyprint::lifecycle::CoarseStatus;
use storyprint::models::{EventSource, FulfillmentStatus};
use storyprint::services::NotificationKind;

#[tokio::test]
async fn order_travels_from_creation_to_delivery() {
  let app = build_app();

  let order = create_order(&app).await;
  let order_id = order.order_id.clone();
  assert_eq!(
    actions::parent_view(&app.state, &order_id).await.unwrap().status,
    CoarseStatus::Preparing
  );

  actions::validate_order(&app.state, &order_id, Some(ADMIN)).await.unwrap();
  let outcome = actions::submit(&app.state, &order_id, Some(ADMIN)).await.unwrap();
  assert_eq!(outcome.status, FulfillmentStatus::Submitted);

  deliver_event(&app, "order.confirmed", &order_id, json!({ "status": "CONFIRMED" })).await;
  deliver_event(
    &app,
    "order.shipped",
    &order_id,
    json!({
      "status": "DISPATCHED",
      "trackingNumber": "RM123456789GB",
      "carrier": "Royal Mail",
      "trackingUrl": "https://track.example.com/RM123456789GB",
    }),
  )
  .await;
  deliver_event(&app, "order.delivered", &order_id, json!({ "status": "DELIVERED" })).await;

  let stored = actions::get_order(&app.state, &order_id).await.unwrap();
  let statuses: Vec<_> = stored.status_history.iter().map(|h| h.status).collect();
  assert_eq!(
    statuses,
    vec![
      FulfillmentStatus::ReadyToSubmit,
      FulfillmentStatus::Submitted,
      FulfillmentStatus::Confirmed,
      FulfillmentStatus::Shipped,
      FulfillmentStatus::Delivered,
    ]
  );
  let sources: Vec<_> = stored.status_history.iter().map(|h| h.source).collect();
  assert_eq!(
    sources,
    vec![
      EventSource::Admin,
      EventSource::Admin,
      EventSource::Webhook,
      EventSource::Webhook,
      EventSource::Webhook,
    ]
  );
  assert!(stored
    .status_history
    .windows(2)
    .all(|pair| pair[0].timestamp <= pair[1].timestamp));
  assert_eq!(stored.mixam_status.as_deref(), Some("DELIVERED"));

  let view = actions::parent_view(&app.state, &order_id).await.unwrap();
  assert_eq!(view.status, CoarseStatus::Delivered);
  let tracking = view.tracking.unwrap();
  assert_eq!(tracking.tracking_number.as_deref(), Some("RM123456789GB"));
  assert_eq!(tracking.carrier.as_deref(), Some("Royal Mail"));

  let kinds: Vec<_> = app.notifier.sent().into_iter().map(|n| n.kind).collect();
  assert_eq!(
    kinds,
    vec![
      NotificationKind::StatusChanged(FulfillmentStatus::Confirmed),
      NotificationKind::StatusChanged(FulfillmentStatus::Shipped),
      NotificationKind::StatusChanged(FulfillmentStatus::Delivered),
    ]
  );
}

#[tokio::test]
async fn history_never_shrinks_across_mixed_operations() {
  let app = build_app();
  let order = ready_order(&app).await;
  let order_id = order.order_id.clone();

  app
    .vendor
    .fail_next_submit(storyprint::vendor::VendorErrorKind::Timeout, "gateway timeout");
  let _ = actions::submit(&app.state, &order_id, Some(ADMIN)).await;
  let _ = actions::reject(&app.state, &order_id, Some(ADMIN), "wrong state").await;
  let _ = actions::resubmit(&app.state, &order_id, Some(ADMIN)).await;
  deliver_event(&app, "order.confirmed", &order_id, json!({})).await;
  deliver_event(&app, "file.validation.passed", &order_id, json!({})).await;
  let _ = actions::mark_paid(&app.state, &order_id, None).await;

  let stored = actions::get_order(&app.state, &order_id).await.unwrap();
  assert!(stored.status_history.len() >= order.status_history.len());
  assert_eq!(stored.fulfillment_status, FulfillmentStatus::Confirmed);
  // ready_to_submit, on_hold, submitted, confirmed
  assert_eq!(stored.status_history.len(), 4);
}
