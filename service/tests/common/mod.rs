// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::Level;

use storyprint::actions;
use storyprint::config::{AppConfig, BillingConfig};
use storyprint::models::{BindingType, NewPrintOrder, PostalAddress, PrintOrder, PrintableAssets, ShippingDetails};
use storyprint::pipelines::{ingest_webhook, WebhookOutcome};
use storyprint::services::signature;
use storyprint::services::{Notification, NotificationSink};
use storyprint::store::InMemoryOrderStore;
use storyprint::vendor::ScriptedVendor;
use storyprint::{AppError, AppState};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN: &str = "admin-7";

/// Keeps every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
  sent: Mutex<Vec<Notification>>,
  failing: Mutex<bool>,
}

impl RecordingNotifier {
  pub fn sent(&self) -> Vec<Notification> {
    self.sent.lock().clone()
  }

  pub fn fail_all(&self) {
    *self.failing.lock() = true;
  }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
  async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
    if *self.failing.lock() {
      anyhow::bail!("mail provider unavailable");
    }
    self.sent.lock().push(notification.clone());
    Ok(())
  }
}

pub struct TestApp {
  pub state: AppState,
  pub store: Arc<InMemoryOrderStore>,
  pub vendor: Arc<ScriptedVendor>,
  pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> AppConfig {
  AppConfig {
    webhook_secret: Some(WEBHOOK_SECRET.to_string()),
    vendor_timeout: Duration::from_secs(2),
    billing: BillingConfig {
      name: Some("Storyprint Ltd".to_string()),
      line1: Some("1 Print Lane".to_string()),
      city: Some("Leeds".to_string()),
      postal_code: Some("LS1 1AA".to_string()),
      country: Some("GB".to_string()),
    },
    ..AppConfig::default()
  }
}

pub fn build_app() -> TestApp {
  build_app_with(test_config())
}

pub fn build_app_with(config: AppConfig) -> TestApp {
  setup_tracing();
  let store = Arc::new(InMemoryOrderStore::new());
  let vendor = Arc::new(ScriptedVendor::new());
  let notifier = Arc::new(RecordingNotifier::default());
  let state = AppState::new(config, store.clone(), vendor.clone(), notifier.clone());
  TestApp {
    state,
    store,
    vendor,
    notifier,
  }
}

pub fn assets(pages: u32, binding: BindingType) -> PrintableAssets {
  PrintableAssets {
    cover_pdf_url: Some("https://files.example.com/cover.pdf".to_string()),
    interior_pdf_url: Some("https://files.example.com/interior.pdf".to_string()),
    interior_page_count: pages,
    binding,
    trim_size: "210x210".to_string(),
  }
}

pub fn new_order(pages: u32, binding: BindingType) -> NewPrintOrder {
  NewPrintOrder {
    parent_uid: "parent-1".to_string(),
    story_id: "story-1".to_string(),
    book_id: "book-1".to_string(),
    printable: assets(pages, binding),
    shipping: ShippingDetails {
      recipient: PostalAddress {
        name: "Ada Parent".to_string(),
        line1: "2 Reading Road".to_string(),
        line2: None,
        city: "York".to_string(),
        region: None,
        postal_code: "YO1 7HH".to_string(),
        country_code: "GB".to_string(),
      },
      contact_email: "ada@example.com".to_string(),
      quantity: 1,
    },
    requires_approval: false,
  }
}

pub async fn create_order(app: &TestApp) -> PrintOrder {
  actions::create_order(&app.state, new_order(24, BindingType::Case))
    .await
    .expect("order should be created")
}

/// Created and validated, sitting in `ready_to_submit`.
pub async fn ready_order(app: &TestApp) -> PrintOrder {
  let order = create_order(app).await;
  actions::validate_order(&app.state, &order.order_id, Some(ADMIN))
    .await
    .expect("valid assets should pass")
}

/// Submitted once through the scripted vendor.
pub async fn submitted_order(app: &TestApp) -> PrintOrder {
  let order = ready_order(app).await;
  actions::submit(&app.state, &order.order_id, Some(ADMIN))
    .await
    .expect("submission should succeed");
  actions::get_order(&app.state, &order.order_id).await.expect("order exists")
}

/// An event for the first job the scripted vendor hands out.
pub fn event_body(event: &str, order_id: &str, data: Value) -> Vec<u8> {
  job_event_body(event, order_id, Some("J-00001"), data)
}

pub fn job_event_body(event: &str, order_id: &str, job_number: Option<&str>, data: Value) -> Vec<u8> {
  let mut envelope = json!({
    "event": event,
    "timestamp": Utc::now(),
    "orderId": order_id,
    "data": data,
  });
  if let Some(job_number) = job_number {
    envelope["jobNumber"] = json!(job_number);
  }
  serde_json::to_vec(&envelope).expect("event serializes")
}

pub fn sign(body: &[u8]) -> String {
  signature::sign(WEBHOOK_SECRET.as_bytes(), body)
}

/// Signs `body` correctly and runs it through webhook ingestion.
pub async fn deliver(app: &TestApp, body: Vec<u8>) -> Result<WebhookOutcome, AppError> {
  let sig = sign(&body);
  ingest_webhook(&app.state, body.into(), Some(sig)).await
}

pub async fn deliver_event(app: &TestApp, event: &str, order_id: &str, data: Value) -> WebhookOutcome {
  deliver(app, event_body(event, order_id, data))
    .await
    .expect("signed webhook is acknowledged")
}

pub async fn deliver_job_event(
  app: &TestApp,
  event: &str,
  order_id: &str,
  job_number: Option<&str>,
  data: Value,
) -> WebhookOutcome {
  deliver(app, job_event_body(event, order_id, job_number, data))
    .await
    .expect("signed webhook is acknowledged")
}

/// Submitted once, then put on hold by the vendor: `MX-00001` / `J-00001`.
pub async fn held_order(app: &TestApp) -> PrintOrder {
  let order = submitted_order(app).await;
  deliver_event(app, "order.on_hold", &order.order_id, json!({ "message": "paper shortage" })).await;
  actions::get_order(&app.state, &order.order_id).await.expect("order exists")
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
