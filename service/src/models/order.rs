// service/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::lifecycle::CoarseStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
  Validating,
  AwaitingApproval,
  ReadyToSubmit,
  Submitted,
  Confirmed,
  InProduction,
  Shipped,
  Delivered,
  OnHold,
  ValidationFailed,
  Cancelled,
}

impl FulfillmentStatus {
  pub const ALL: [FulfillmentStatus; 11] = [
    FulfillmentStatus::Validating,
    FulfillmentStatus::AwaitingApproval,
    FulfillmentStatus::ReadyToSubmit,
    FulfillmentStatus::Submitted,
    FulfillmentStatus::Confirmed,
    FulfillmentStatus::InProduction,
    FulfillmentStatus::Shipped,
    FulfillmentStatus::Delivered,
    FulfillmentStatus::OnHold,
    FulfillmentStatus::ValidationFailed,
    FulfillmentStatus::Cancelled,
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      FulfillmentStatus::Validating => "validating",
      FulfillmentStatus::AwaitingApproval => "awaiting_approval",
      FulfillmentStatus::ReadyToSubmit => "ready_to_submit",
      FulfillmentStatus::Submitted => "submitted",
      FulfillmentStatus::Confirmed => "confirmed",
      FulfillmentStatus::InProduction => "in_production",
      FulfillmentStatus::Shipped => "shipped",
      FulfillmentStatus::Delivered => "delivered",
      FulfillmentStatus::OnHold => "on_hold",
      FulfillmentStatus::ValidationFailed => "validation_failed",
      FulfillmentStatus::Cancelled => "cancelled",
    }
  }
}

impl std::fmt::Display for FulfillmentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
  #[default]
  None,
  AwaitingApproval,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  #[default]
  Unpaid,
  Paid,
}

/// Who caused an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
  Admin,
  System,
  Webhook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingType {
  /// Hardcover.
  Case,
  Perfect,
  SaddleStitch,
}

impl BindingType {
  pub const fn as_str(self) -> &'static str {
    match self {
      BindingType::Case => "case",
      BindingType::Perfect => "perfect",
      BindingType::SaddleStitch => "saddle_stitch",
    }
  }
}

/// Print-ready files and the metadata derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableAssets {
  pub cover_pdf_url: Option<String>,
  pub interior_pdf_url: Option<String>,
  pub interior_page_count: u32,
  pub binding: BindingType,
  pub trim_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
  pub name: String,
  pub line1: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line2: Option<String>,
  pub city: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,
  pub postal_code: String,
  pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
  pub recipient: PostalAddress,
  pub contact_email: String,
  pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
  pub carrier: Option<String>,
  pub tracking_number: Option<String>,
  pub tracking_url: Option<String>,
  pub estimated_delivery: Option<String>,
}

impl TrackingInfo {
  pub fn is_empty(&self) -> bool {
    self.carrier.is_none()
      && self.tracking_number.is_none()
      && self.tracking_url.is_none()
      && self.estimated_delivery.is_none()
  }

  /// Overwrites only the fields present in `update`.
  pub fn merge(&mut self, update: &TrackingInfo) {
    if update.carrier.is_some() {
      self.carrier.clone_from(&update.carrier);
    }
    if update.tracking_number.is_some() {
      self.tracking_number.clone_from(&update.tracking_number);
    }
    if update.tracking_url.is_some() {
      self.tracking_url.clone_from(&update.tracking_url);
    }
    if update.estimated_delivery.is_some() {
      self.estimated_delivery.clone_from(&update.estimated_delivery);
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
  pub status: FulfillmentStatus,
  pub timestamp: DateTime<Utc>,
  pub note: String,
  pub source: EventSource,
}

impl StatusHistoryEntry {
  pub fn new(status: FulfillmentStatus, note: impl Into<String>, source: EventSource) -> Self {
    Self {
      status,
      timestamp: Utc::now(),
      note: note.into(),
      source,
    }
  }
}

/// One structured system/vendor interaction event on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLogEntry {
  pub timestamp: DateTime<Utc>,
  pub event: String,
  pub message: String,
  pub source: EventSource,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actor_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<JsonValue>,
}

impl ProcessLogEntry {
  pub fn new(event: impl Into<String>, message: impl Into<String>, source: EventSource) -> Self {
    Self {
      timestamp: Utc::now(),
      event: event.into(),
      message: message.into(),
      source,
      actor_id: None,
      data: None,
    }
  }

  pub fn by(mut self, actor_id: Option<&str>) -> Self {
    self.actor_id = actor_id.map(str::to_string);
    self
  }

  pub fn with_data(mut self, data: JsonValue) -> Self {
    self.data = Some(data);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOrder {
  pub order_id: String,
  pub parent_uid: String,
  pub story_id: String,
  pub book_id: String,

  pub fulfillment_status: FulfillmentStatus,
  pub approval_status: ApprovalStatus,
  pub payment_status: PaymentStatus,
  /// Route successful validation through `awaiting_approval` instead of `ready_to_submit`.
  #[serde(default)]
  pub requires_approval: bool,

  pub mixam_order_id: Option<String>,
  pub mixam_job_number: Option<String>,
  pub mixam_status: Option<String>,
  pub previous_mixam_order_id: Option<String>,
  pub previous_mixam_job_number: Option<String>,

  pub printable: PrintableAssets,
  pub shipping: ShippingDetails,
  #[serde(default)]
  pub tracking: TrackingInfo,

  pub fulfillment_notes: Option<String>,
  pub rejection_reason: Option<String>,
  pub rejected_by: Option<String>,

  #[serde(default)]
  pub status_history: Vec<StatusHistoryEntry>,
  #[serde(default)]
  pub process_log: Vec<ProcessLogEntry>,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// What a parent submits when asking for a finalized book to be printed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrintOrder {
  pub parent_uid: String,
  pub story_id: String,
  pub book_id: String,
  pub printable: PrintableAssets,
  pub shipping: ShippingDetails,
  #[serde(default)]
  pub requires_approval: bool,
}

impl PrintOrder {
  /// A fresh order in `validating`. The creation itself is recorded in the
  /// process log; status history only records transitions.
  pub fn create(new: NewPrintOrder) -> Self {
    let now = Utc::now();
    let order_id = format!("po_{}", Uuid::new_v4().simple());
    let created = ProcessLogEntry::new("order.created", "Print order created", EventSource::System)
      .by(Some(&new.parent_uid));
    Self {
      order_id,
      parent_uid: new.parent_uid,
      story_id: new.story_id,
      book_id: new.book_id,
      fulfillment_status: FulfillmentStatus::Validating,
      approval_status: ApprovalStatus::None,
      payment_status: PaymentStatus::Unpaid,
      requires_approval: new.requires_approval,
      mixam_order_id: None,
      mixam_job_number: None,
      mixam_status: None,
      previous_mixam_order_id: None,
      previous_mixam_job_number: None,
      printable: new.printable,
      shipping: new.shipping,
      tracking: TrackingInfo::default(),
      fulfillment_notes: None,
      rejection_reason: None,
      rejected_by: None,
      status_history: Vec::new(),
      process_log: vec![created],
      created_at: now,
      updated_at: now,
    }
  }

  pub fn parent_view(&self) -> ParentOrderView {
    ParentOrderView {
      order_id: self.order_id.clone(),
      book_id: self.book_id.clone(),
      status: CoarseStatus::from(self.fulfillment_status),
      tracking: (!self.tracking.is_empty()).then(|| self.tracking.clone()),
      updated_at: self.updated_at,
    }
  }
}

/// What a parent may see: coarse status and tracking, no vendor internals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentOrderView {
  pub order_id: String,
  pub book_id: String,
  pub status: CoarseStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tracking: Option<TrackingInfo>,
  pub updated_at: DateTime<Utc>,
}
