// service/src/store/mod.rs

//! Order persistence.
//!
//! Every change to an order goes through [`OrderPatch`], applied atomically by
//! the store. Field sets are last-writer-wins; history and log entries are
//! appended to whatever the stored order holds at apply time, so concurrent
//! writers never drop each other's audit entries.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::models::{
  ApprovalStatus, EventSource, FulfillmentStatus, PaymentStatus, PrintOrder, PrintableAssets, ProcessLogEntry,
  StatusHistoryEntry, TrackingInfo, VendorInteraction,
};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("order '{0}' not found")]
  NotFound(String),

  #[error("order '{0}' already exists")]
  Duplicate(String),

  /// Compare-and-set on status failed: someone else moved the order first.
  #[error("order '{order_id}' is '{actual}', expected '{expected}'")]
  StatusChanged {
    order_id: String,
    expected: FulfillmentStatus,
    actual: FulfillmentStatus,
  },

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("stored document could not be (de)serialized: {0}")]
  Document(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One atomic update to an order.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
  /// When set, the patch only applies if the order is still in this status.
  pub expected_status: Option<FulfillmentStatus>,

  /// Set through [`OrderPatch::transition`] so history stays in step.
  pub(crate) status: Option<FulfillmentStatus>,
  pub approval_status: Option<ApprovalStatus>,
  pub payment_status: Option<PaymentStatus>,
  pub mixam_order_id: Option<String>,
  pub mixam_job_number: Option<String>,
  pub mixam_status: Option<String>,
  pub previous_mixam_order_id: Option<String>,
  pub previous_mixam_job_number: Option<String>,
  pub fulfillment_notes: Option<String>,
  pub rejection_reason: Option<String>,
  pub rejected_by: Option<String>,
  pub printable: Option<PrintableAssets>,
  /// Merged field by field; `None` fields leave the stored value alone.
  pub tracking: Option<TrackingInfo>,

  pub(crate) history: Vec<StatusHistoryEntry>,
  pub(crate) log: Vec<ProcessLogEntry>,
}

impl OrderPatch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the status and records the history entry for it, in one go.
  pub fn transition(mut self, to: FulfillmentStatus, note: impl Into<String>, source: EventSource) -> Self {
    self.status = Some(to);
    self.history.push(StatusHistoryEntry::new(to, note, source));
    self
  }

  pub fn expecting(mut self, status: FulfillmentStatus) -> Self {
    self.expected_status = Some(status);
    self
  }

  pub fn log(mut self, entry: ProcessLogEntry) -> Self {
    self.log.push(entry);
    self
  }

  pub fn status(&self) -> Option<FulfillmentStatus> {
    self.status
  }

  pub fn history_len(&self) -> usize {
    self.history.len()
  }

  /// Applies the patch in place. Callers hold whatever lock makes this atomic.
  pub fn apply_to(self, order: &mut PrintOrder) -> StoreResult<()> {
    if let Some(expected) = self.expected_status {
      if order.fulfillment_status != expected {
        return Err(StoreError::StatusChanged {
          order_id: order.order_id.clone(),
          expected,
          actual: order.fulfillment_status,
        });
      }
    }

    if let Some(status) = self.status {
      order.fulfillment_status = status;
    }
    if let Some(approval) = self.approval_status {
      order.approval_status = approval;
    }
    if let Some(payment) = self.payment_status {
      order.payment_status = payment;
    }
    set_if_some(&mut order.mixam_order_id, self.mixam_order_id);
    set_if_some(&mut order.mixam_job_number, self.mixam_job_number);
    set_if_some(&mut order.mixam_status, self.mixam_status);
    set_if_some(&mut order.previous_mixam_order_id, self.previous_mixam_order_id);
    set_if_some(&mut order.previous_mixam_job_number, self.previous_mixam_job_number);
    set_if_some(&mut order.fulfillment_notes, self.fulfillment_notes);
    set_if_some(&mut order.rejection_reason, self.rejection_reason);
    set_if_some(&mut order.rejected_by, self.rejected_by);
    if let Some(printable) = self.printable {
      order.printable = printable;
    }
    if let Some(tracking) = &self.tracking {
      order.tracking.merge(tracking);
    }

    order.status_history.extend(self.history);
    order.process_log.extend(self.log);
    order.updated_at = Utc::now();
    Ok(())
  }
}

fn set_if_some(slot: &mut Option<String>, value: Option<String>) {
  if value.is_some() {
    *slot = value;
  }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn insert(&self, order: &PrintOrder) -> StoreResult<()>;

  async fn get(&self, order_id: &str) -> StoreResult<Option<PrintOrder>>;

  /// Applies `patch` atomically and returns the order as stored afterwards.
  async fn apply(&self, order_id: &str, patch: OrderPatch) -> StoreResult<PrintOrder>;

  async fn append_interactions(&self, interactions: &[VendorInteraction]) -> StoreResult<()>;

  /// Interactions for one order, oldest first.
  async fn interactions(&self, order_id: &str) -> StoreResult<Vec<VendorInteraction>>;
}
