// service/src/services/best_effort.rs

//! Side effects that must never fail the operation that triggers them
//! (notifications, cancelling a superseded vendor order, billing lookup).

use std::fmt::Display;
use std::future::Future;

use tracing::{info, warn};

use crate::models::{EventSource, ProcessLogEntry};

/// Outcome of a best-effort call, plus the audit entry describing it.
#[derive(Debug)]
pub struct BestEffort<T> {
  pub value: Option<T>,
  pub entry: ProcessLogEntry,
}

impl<T> BestEffort<T> {
  pub fn succeeded(&self) -> bool {
    self.value.is_some()
  }
}

/// Awaits `fut`; success and failure both produce a `<event>.succeeded` /
/// `<event>.failed` process-log entry, and a failure is only logged.
pub async fn attempt<T, E, F>(event: &str, what: &str, source: EventSource, fut: F) -> BestEffort<T>
where
  E: Display,
  F: Future<Output = Result<T, E>>,
{
  match fut.await {
    Ok(value) => {
      info!(event, "{what} succeeded.");
      BestEffort {
        value: Some(value),
        entry: ProcessLogEntry::new(format!("{event}.succeeded"), format!("{what} succeeded"), source),
      }
    }
    Err(e) => {
      warn!(event, error = %e, "{what} failed; continuing.");
      BestEffort {
        value: None,
        entry: ProcessLogEntry::new(format!("{event}.failed"), format!("{what} failed: {e}"), source),
      }
    }
  }
}
