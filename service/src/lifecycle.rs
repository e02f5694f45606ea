// service/src/lifecycle.rs

//! The print-order state machine.
//!
//! Commanded transitions (admin or system actions) must follow a legal edge and
//! fail loudly otherwise. Webhook-driven transitions are judged separately by
//! [`webhook_decision`]: vendors retry and reorder notifications, so an illegal
//! edge is ignored rather than rejected, and re-asserting the current status is
//! an idempotent re-set.

use serde::Serialize;
use thiserror::Error;

use crate::models::FulfillmentStatus::{self, *};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("cannot move order from '{from}' to '{to}'")]
  Illegal { from: FulfillmentStatus, to: FulfillmentStatus },

  #[error("cannot {action} an order in '{current}' (allowed from: {})", list(.allowed))]
  WrongSourceState {
    action: &'static str,
    current: FulfillmentStatus,
    allowed: &'static [FulfillmentStatus],
  },

  #[error("order moved to '{actual}' while this action expected '{expected}'")]
  Stale {
    expected: FulfillmentStatus,
    actual: FulfillmentStatus,
  },
}

fn list(statuses: &[FulfillmentStatus]) -> String {
  statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

impl FulfillmentStatus {
  pub const fn is_terminal(self) -> bool {
    matches!(self, Delivered | Cancelled)
  }

  /// Legal targets from this state.
  pub const fn allowed_targets(self) -> &'static [FulfillmentStatus] {
    match self {
      Validating => &[ReadyToSubmit, AwaitingApproval, ValidationFailed, Cancelled],
      AwaitingApproval => &[ReadyToSubmit, Submitted, OnHold, ValidationFailed, Cancelled],
      ReadyToSubmit => &[Submitted, OnHold, ValidationFailed, Cancelled],
      Submitted => &[Confirmed, InProduction, Shipped, Delivered, OnHold, ValidationFailed, Cancelled],
      Confirmed => &[InProduction, Shipped, Delivered, OnHold, ValidationFailed, Cancelled],
      InProduction => &[Shipped, Delivered, OnHold, ValidationFailed, Cancelled],
      Shipped => &[Delivered, ValidationFailed, Cancelled],
      OnHold => &[Submitted, OnHold, ValidationFailed, Cancelled],
      ValidationFailed => &[ReadyToSubmit, AwaitingApproval, ValidationFailed, Cancelled],
      Delivered | Cancelled => &[],
    }
  }

  pub fn can_transition_to(self, to: FulfillmentStatus) -> bool {
    self.allowed_targets().contains(&to)
  }

  /// Statuses that warrant telling a human.
  pub const fn should_notify(self) -> bool {
    matches!(self, ValidationFailed | Confirmed | Shipped | Delivered | Cancelled)
  }
}

pub fn ensure_transition(from: FulfillmentStatus, to: FulfillmentStatus) -> Result<(), TransitionError> {
  if from.can_transition_to(to) {
    Ok(())
  } else {
    Err(TransitionError::Illegal { from, to })
  }
}

/// Precondition check for actions that are only legal from specific states.
pub fn ensure_source(
  action: &'static str,
  current: FulfillmentStatus,
  allowed: &'static [FulfillmentStatus],
) -> Result<(), TransitionError> {
  if allowed.contains(&current) {
    Ok(())
  } else {
    Err(TransitionError::WrongSourceState { action, current, allowed })
  }
}

pub const REJECTABLE_FROM: &[FulfillmentStatus] = &[AwaitingApproval, ReadyToSubmit];
pub const SUBMITTABLE_FROM: &[FulfillmentStatus] = &[ReadyToSubmit, AwaitingApproval];
pub const RESUBMITTABLE_FROM: &[FulfillmentStatus] = &[OnHold];
pub const VALIDATABLE_FROM: &[FulfillmentStatus] = &[Validating, ValidationFailed];
pub const APPROVABLE_FROM: &[FulfillmentStatus] = &[AwaitingApproval];
pub const ASSETS_EDITABLE_IN: &[FulfillmentStatus] =
  &[Validating, AwaitingApproval, ReadyToSubmit, OnHold, ValidationFailed];

/// How a vendor-reported status is applied to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDecision {
  /// A legal edge: change status.
  Apply,
  /// Same status again (vendor retry or a tracking update): re-set it.
  Reassert,
  /// Not reachable from here: log and leave the order alone.
  Ignore,
}

pub fn webhook_decision(current: FulfillmentStatus, reported: FulfillmentStatus) -> WebhookDecision {
  if current == reported {
    WebhookDecision::Reassert
  } else if current.can_transition_to(reported) {
    WebhookDecision::Apply
  } else {
    WebhookDecision::Ignore
  }
}

/// Parent-facing status; hides holds, approvals and vendor-side detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseStatus {
  Preparing,
  Printing,
  Shipped,
  Delivered,
  Cancelled,
}

impl From<FulfillmentStatus> for CoarseStatus {
  fn from(status: FulfillmentStatus) -> Self {
    match status {
      Validating | AwaitingApproval | ReadyToSubmit | ValidationFailed | OnHold => CoarseStatus::Preparing,
      Submitted | Confirmed | InProduction => CoarseStatus::Printing,
      FulfillmentStatus::Shipped => CoarseStatus::Shipped,
      FulfillmentStatus::Delivered => CoarseStatus::Delivered,
      FulfillmentStatus::Cancelled => CoarseStatus::Cancelled,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn terminal_states_have_no_exits() {
    for status in FulfillmentStatus::ALL {
      assert_eq!(status.is_terminal(), status.allowed_targets().is_empty(), "{status}");
    }
  }

  #[test]
  fn every_non_terminal_state_can_be_cancelled_or_fail_validation() {
    for status in FulfillmentStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
      assert!(status.can_transition_to(Cancelled), "{status} -> cancelled");
      assert!(status.can_transition_to(ValidationFailed), "{status} -> validation_failed");
    }
  }

  #[test]
  fn happy_path_edges_are_legal() {
    let path = [Validating, ReadyToSubmit, Submitted, Confirmed, InProduction, Shipped, Delivered];
    for pair in path.windows(2) {
      assert!(ensure_transition(pair[0], pair[1]).is_ok(), "{} -> {}", pair[0], pair[1]);
    }
  }

  #[test]
  fn on_hold_round_trip_and_self_loop() {
    assert!(Submitted.can_transition_to(OnHold));
    assert!(OnHold.can_transition_to(Submitted));
    assert!(OnHold.can_transition_to(OnHold));
    assert!(!OnHold.can_transition_to(Confirmed));
  }

  #[test]
  fn reject_precondition_names_the_allowed_states() {
    let err = ensure_source("reject", Shipped, REJECTABLE_FROM).unwrap_err();
    assert_eq!(
      err.to_string(),
      "cannot reject an order in 'shipped' (allowed from: awaiting_approval, ready_to_submit)"
    );
    assert!(ensure_source("reject", ReadyToSubmit, REJECTABLE_FROM).is_ok());
  }

  #[test]
  fn illegal_edge_is_reported() {
    assert_eq!(
      ensure_transition(Delivered, Confirmed),
      Err(TransitionError::Illegal { from: Delivered, to: Confirmed })
    );
  }

  #[test]
  fn webhook_decisions() {
    assert_eq!(webhook_decision(Submitted, Confirmed), WebhookDecision::Apply);
    assert_eq!(webhook_decision(Shipped, Shipped), WebhookDecision::Reassert);
    assert_eq!(webhook_decision(Delivered, Delivered), WebhookDecision::Reassert);
    assert_eq!(webhook_decision(Delivered, Shipped), WebhookDecision::Ignore);
    assert_eq!(webhook_decision(Submitted, ReadyToSubmit), WebhookDecision::Ignore);
  }

  #[test]
  fn notify_set() {
    let notified: Vec<_> = FulfillmentStatus::ALL.into_iter().filter(|s| s.should_notify()).collect();
    assert_eq!(notified, vec![Confirmed, Shipped, Delivered, ValidationFailed, Cancelled]);
  }

  #[test]
  fn coarse_status_hides_internal_states() {
    assert_eq!(CoarseStatus::from(OnHold), CoarseStatus::Preparing);
    assert_eq!(CoarseStatus::from(ValidationFailed), CoarseStatus::Preparing);
    assert_eq!(CoarseStatus::from(InProduction), CoarseStatus::Printing);
    assert_eq!(CoarseStatus::from(Delivered), CoarseStatus::Delivered);
  }
}
