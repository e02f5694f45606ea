// service/src/services/notifications.rs

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{FulfillmentStatus, PrintOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
  StatusChanged(FulfillmentStatus),
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub order_id: String,
  pub kind: NotificationKind,
  pub recipient: String,
  pub subject: String,
  pub body: String,
}

impl Notification {
  pub fn status_changed(order: &PrintOrder, status: FulfillmentStatus) -> Self {
    let (subject, body) = match status {
      FulfillmentStatus::Confirmed => (
        "Your storybook order is confirmed".to_string(),
        "The printer has accepted your book and will start production shortly.".to_string(),
      ),
      FulfillmentStatus::Shipped => {
        let tracking = order
          .tracking
          .tracking_number
          .as_deref()
          .map(|n| format!(" Tracking number: {n}."))
          .unwrap_or_default();
        ("Your storybook is on its way".to_string(), format!("Your book has shipped.{tracking}"))
      }
      FulfillmentStatus::Delivered => (
        "Your storybook has been delivered".to_string(),
        "Enjoy reading it together!".to_string(),
      ),
      FulfillmentStatus::ValidationFailed => (
        "We need to fix your storybook files".to_string(),
        "The printer could not accept the files for your book. Our team is looking into it.".to_string(),
      ),
      other => (
        format!("Storybook order update: {other}"),
        format!("Your print order is now {other}."),
      ),
    };
    Self {
      order_id: order.order_id.clone(),
      kind: NotificationKind::StatusChanged(status),
      recipient: order.shipping.contact_email.clone(),
      subject,
      body,
    }
  }

  pub fn rejected(order: &PrintOrder, reason: &str) -> Self {
    Self {
      order_id: order.order_id.clone(),
      kind: NotificationKind::Rejected,
      recipient: order.shipping.contact_email.clone(),
      subject: "Your storybook print order was cancelled".to_string(),
      body: format!("We could not print this book: {reason}"),
    }
  }
}

/// Delivers notifications to humans. Callers treat it as best-effort.
#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Logs outgoing mail instead of talking to a provider. Addresses on the
/// reserved `.invalid` TLD bounce, which gives tests a failure path.
#[derive(Debug, Clone)]
pub struct MailNotifier {
  sender: String,
  admin_alert: Option<String>,
}

impl MailNotifier {
  pub fn new(sender: impl Into<String>, admin_alert: Option<String>) -> Self {
    Self {
      sender: sender.into(),
      admin_alert,
    }
  }

  async fn deliver(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<String> {
    info!(to, from = %self.sender, subject, "Sending mail.");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    if to.ends_with(".invalid") {
      warn!(to, "Mail bounced.");
      anyhow::bail!("mailbox {to} does not exist");
    }
    let preview: String = body.chars().take(50).collect();
    let message_id = format!("mail_{}", uuid::Uuid::new_v4());
    info!(%message_id, %preview, "Mail sent.");
    Ok(message_id)
  }
}

#[async_trait]
impl NotificationSink for MailNotifier {
  async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
    self
      .deliver(&notification.recipient, &notification.subject, &notification.body)
      .await?;
    let alert_ops = matches!(
      notification.kind,
      NotificationKind::StatusChanged(FulfillmentStatus::ValidationFailed) | NotificationKind::Rejected
    );
    if let (true, Some(admin)) = (alert_ops, &self.admin_alert) {
      let subject = format!("[ops] {} ({})", notification.subject, notification.order_id);
      self.deliver(admin, &subject, &notification.body).await?;
    }
    Ok(())
  }
}
