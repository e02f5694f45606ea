// service/src/services/mod.rs

pub mod best_effort;
pub mod billing;
pub mod notifications;
pub mod signature;

pub use notifications::{MailNotifier, Notification, NotificationKind, NotificationSink};
