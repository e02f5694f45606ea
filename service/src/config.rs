// service/src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::errors::{AppError, Result};

pub const DEFAULT_VENDOR_TIMEOUT_SECS: u64 = 30;

/// Where the vendor sends its invoice. Any field may be unset.
#[derive(Debug, Clone, Default)]
pub struct BillingConfig {
  pub name: Option<String>,
  pub line1: Option<String>,
  pub city: Option<String>,
  pub postal_code: Option<String>,
  pub country: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs the service on the in-memory store.
  pub database_url: Option<String>,

  pub webhook_secret: Option<String>,
  pub vendor_api_base_url: String,
  /// `None` runs against the scripted in-process vendor.
  pub vendor_api_key: Option<String>,
  pub vendor_timeout: Duration,

  pub billing: BillingConfig,
  pub notify_sender: String,
  pub admin_alert_email: Option<String>,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
      .field("vendor_api_base_url", &self.vendor_api_base_url)
      .field("vendor_api_key", &self.vendor_api_key.as_ref().map(|_| "[REDACTED]"))
      .field("vendor_timeout", &self.vendor_timeout)
      .field("billing", &self.billing)
      .field("notify_sender", &self.notify_sender)
      .field("admin_alert_email", &self.admin_alert_email)
      .finish()
  }
}

impl Default for AppConfig {
  /// Local development defaults: in-memory store, scripted vendor, no secret.
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      webhook_secret: None,
      vendor_api_base_url: "https://mixam.co.uk".to_string(),
      vendor_api_key: None,
      vendor_timeout: Duration::from_secs(DEFAULT_VENDOR_TIMEOUT_SECS),
      billing: BillingConfig::default(),
      notify_sender: "noreply@example.com".to_string(),
      admin_alert_email: None,
    }
  }
}

fn optional(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let defaults = Self::default();

    let server_host = optional("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = match optional("SERVER_PORT") {
      Some(port) => port
        .parse::<u16>()
        .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {e}")))?,
      None => defaults.server_port,
    };
    let vendor_timeout = match optional("VENDOR_TIMEOUT_SECS") {
      Some(secs) => Duration::from_secs(
        secs
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid VENDOR_TIMEOUT_SECS: {e}")))?,
      ),
      None => defaults.vendor_timeout,
    };

    let config = Self {
      server_host,
      server_port,
      database_url: optional("DATABASE_URL"),
      webhook_secret: optional("VENDOR_WEBHOOK_SECRET"),
      vendor_api_base_url: optional("VENDOR_API_BASE_URL").unwrap_or(defaults.vendor_api_base_url),
      vendor_api_key: optional("VENDOR_API_KEY"),
      vendor_timeout,
      billing: BillingConfig {
        name: optional("BILLING_NAME"),
        line1: optional("BILLING_LINE1"),
        city: optional("BILLING_CITY"),
        postal_code: optional("BILLING_POSTAL_CODE"),
        country: optional("BILLING_COUNTRY"),
      },
      notify_sender: optional("NOTIFY_SENDER").unwrap_or(defaults.notify_sender),
      admin_alert_email: optional("ADMIN_ALERT_EMAIL"),
    };

    if config.webhook_secret.is_none() {
      tracing::warn!("VENDOR_WEBHOOK_SECRET is not set; vendor webhooks will be refused.");
    }
    tracing::info!(config = ?config, "Application configuration loaded.");
    Ok(config)
  }
}
