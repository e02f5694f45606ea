// service/src/state.rs

use std::sync::Arc;

use storyflow::Registry;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::NotificationSink;
use crate::store::OrderStore;
use crate::vendor::{AuditedVendor, PrintVendor};

/// Everything a request needs, cloned into each pipeline context.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub vendor: AuditedVendor,
  pub notifier: Arc<dyn NotificationSink>,
  pub config: Arc<AppConfig>,
  pub flows: Arc<Registry<AppError>>,
}

impl AppState {
  /// Wires the collaborators together and registers every workflow.
  pub fn new(
    config: AppConfig,
    store: Arc<dyn OrderStore>,
    vendor: Arc<dyn PrintVendor>,
    notifier: Arc<dyn NotificationSink>,
  ) -> Self {
    let vendor = AuditedVendor::new(vendor, store.clone(), config.vendor_timeout);
    let state = Self {
      store,
      vendor,
      notifier,
      config: Arc::new(config),
      flows: Arc::new(Registry::new()),
    };
    pipelines::register_all_pipelines(&state.flows);
    state
  }
}
