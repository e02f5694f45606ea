// service/src/main.rs

use std::io;
use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storyprint::services::{MailNotifier, NotificationSink};
use storyprint::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use storyprint::vendor::{MixamClient, PrintVendor, ScriptedVendor};
use storyprint::{web, AppConfig, AppState};

async fn build_store(config: &AppConfig) -> io::Result<Arc<dyn OrderStore>> {
  let Some(database_url) = config.database_url.as_deref() else {
    tracing::warn!("DATABASE_URL is not set; orders are kept in memory and lost on restart.");
    return Ok(Arc::new(InMemoryOrderStore::new()));
  };

  let pool = PgPool::connect(database_url).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to connect to the database.");
    io::Error::other(e)
  })?;
  let store = PgOrderStore::new(pool);
  store.ensure_schema().await.map_err(|e| {
    tracing::error!(error = %e, "Failed to prepare the database schema.");
    io::Error::other(e)
  })?;
  tracing::info!("Connected to PostgreSQL order store.");
  Ok(Arc::new(store))
}

fn build_vendor(config: &AppConfig) -> io::Result<Arc<dyn PrintVendor>> {
  match config.vendor_api_key.as_deref() {
    Some(api_key) => {
      let client = MixamClient::new(&config.vendor_api_base_url, api_key, config.vendor_timeout)
        .map_err(io::Error::other)?;
      tracing::info!(base_url = %config.vendor_api_base_url, "Using the live print vendor API.");
      Ok(Arc::new(client))
    }
    None => {
      tracing::warn!("VENDOR_API_KEY is not set; using the scripted in-process vendor.");
      Ok(Arc::new(ScriptedVendor::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting print fulfillment server...");

  let config = AppConfig::from_env().map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    io::Error::other(e.to_string())
  })?;

  let store = build_store(&config).await?;
  let vendor = build_vendor(&config)?;
  let notifier: Arc<dyn NotificationSink> = Arc::new(MailNotifier::new(
    config.notify_sender.clone(),
    config.admin_alert_email.clone(),
  ));

  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::new(config, store, vendor, notifier);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
