// service/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines::ingest_webhook;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "X-Vendor-Signature";

/// Vendor status callbacks. The body is taken as raw bytes because the
/// signature covers them exactly; anything past verification is acknowledged
/// with 200 so the vendor does not retry.
#[instrument(name = "handler::vendor_webhook", skip(app_state, req, body), fields(body_len = body.len()))]
pub async fn vendor_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let outcome = ingest_webhook(app_state.get_ref(), body, signature).await?;
  info!(?outcome, "Webhook acknowledged.");
  Ok(HttpResponse::Ok().json(outcome))
}
