// service/src/web/handlers/admin_handlers.rs

use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::actions;
use crate::errors::AppError;
use crate::models::PrintableAssets;
use crate::state::AppState;

pub const ADMIN_HEADER: &str = "X-Admin-Id";

/// The acting admin, taken from `X-Admin-Id`. Authentication happens upstream;
/// this only carries the id into the audit trail.
#[derive(Debug, Clone)]
pub struct AdminActor {
  pub admin_id: String,
}

impl FromRequest for AdminActor {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let admin_id = req
      .headers()
      .get(ADMIN_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty());
    match admin_id {
      Some(id) => futures_util::future::ready(Ok(AdminActor { admin_id: id.to_string() })),
      None => {
        warn!("Admin route called without {ADMIN_HEADER}.");
        futures_util::future::ready(Err(AppError::Auth(format!("{ADMIN_HEADER} header is required"))))
      }
    }
  }
}

#[derive(Deserialize, Debug)]
pub struct RejectRequestPayload {
  #[serde(default)]
  pub reason: String,
}

#[instrument(name = "handler::validate", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn validate_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let order = actions::validate_order(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::approve", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn approve_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let order = actions::approve(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::submit", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn submit_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let outcome = actions::submit(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  info!(order_id = %outcome.order_id, mixam_order_id = %outcome.mixam_order_id, "Order submitted.");
  Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(name = "handler::reject", skip(app_state, admin, req_payload), fields(admin = %admin.admin_id))]
pub async fn reject_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
  req_payload: web::Json<RejectRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let order = actions::reject(
    app_state.get_ref(),
    &order_id,
    Some(&admin.admin_id),
    &req_payload.reason,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({
    "ok": true,
    "orderId": order.order_id,
    "status": order.fulfillment_status,
  })))
}

#[instrument(name = "handler::resubmit", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn resubmit_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let outcome = actions::resubmit(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  info!(
    order_id = %outcome.order_id,
    mixam_order_id = %outcome.mixam_order_id,
    previous = ?outcome.previous_mixam_order_id,
    "Order resubmitted."
  );
  Ok(HttpResponse::Ok().json(outcome))
}

#[instrument(name = "handler::mark_paid", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn mark_paid_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let order = actions::mark_paid(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_printable", skip(app_state, admin, req_payload), fields(admin = %admin.admin_id))]
pub async fn update_printable_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
  req_payload: web::Json<PrintableAssets>,
) -> Result<HttpResponse, AppError> {
  let order = actions::update_printable_assets(
    app_state.get_ref(),
    &order_id,
    req_payload.into_inner(),
    Some(&admin.admin_id),
  )
  .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::refresh", skip(app_state, admin), fields(admin = %admin.admin_id))]
pub async fn refresh_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
  admin: AdminActor,
) -> Result<HttpResponse, AppError> {
  let order = actions::refresh_vendor_status(app_state.get_ref(), &order_id, Some(&admin.admin_id)).await?;
  Ok(HttpResponse::Ok().json(order))
}
