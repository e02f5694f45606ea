// service/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};

use crate::actions;
use crate::errors::AppError;
use crate::models::NewPrintOrder;
use crate::state::AppState;

#[instrument(name = "handler::create_order", skip(app_state, req_payload), fields(book_id = %req_payload.book_id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewPrintOrder>,
) -> Result<HttpResponse, AppError> {
  let order = actions::create_order(app_state.get_ref(), req_payload.into_inner()).await?;
  info!(order_id = %order.order_id, "Order accepted for validation.");
  Ok(HttpResponse::Created().json(order))
}

/// Full admin view, including history, process log and vendor ids.
#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = actions::get_order(app_state.get_ref(), &order_id).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::parent_status", skip(app_state))]
pub async fn parent_status_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let view = actions::parent_view(app_state.get_ref(), &order_id).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::interactions", skip(app_state))]
pub async fn interactions_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let interactions = actions::interaction_log(app_state.get_ref(), &order_id).await?;
  Ok(HttpResponse::Ok().json(interactions))
}
