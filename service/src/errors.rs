// service/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storyflow::FlowError;
use thiserror::Error;

use crate::lifecycle::TransitionError;
use crate::store::StoreError;
use crate::vendor::VendorCallError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation failed: {}", .errors.join("; "))]
  Validation { errors: Vec<String> },

  #[error("Bad request: {0}")]
  BadRequest(String),

  #[error("Authentication failed: {0}")]
  Auth(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(#[from] TransitionError),

  /// The vendor refused or never answered; the order is parked in `on_hold`.
  #[error("Submission of order {order_id} failed: {message}")]
  Submission { order_id: String, message: String },

  #[error("Vendor error: {0}")]
  Vendor(#[from] VendorCallError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Store error: {0}")]
  Store(StoreError),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(order_id) => AppError::NotFound(format!("order '{order_id}'")),
      StoreError::StatusChanged { expected, actual, .. } => {
        AppError::Conflict(TransitionError::Stale { expected, actual })
      }
      other => AppError::Store(other),
    }
  }
}

impl AppError {
  pub fn not_found(order_id: &str) -> Self {
    AppError::NotFound(format!("order '{order_id}'"))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Submission { .. } | AppError::Vendor(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Store(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    let body = match self {
      AppError::Validation { errors } => json!({ "error": "validation failed", "errors": errors }),
      AppError::Submission { order_id, message } => {
        json!({ "error": "submission failed", "orderId": order_id, "detail": message, "status": "on_hold" })
      }
      AppError::Store(_) => json!({ "error": "store operation failed" }),
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        json!({ "error": "workflow processing error" })
      }
      AppError::Config(_) => json!({ "error": "server configuration issue" }),
      other => json!({ "error": other.to_string() }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
