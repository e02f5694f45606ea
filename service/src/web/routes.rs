// service/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::web::handlers::{admin_handlers, order_handlers, webhook_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounted by `main.rs` and by the HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Parent-facing and read views
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/status", web::get().to(order_handlers::parent_status_handler))
          .route(
            "/{order_id}/interactions",
            web::get().to(order_handlers::interactions_handler),
          ),
      )
      // Admin actions; every route needs X-Admin-Id
      .service(
        web::scope("/admin/orders/{order_id}")
          .route("/validate", web::post().to(admin_handlers::validate_handler))
          .route("/approve", web::post().to(admin_handlers::approve_handler))
          .route("/submit", web::post().to(admin_handlers::submit_handler))
          .route("/reject", web::post().to(admin_handlers::reject_handler))
          .route("/resubmit", web::post().to(admin_handlers::resubmit_handler))
          .route("/mark-paid", web::post().to(admin_handlers::mark_paid_handler))
          .route("/printable", web::put().to(admin_handlers::update_printable_handler))
          .route("/refresh", web::post().to(admin_handlers::refresh_handler)),
      )
      .service(
        web::scope("/webhooks").route("/vendor", web::post().to(webhook_handlers::vendor_webhook_handler)),
      ),
  );
}
