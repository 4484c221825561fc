//! # General Handlers
//!
//! Service information and health. The resource handlers live in
//! `reservations`, `spots`, `users` and `gateway`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::models::HealthResponse;
use crate::AppState;

/// API information endpoint (root).
///
/// Returns information about available API endpoints.
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info() -> HttpResponse {
    let info = json!({
        "name": "Reserve Park API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Parking spot reservations with availability checking",
        "endpoints": {
            "health": { "method": "GET", "path": "/health" },
            "reservations": {
                "add": { "method": "POST", "path": "/api/reservations" },
                "edit": { "method": "PATCH", "path": "/api/reservations" },
                "cancel": { "method": "PATCH", "path": "/api/reservations/cancel/{id}" },
                "availability": { "method": "POST", "path": "/api/reservations/availability/check" },
                "by_user": { "method": "GET", "path": "/api/reservations/user/{id}" },
                "by_spot": { "method": "GET", "path": "/api/reservations/spot/{id}" }
            },
            "spots": {
                "list": { "method": "GET", "path": "/api/spots" },
                "price": { "method": "POST", "path": "/api/spots/price" }
            },
            "users": {
                "register": { "method": "POST", "path": "/api/users/register" },
                "login": { "method": "POST", "path": "/api/users/login" }
            }
        }
    });

    HttpResponse::Ok().json(info)
}

/// Health check endpoint.
///
/// Check if the backend is running and its store answers.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Example
///
/// ```bash
/// curl http://127.0.0.1:3003/health
/// ```
///
/// Responds 200 when healthy and 503 when the store is unreachable.
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let store_healthy = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Store health check failed: {}", e);
            false
        }
    };

    let response = HealthResponse {
        status: if store_healthy { "healthy" } else { "unhealthy" }.to_string(),
        store: store_healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    let status_code = if store_healthy {
        actix_web::http::StatusCode::OK
    } else {
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status_code).json(response)
}
