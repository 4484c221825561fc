//! # REST API Module
//!
//! This module defines all HTTP endpoints for the Reserve Park API.
//!
//! ## Endpoint Overview
//!
//! | Prefix | Module | Listener | Auth | Description |
//! |--------|--------|----------|------|-------------|
//! | `/api` | `gateway` | public | Bearer token | Facade with role checks |
//! | `/reservations` | `reservations` | internal | none | Reservation service |
//! | `/spots` | `spots` | internal | none | Spot service |
//! | `/users` | `users` | internal | none | User service, login, token check |
//! | `/health` | `handlers` | both | none | Store reachability |
//!
//! The two listeners are separate `HttpServer`s bound to
//! `SERVER_HOST:SERVER_PORT` and `INTERNAL_HOST:INTERNAL_PORT`.
//!
//! ## Request/Response Format
//!
//! Successful responses carry the resource itself. Every error is:
//!
//! ```json
//! {
//!     "code": "ERROR_CODE",
//!     "message": "Human readable message"
//! }
//! ```
//!
//! ## Status Codes
//!
//! | Error | Status |
//! |-------|--------|
//! | `ValidationFailed` | 400 |
//! | `Unauthorized` | 401 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Conflict`, `SpotUnavailable`, `AlreadyCanceled` | 409 |
//! | `StoreFailure`, `Internal` | 500 |

pub mod gateway;
pub mod handlers;
pub mod reservations;
pub mod routes;
pub mod spots;
pub mod users;

pub use routes::{configure_internal_routes, configure_public_routes};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::models::ApiError;
use crate::services::ServiceError;

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_)
            | ServiceError::SpotUnavailable(_)
            | ServiceError::AlreadyCanceled(_) => StatusCode::CONFLICT,
            ServiceError::StoreFailure(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ApiError {
            code: self.code().to_string(),
            message: self.to_string(),
        })
    }
}
