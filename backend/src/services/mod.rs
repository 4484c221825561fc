//! # Services Module
//!
//! This module contains the core business logic services for the
//! Reserve Park backend. Each service handles a specific domain.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `ReservationEngine` | Reservation lifecycle, availability and overlap check |
//! | `SpotRegistry` | Spot CRUD, price computation |
//! | `UserDirectory` | Accounts, credentials, token issuance |
//!
//! ## Service Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SERVICES LAYER                            │
//! │                                                                  │
//! │  ┌──────────────────────────────────────────────────────────┐   │
//! │  │                  ReservationEngine                        │   │
//! │  │  • check_availability()  • add()  • edit()  • cancel()    │   │
//! │  │  • delete()  • get()  • get_by_user()  • get_by_spot()    │   │
//! │  └──────────────────────────────────────────────────────────┘   │
//! │                              │                                   │
//! │                     ┌────────┴────────┐                          │
//! │                     ▼                 ▼                          │
//! │              ┌────────────┐    ┌────────────┐                    │
//! │              │   Spot     │    │   User     │                    │
//! │              │  Registry  │    │ Directory  │                    │
//! │              │            │    │            │                    │
//! │              │ CRUD       │    │ CRUD       │                    │
//! │              │ Price      │    │ Login/JWT  │                    │
//! │              └────────────┘    └────────────┘                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The services never call each other; the facade in `api::gateway`
//! combines them (spot existence before availability, price before booking).

pub mod availability;
pub mod reservation_engine;
pub mod spot_registry;
pub mod user_directory;

pub use availability::TimeWindow;
pub use reservation_engine::ReservationEngine;
pub use spot_registry::SpotRegistry;
pub use user_directory::UserDirectory;

use crate::db::StoreError;

/// Errors shared by every service.
///
/// Each variant maps to exactly one HTTP status in `api`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The addressed record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule would be broken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The spot already has an overlapping reservation.
    #[error("Spot {0} is not available for the requested window")]
    SpotUnavailable(String),

    /// The reservation is canceled and cannot change status again.
    #[error("Reservation {0} is already canceled")]
    AlreadyCanceled(String),

    /// Missing, invalid or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The store failed or timed out.
    #[error("Store failure: {0}")]
    StoreFailure(StoreError),

    /// Any other server-side fault (hashing, token signing).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::SpotUnavailable(_) => "SPOT_UNAVAILABLE",
            Self::AlreadyCanceled(_) => "ALREADY_CANCELED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::StoreFailure(_) => "STORE_FAILURE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::DuplicateKey(what) => Self::Conflict(what),
            other => Self::StoreFailure(other),
        }
    }
}

impl From<garde::Report> for ServiceError {
    fn from(report: garde::Report) -> Self {
        let problems: Vec<String> = report
            .iter()
            .map(|(path, error)| format!("{}: {}", path, error))
            .collect();
        Self::ValidationFailed(problems.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_store_errors_map_to_service_errors() {
        let err: ServiceError = StoreError::NotFound("spots/s1".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err: ServiceError = StoreError::DuplicateKey("users/u1".into()).into();
        assert_eq!(err.code(), "CONFLICT");

        let err: ServiceError = StoreError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(err.code(), "STORE_FAILURE");
    }

    #[test]
    fn test_validation_report_names_the_field() {
        use garde::Validate;

        let request = crate::models::RegisterRequest {
            username: "ann".to_string(),
            email: "not-an-email".to_string(),
            password: "pw".to_string(),
        };
        let err: ServiceError = request.validate().unwrap_err().into();

        match err {
            ServiceError::ValidationFailed(message) => assert!(message.contains("email")),
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }
}
