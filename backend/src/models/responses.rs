//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//!
//! Successful reads return the resource itself (or a JSON array of
//! resources); every failure returns an [`ApiError`] body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Role, User};

/// API error information.
///
/// ```json
/// {
///     "code": "SPOT_UNAVAILABLE",
///     "message": "Spot 51d2... is not available for the requested window"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code (e.g., "NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// Returned by `POST /reservations` with status 201.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedResponse {
    pub reservation_id: String,
}

/// Returned by `POST /spots` with status 201.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotCreatedResponse {
    pub spot_id: String,
}

/// Returned by `POST /users` and `POST /api/users/register` with status 201.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub user_id: String,
}

/// Price quote, truncated to whole cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
}

/// Access token issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public view of a user account, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            role: user.role,
            updated_at: user.updated_at,
        }
    }
}

/// Health check response.
///
/// ## Example Response
///
/// ```json
/// {
///     "status": "healthy",
///     "store": true,
///     "version": "0.1.0",
///     "timestamp": "2024-05-01T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: "healthy" or "unhealthy".
    pub status: String,

    /// Document store reachability.
    pub store: bool,

    /// Service version.
    pub version: String,

    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}
