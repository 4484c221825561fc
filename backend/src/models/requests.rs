//! # API Request Models
//!
//! Structures for incoming API request bodies.
//! Each struct represents the expected JSON body for an endpoint.
//!
//! Partial-update requests use `Option` fields: an absent (or `null`)
//! field keeps the stored value, a present one replaces it.
//!
//! Field-level rules (lengths, email shape, coordinate ranges) are
//! declared with `garde` and checked by the services via `validate()`.
//! `None` fields are not checked.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::db::{ReservationStatus, Role, SpotSize, SpotType};

// ==========================================
// RESERVATIONS
// ==========================================

/// Request to create a reservation.
///
/// ## Example JSON
///
/// ```json
/// {
///     "user_id": "8c0f...",
///     "spot_id": "51d2...",
///     "start_time": "2024-05-01T10:00:00Z",
///     "end_time": "2024-05-01T11:00:00Z",
///     "price_paid": 12.5
/// }
/// ```
///
/// `status` may be given but must be `valid`; `created_at` is accepted
/// for compatibility and ignored, the server stamps its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReservationRequest {
    pub user_id: String,
    pub spot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    pub price_paid: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Full replacement of a stored reservation, keyed by `reservation_id`.
///
/// `created_at` is optional because the stored value always wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditReservationRequest {
    pub reservation_id: String,
    pub user_id: String,
    pub spot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub price_paid: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Booking through the facade. The price is computed from the spot,
/// never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookReservationRequest {
    pub user_id: String,
    pub spot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Which of these spots are free over `[start_time, end_time)`?
///
/// ## Example JSON
///
/// ```json
/// {
///     "spot_ids": ["51d2...", "77ab..."],
///     "start_time": "2024-05-01T10:30:00Z",
///     "end_time": "2024-05-01T10:45:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub spot_ids: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ==========================================
// SPOTS
// ==========================================

/// Request to register a new spot.
///
/// `price_per_hour` is checked after truncation to cents, by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddSpotRequest {
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[garde(skip)]
    pub price_per_hour: f64,
    #[garde(skip)]
    pub size: SpotSize,
    #[serde(rename = "type")]
    #[garde(skip)]
    pub spot_type: SpotType,
}

/// Partial spot update. Only supplied fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EditSpotRequest {
    #[garde(length(min = 1))]
    pub spot_id: String,
    #[serde(default)]
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    #[garde(skip)]
    pub size: Option<SpotSize>,
    #[serde(default, rename = "type")]
    #[garde(skip)]
    pub spot_type: Option<SpotType>,
}

/// Price quote for booking a spot over an interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    pub spot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ==========================================
// USERS
// ==========================================

/// Request to create an account directly on the user service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddUserRequest {
    #[garde(length(chars, min = 3, max = 30))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
    #[serde(default = "default_role")]
    #[garde(skip)]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

/// Self-service registration through the facade; the role is always `user`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(chars, min = 3, max = 30))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

/// Partial account update. A supplied password is re-hashed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EditUserRequest {
    #[garde(length(min = 1))]
    pub user_id: String,
    #[serde(default)]
    #[garde(length(chars, min = 3, max = 30))]
    pub username: Option<String>,
    #[serde(default)]
    #[garde(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub role: Option<Role>,
}

/// Credentials exchanged for an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_spot_absent_fields_are_none() {
        let req: EditSpotRequest =
            serde_json::from_str(r#"{"spot_id":"s1","price_per_hour":0.0,"type":"indoor"}"#).unwrap();

        assert_eq!(req.price_per_hour, Some(0.0));
        assert_eq!(req.spot_type, Some(SpotType::Indoor));
        assert!(req.latitude.is_none());
        assert!(req.size.is_none());
    }

    #[test]
    fn test_add_user_defaults_to_user_role() {
        let req: AddUserRequest =
            serde_json::from_str(r#"{"username":"ann","email":"ann@x.io","password":"pw"}"#).unwrap();
        assert_eq!(req.role, Role::User);
    }

    #[test]
    fn test_user_request_rules() {
        let ok = AddUserRequest {
            username: "ann".to_string(),
            email: "ann@x.io".to_string(),
            password: "p".to_string(),
            role: Role::User,
        };
        assert!(ok.validate().is_ok());

        let mut short_name = ok.clone();
        short_name.username = "an".to_string();
        assert!(short_name.validate().is_err());

        let mut long_name = ok.clone();
        long_name.username = "a".repeat(31);
        assert!(long_name.validate().is_err());

        let mut bad_email = ok.clone();
        bad_email.email = "annexample.com".to_string();
        assert!(bad_email.validate().is_err());

        let mut no_password = ok;
        no_password.password = String::new();
        assert!(no_password.validate().is_err());
    }

    #[test]
    fn test_partial_edits_only_check_supplied_fields() {
        let untouched = EditUserRequest {
            user_id: "u1".to_string(),
            ..Default::default()
        };
        assert!(untouched.validate().is_ok());

        let bad_email = EditUserRequest {
            user_id: "u1".to_string(),
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let off_map = EditSpotRequest {
            spot_id: "s1".to_string(),
            longitude: Some(181.0),
            ..Default::default()
        };
        assert!(off_map.validate().is_err());
    }

    #[test]
    fn test_spot_coordinates_in_range() {
        let spot = AddSpotRequest {
            latitude: 90.0,
            longitude: -180.0,
            price_per_hour: 2.5,
            size: SpotSize::Small,
            spot_type: SpotType::Outdoor,
        };
        assert!(spot.validate().is_ok());

        let mut north_of_pole = spot;
        north_of_pole.latitude = 90.5;
        assert!(north_of_pole.validate().is_err());
    }
}
