//! # Database Models
//!
//! This module defines the documents stored in each collection.
//! Each struct is one document; field names are the JSON keys the
//! filters in the services refer to.
//!
//! ## Collection Overview
//!
//! | Collection | Key | Description |
//! |------------|-----|-------------|
//! | `reservations` | `reservation_id` | One spot booked by one user over one interval |
//! | `spots` | `spot_id` | A parking spot and its hourly price |
//! | `users` | `user_id` | An account and its role |
//!
//! ## Relationship Diagram
//!
//! ```text
//! ┌─────────────┐       ┌──────────────────┐       ┌─────────────┐
//! │    users    │──────<│   reservations   │>──────│    spots    │
//! │             │       │                  │       │             │
//! │ user_id     │       │ user_id  (weak)  │       │ spot_id     │
//! │ role        │       │ spot_id  (weak)  │       │ price/hour  │
//! └─────────────┘       │ start/end_time   │       └─────────────┘
//!                       └──────────────────┘
//! ```
//!
//! References are not enforced by the store; deleting a spot or a user
//! leaves its reservations in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::Document;

/// Lifecycle state of a reservation.
///
/// The only transition is `Valid -> Canceled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Valid,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Canceled => "canceled",
        }
    }
}

/// A booking of one spot by one user over `[start_time, end_time)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    /// Server-generated UUID, the document key.
    pub reservation_id: String,

    /// Owning user. Weak reference, not checked by the store.
    pub user_id: String,

    /// Booked spot. Weak reference, not checked by the store.
    pub spot_id: String,

    /// Inclusive start of the reserved interval.
    pub start_time: DateTime<Utc>,

    /// Exclusive end of the reserved interval. Always after `start_time`.
    pub end_time: DateTime<Utc>,

    pub status: ReservationStatus,

    /// Amount charged for the whole interval.
    pub price_paid: f64,

    /// Set once on creation, never changed afterwards.
    pub created_at: DateTime<Utc>,
}

impl Document for Reservation {
    const COLLECTION: &'static str = "reservations";

    fn key(&self) -> &str {
        &self.reservation_id
    }
}

/// Physical size class of a spot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpotSize {
    Small,
    Medium,
    Large,
}

/// Kind of parking a spot offers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpotType {
    Indoor,
    Outdoor,
    Ev,
}

/// A parking spot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spot {
    /// Server-generated UUID, the document key.
    pub spot_id: String,

    pub latitude: f64,

    pub longitude: f64,

    /// Hourly rate, truncated to whole cents on every write.
    pub price_per_hour: f64,

    pub size: SpotSize,

    #[serde(rename = "type")]
    pub spot_type: SpotType,

    /// Bumped on every write.
    pub updated_at: DateTime<Utc>,
}

impl Document for Spot {
    const COLLECTION: &'static str = "spots";

    fn key(&self) -> &str {
        &self.spot_id
    }
}

/// Account role used by the facade's authorization checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A user account.
///
/// `password_hash` never leaves the service; API responses use
/// `UserResponse` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Server-generated UUID, the document key.
    pub user_id: String,

    /// Unique across all users.
    pub username: String,

    /// Unique across all users.
    pub email: String,

    /// Argon2 PHC string.
    pub password_hash: String,

    pub role: Role,

    pub updated_at: DateTime<Utc>,
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn key(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spot_type_uses_type_key() {
        let spot = Spot {
            spot_id: "s1".into(),
            latitude: 52.2,
            longitude: 21.0,
            price_per_hour: 4.5,
            size: SpotSize::Medium,
            spot_type: SpotType::Ev,
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&spot).unwrap();
        assert_eq!(value["type"], json!("ev"));
        assert_eq!(value["size"], json!("medium"));
    }

    #[test]
    fn test_reservation_status_wire_format() {
        assert_eq!(
            serde_json::to_value(ReservationStatus::Canceled).unwrap(),
            json!("canceled")
        );
        assert_eq!(ReservationStatus::default(), ReservationStatus::Valid);
    }
}
