//! # Reservation Engine
//!
//! The ReservationEngine owns the reservation lifecycle and the
//! availability check every write goes through.
//!
//! ## Responsibilities
//!
//! - Answer "which of these spots are free over this window?"
//! - Create, edit, cancel and delete reservations
//! - Read reservations by id, by user, by spot, or all of them
//!
//! ## Flow Example: Add
//!
//! ```text
//! 1. Validate the request (ids present, window ordered, price > 0)
//!                ↓
//! 2. check_availability([spot_id], window)
//!                ↓
//! 3. Spot missing from the result → SpotUnavailable
//!                ↓
//! 4. Generate reservation_id, stamp created_at
//!                ↓
//! 5. Insert into the `reservations` collection
//! ```
//!
//! ## Known Gap
//!
//! Nothing spans steps 2 and 5. Two concurrent adds for overlapping
//! windows on the same spot can both pass the check and both insert.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::{Collection, Filter, Reservation, ReservationStatus};
use crate::models::{AddReservationRequest, AvailabilityRequest, EditReservationRequest};
use crate::utils;

use super::availability::{conflict_filter, remaining_spots};
use super::{ServiceError, TimeWindow};

/// The service managing reservations.
///
/// ## Usage
///
/// ```rust,ignore
/// let engine = ReservationEngine::new(collection, false);
///
/// let free = engine.check_availability(request).await?;
/// let id = engine.add(add_request).await?;
/// engine.cancel(&id).await?;
/// ```
#[derive(Clone)]
pub struct ReservationEngine {
    reservations: Collection<Reservation>,

    /// When set, canceled reservations stop blocking their window.
    ignore_canceled: bool,
}

impl ReservationEngine {
    /// Create a new ReservationEngine.
    ///
    /// ## Arguments
    ///
    /// * `reservations` - Handle on the `reservations` collection
    /// * `ignore_canceled` - Whether canceled reservations are skipped by the conflict check
    pub fn new(reservations: Collection<Reservation>, ignore_canceled: bool) -> Self {
        Self {
            reservations,
            ignore_canceled,
        }
    }

    // ==========================================
    // AVAILABILITY
    // ==========================================

    /// Return the requested spots that have no overlapping reservation.
    ///
    /// Runs a single filtered query for all spots; the result keeps the
    /// order of `spot_ids` and lists each id once. An empty result means
    /// every spot is taken and is not an error.
    ///
    /// ## Returns
    ///
    /// * `Ok(Vec<String>)` - Available spot ids
    /// * `Err(ServiceError::ValidationFailed)` - No spots, or a bad window
    pub async fn check_availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<Vec<String>, ServiceError> {
        if request.spot_ids.is_empty() {
            return Err(ServiceError::ValidationFailed(
                "spot_ids must not be empty".to_string(),
            ));
        }
        if request.spot_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ServiceError::ValidationFailed(
                "spot_ids must not contain empty ids".to_string(),
            ));
        }
        let window = TimeWindow::new(request.start_time, request.end_time)?;

        self.available_spots(&request.spot_ids, &window, None).await
    }

    async fn available_spots(
        &self,
        spot_ids: &[String],
        window: &TimeWindow,
        exclude: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        let filter = conflict_filter(spot_ids, window, self.ignore_canceled, exclude);
        let conflicts = self.reservations.find(&filter).await?;

        debug!(
            "Availability over {} spot(s): {} conflicting reservation(s)",
            spot_ids.len(),
            conflicts.len()
        );

        Ok(remaining_spots(
            spot_ids,
            conflicts.iter().map(|r| r.spot_id.as_str()),
        ))
    }

    async fn ensure_available(
        &self,
        spot_id: &str,
        window: &TimeWindow,
        exclude: Option<&str>,
    ) -> Result<(), ServiceError> {
        let requested = [spot_id.to_string()];
        let free = self.available_spots(&requested, window, exclude).await?;

        if free.is_empty() {
            warn!("Spot {} is already booked over the requested window", spot_id);
            return Err(ServiceError::SpotUnavailable(spot_id.to_string()));
        }
        Ok(())
    }

    // ==========================================
    // RESERVATION OPERATIONS
    // ==========================================

    /// Create a reservation after checking that its spot is free.
    ///
    /// ## Returns
    ///
    /// * `Ok(String)` - The generated reservation id
    /// * `Err(ServiceError::ValidationFailed)` - Missing ids, bad window, price <= 0, status `canceled`
    /// * `Err(ServiceError::SpotUnavailable)` - Overlaps an existing reservation
    pub async fn add(&self, request: AddReservationRequest) -> Result<String, ServiceError> {
        validate_fields(&request.user_id, &request.spot_id, request.price_paid)?;
        if request.status == Some(ReservationStatus::Canceled) {
            return Err(ServiceError::ValidationFailed(
                "a new reservation must have status valid".to_string(),
            ));
        }
        let window = TimeWindow::new(request.start_time, request.end_time)?;

        self.ensure_available(&request.spot_id, &window, None).await?;

        let reservation = Reservation {
            reservation_id: utils::new_id(),
            user_id: request.user_id,
            spot_id: request.spot_id,
            start_time: window.start(),
            end_time: window.end(),
            status: ReservationStatus::Valid,
            price_paid: request.price_paid,
            created_at: Utc::now(),
        };

        self.reservations.insert(&reservation).await?;

        info!(
            "Reservation {} created for spot {} by user {}",
            reservation.reservation_id, reservation.spot_id, reservation.user_id
        );
        Ok(reservation.reservation_id)
    }

    /// Replace a stored reservation with the given record.
    ///
    /// `created_at` always keeps the stored value. Unless the new status
    /// is `canceled`, the (possibly moved) window is re-checked, ignoring
    /// the reservation itself.
    ///
    /// ## Returns
    ///
    /// * `Err(ServiceError::NotFound)` - No reservation with that id
    /// * `Err(ServiceError::AlreadyCanceled)` - Attempt to make a canceled reservation valid
    /// * `Err(ServiceError::SpotUnavailable)` - New window collides with another reservation
    pub async fn edit(&self, request: EditReservationRequest) -> Result<(), ServiceError> {
        if request.reservation_id.trim().is_empty() {
            return Err(ServiceError::ValidationFailed(
                "reservation_id is required".to_string(),
            ));
        }
        validate_fields(&request.user_id, &request.spot_id, request.price_paid)?;
        let window = TimeWindow::new(request.start_time, request.end_time)?;

        let stored = self.get(&request.reservation_id).await?;

        if stored.status == ReservationStatus::Canceled
            && request.status == ReservationStatus::Valid
        {
            return Err(ServiceError::AlreadyCanceled(stored.reservation_id));
        }

        if request.status == ReservationStatus::Valid {
            self.ensure_available(&request.spot_id, &window, Some(stored.reservation_id.as_str()))
                .await?;
        }

        let updated = Reservation {
            reservation_id: stored.reservation_id,
            user_id: request.user_id,
            spot_id: request.spot_id,
            start_time: window.start(),
            end_time: window.end(),
            status: request.status,
            price_paid: request.price_paid,
            created_at: stored.created_at,
        };

        self.reservations.replace(&updated).await?;

        info!("Reservation {} updated", updated.reservation_id);
        Ok(())
    }

    /// Mark a reservation canceled. Canceling frees capacity, so no
    /// availability check runs.
    pub async fn cancel(&self, reservation_id: &str) -> Result<(), ServiceError> {
        let mut reservation = self.get(reservation_id).await?;

        if reservation.status == ReservationStatus::Canceled {
            return Err(ServiceError::AlreadyCanceled(reservation.reservation_id));
        }

        reservation.status = ReservationStatus::Canceled;
        self.reservations.replace(&reservation).await?;

        info!("Reservation {} canceled", reservation_id);
        Ok(())
    }

    /// Hard-delete a reservation.
    pub async fn delete(&self, reservation_id: &str) -> Result<(), ServiceError> {
        if reservation_id.trim().is_empty() {
            return Err(ServiceError::ValidationFailed(
                "reservation_id is required".to_string(),
            ));
        }

        self.reservations.delete(reservation_id).await?;

        info!("Reservation {} deleted", reservation_id);
        Ok(())
    }

    // ==========================================
    // QUERIES
    // ==========================================

    pub async fn get(&self, reservation_id: &str) -> Result<Reservation, ServiceError> {
        self.reservations
            .find_by_key(reservation_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reservation {}", reservation_id)))
    }

    pub async fn get_all(&self) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self.reservations.find_all().await?)
    }

    pub async fn get_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self.reservations.find(&Filter::eq("user_id", user_id)).await?)
    }

    pub async fn get_by_spot(&self, spot_id: &str) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self.reservations.find(&Filter::eq("spot_id", spot_id)).await?)
    }
}

fn validate_fields(user_id: &str, spot_id: &str, price_paid: f64) -> Result<(), ServiceError> {
    if user_id.trim().is_empty() {
        return Err(ServiceError::ValidationFailed("user_id is required".to_string()));
    }
    if spot_id.trim().is_empty() {
        return Err(ServiceError::ValidationFailed("spot_id is required".to_string()));
    }
    if !price_paid.is_finite() || price_paid <= 0.0 {
        return Err(ServiceError::ValidationFailed(
            "price_paid must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
