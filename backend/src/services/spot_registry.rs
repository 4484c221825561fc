//! # Spot Registry
//!
//! CRUD for parking spots and the price of booking one over an interval.
//!
//! Every write truncates `price_per_hour` to whole cents and bumps
//! `updated_at`. Edits are partial: fields left out of the request keep
//! their stored value.

use chrono::Utc;
use garde::Validate;
use tracing::{debug, info};

use crate::db::{Collection, Spot};
use crate::models::{AddSpotRequest, EditSpotRequest, PriceRequest};
use crate::utils;

use super::{ServiceError, TimeWindow};

/// The service managing spots.
#[derive(Clone)]
pub struct SpotRegistry {
    spots: Collection<Spot>,
}

impl SpotRegistry {
    pub fn new(spots: Collection<Spot>) -> Self {
        Self { spots }
    }

    // ==========================================
    // SPOT OPERATIONS
    // ==========================================

    /// Register a new spot.
    ///
    /// ## Returns
    ///
    /// * `Ok(String)` - The generated spot id
    /// * `Err(ServiceError::ValidationFailed)` - Coordinates out of range or price <= 0
    pub async fn add(&self, request: AddSpotRequest) -> Result<String, ServiceError> {
        request.validate()?;
        let price_per_hour = validate_price(request.price_per_hour)?;

        let spot = Spot {
            spot_id: utils::new_id(),
            latitude: request.latitude,
            longitude: request.longitude,
            price_per_hour,
            size: request.size,
            spot_type: request.spot_type,
            updated_at: Utc::now(),
        };

        self.spots.insert(&spot).await?;

        info!("Spot {} registered at ({}, {})", spot.spot_id, spot.latitude, spot.longitude);
        Ok(spot.spot_id)
    }

    /// Apply a partial update to a stored spot.
    ///
    /// ## Arguments
    ///
    /// * `request` - `spot_id` plus the fields to overwrite; `None` keeps the stored value
    pub async fn edit(&self, request: EditSpotRequest) -> Result<(), ServiceError> {
        request.validate()?;
        let mut spot = self.get(&request.spot_id).await?;

        if let Some(latitude) = request.latitude {
            spot.latitude = latitude;
        }
        if let Some(longitude) = request.longitude {
            spot.longitude = longitude;
        }
        if let Some(price) = request.price_per_hour {
            spot.price_per_hour = validate_price(price)?;
        }
        if let Some(size) = request.size {
            spot.size = size;
        }
        if let Some(spot_type) = request.spot_type {
            spot.spot_type = spot_type;
        }
        spot.updated_at = Utc::now();

        self.spots.replace(&spot).await?;

        info!("Spot {} updated", spot.spot_id);
        Ok(())
    }

    pub async fn delete(&self, spot_id: &str) -> Result<(), ServiceError> {
        self.spots.delete(spot_id).await?;
        info!("Spot {} deleted", spot_id);
        Ok(())
    }

    // ==========================================
    // QUERIES
    // ==========================================

    pub async fn get(&self, spot_id: &str) -> Result<Spot, ServiceError> {
        self.spots
            .find_by_key(spot_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("spot {}", spot_id)))
    }

    pub async fn get_all(&self) -> Result<Vec<Spot>, ServiceError> {
        Ok(self.spots.find_all().await?)
    }

    /// Fail with `NotFound` naming the first id that has no spot.
    pub async fn ensure_exist(&self, spot_ids: &[String]) -> Result<(), ServiceError> {
        for spot_id in spot_ids {
            self.get(spot_id).await?;
        }
        Ok(())
    }

    /// Price of booking a spot over `[start_time, end_time)`.
    ///
    /// `hours × price_per_hour`, truncated to whole cents: a 5.005/h spot
    /// booked for one hour costs 5.00.
    ///
    /// ## Returns
    ///
    /// * `Err(ServiceError::ValidationFailed)` - `start_time` not before `end_time`
    /// * `Err(ServiceError::NotFound)` - Unknown spot
    pub async fn price(&self, request: PriceRequest) -> Result<f64, ServiceError> {
        let window = TimeWindow::new(request.start_time, request.end_time)?;
        let spot = self.get(&request.spot_id).await?;

        let price = utils::truncate_cents(window.hours() * spot.price_per_hour);
        debug!(
            "Price for spot {} over {:.3}h at {}/h: {}",
            spot.spot_id,
            window.hours(),
            spot.price_per_hour,
            price
        );
        Ok(price)
    }
}

/// Returns the truncated price, rejecting anything that truncates to zero.
fn validate_price(price_per_hour: f64) -> Result<f64, ServiceError> {
    let truncated = if price_per_hour.is_finite() {
        utils::truncate_cents(price_per_hour)
    } else {
        0.0
    };
    if truncated <= 0.0 {
        return Err(ServiceError::ValidationFailed(
            "price_per_hour must be at least 0.01".to_string(),
        ));
    }
    Ok(truncated)
}
