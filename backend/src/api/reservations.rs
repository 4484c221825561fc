//! # Reservation Service Handlers
//!
//! The internal reservation surface. No authentication happens here;
//! the facade in `gateway` checks the caller before delegating to the
//! same engine.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST | `/reservations` | 201 + `{"reservation_id"}` |
//! | PATCH | `/reservations` | 204 |
//! | PATCH | `/reservations/cancel/{id}` | 204 |
//! | DELETE | `/reservations/{id}` | 204 |
//! | GET | `/reservations/{id}` | 200 + reservation |
//! | GET | `/reservations` | 200 + array |
//! | GET | `/reservations/user/{id}` | 200 + array |
//! | GET | `/reservations/spot/{id}` | 200 + array |
//! | POST/GET | `/reservations/availability/check` | 200 + array of spot ids |

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::models::{
    AddReservationRequest, AvailabilityRequest, EditReservationRequest,
    ReservationCreatedResponse,
};
use crate::services::ServiceError;
use crate::AppState;

/// Create a reservation.
///
/// ## Endpoint
///
/// `POST /reservations`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:3003/reservations \
///   -H "Content-Type: application/json" \
///   -d '{
///     "user_id": "8c0f...",
///     "spot_id": "51d2...",
///     "start_time": "2024-05-01T10:00:00Z",
///     "end_time": "2024-05-01T11:00:00Z",
///     "price_paid": 12.5
///   }'
/// ```
///
/// ## Errors
///
/// * 400 - Missing fields, `start_time >= end_time`, `price_paid <= 0`
/// * 409 - `SPOT_UNAVAILABLE`, the window overlaps another reservation
pub async fn add_reservation(
    state: web::Data<Arc<AppState>>,
    body: web::Json<AddReservationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    info!("Add reservation request: spot {} user {}", request.spot_id, request.user_id);

    let reservation_id = state.reservations.add(request).await?;

    Ok(HttpResponse::Created().json(ReservationCreatedResponse { reservation_id }))
}

/// Replace a reservation.
///
/// `PATCH /reservations` with the full record as body.
pub async fn edit_reservation(
    state: web::Data<Arc<AppState>>,
    body: web::Json<EditReservationRequest>,
) -> Result<HttpResponse, ServiceError> {
    state.reservations.edit(body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `PATCH /reservations/cancel/{id}`
pub async fn cancel_reservation(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    state.reservations.cancel(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /reservations/{id}`
pub async fn delete_reservation(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    state.reservations.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /reservations/{id}`
pub async fn get_reservation(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservation = state.reservations.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

/// `GET /reservations`
pub async fn get_all_reservations(
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ServiceError> {
    let reservations = state.reservations.get_all().await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// `GET /reservations/user/{id}`
pub async fn get_user_reservations(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservations = state.reservations.get_by_user(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// `GET /reservations/spot/{id}`
pub async fn get_spot_reservations(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservations = state.reservations.get_by_spot(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// Which of the given spots are free over a window?
///
/// ## Endpoint
///
/// `POST /reservations/availability/check` (GET with the same body is
/// also accepted)
///
/// ## Response
///
/// ```json
/// ["51d2...", "77ab..."]
/// ```
///
/// An empty array means every requested spot is booked.
pub async fn check_availability(
    state: web::Data<Arc<AppState>>,
    body: web::Json<AvailabilityRequest>,
) -> Result<HttpResponse, ServiceError> {
    let available = state.reservations.check_availability(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(available))
}
