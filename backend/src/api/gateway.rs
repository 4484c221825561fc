//! # API Facade
//!
//! The client-facing surface under `/api`. Every route except register
//! and login takes an [`AuthContext`] extracted from the bearer token,
//! applies its role rule, then delegates to the services.
//!
//! ## Access Rules
//!
//! | Route | Allowed |
//! |-------|---------|
//! | `POST /api/users/register`, `POST /api/users/login` | anyone |
//! | `GET /api/users` | admin |
//! | `GET\|DELETE /api/users/{id}`, `PATCH /api/users` | self or admin |
//! | `GET /api/spots`, `GET /api/spots/{id}`, `POST /api/spots/price` | any user |
//! | `POST\|PATCH /api/spots`, `DELETE /api/spots/{id}` | admin |
//! | `POST /api/reservations` | owner or admin |
//! | `PATCH /api/reservations` | owner of stored and new record, or admin |
//! | `PATCH /api/reservations/cancel/{id}`, `GET /api/reservations/{id}` | owner or admin |
//! | `DELETE /api/reservations/{id}`, `GET /api/reservations` | admin |
//! | `GET /api/reservations/user/{id}` | self or admin |
//! | `GET /api/reservations/spot/{id}`, `availability/check` | any user |
//!
//! ## Booking Flow
//!
//! ```text
//! POST /api/reservations
//!        ↓
//! caller owns user_id? ──no──→ 403
//!        ↓
//! SpotRegistry.price()  ──spot missing──→ 404
//!        ↓
//! ReservationEngine.add(price_paid = quoted price)
//!        ↓
//! 201 {"reservation_id"}
//! ```

use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use garde::Validate;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::db::Role;
use crate::models::{
    AddReservationRequest, AddSpotRequest, AddUserRequest, AvailabilityRequest,
    BookReservationRequest, EditReservationRequest, EditSpotRequest, EditUserRequest,
    LoginRequest, PriceRequest, PriceResponse, RegisterRequest, ReservationCreatedResponse,
    SpotCreatedResponse, TokenResponse, UserCreatedResponse, UserResponse,
};
use crate::services::user_directory::may_assign_role;
use crate::services::ServiceError;
use crate::AppState;

impl FromRequest for AuthContext {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, ServiceError> {
    let state = req
        .app_data::<web::Data<Arc<AppState>>>()
        .ok_or_else(|| ServiceError::Internal("application state is not configured".to_string()))?;

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("missing Authorization header".to_string()))?;

    state.users.authorize(header_value).map_err(|e| {
        warn!("Rejected token on {}: {}", req.path(), e);
        e
    })
}

// ==========================================
// USERS
// ==========================================

/// Self-service sign-up. The role is always `user`.
///
/// `POST /api/users/register`
pub async fn register(
    state: web::Data<Arc<AppState>>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    request.validate()?;

    let user_id = state
        .users
        .add(AddUserRequest {
            username: request.username,
            email: request.email,
            password: request.password,
            role: Role::User,
        })
        .await?;

    Ok(HttpResponse::Created().json(UserCreatedResponse { user_id }))
}

/// `POST /api/users/login`
pub async fn login(
    state: web::Data<Arc<AppState>>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let token = state.users.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// `GET /api/users` (admin)
pub async fn get_all_users(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    let users: Vec<UserResponse> = state
        .users
        .get_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// `GET /api/users/{id}` (self or admin)
pub async fn get_user(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    caller.require_self_or_admin(&user_id)?;

    let user = state.users.get(&user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// `DELETE /api/users/{id}` (self or admin)
pub async fn delete_user(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    caller.require_self_or_admin(&user_id)?;

    state.users.delete(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `PATCH /api/users` (self or admin; only admins change roles)
pub async fn edit_user(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    body: web::Json<EditUserRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    caller.require_self_or_admin(&request.user_id)?;

    if !may_assign_role(&caller, request.role) {
        return Err(ServiceError::Forbidden(
            "only an admin may change a role".to_string(),
        ));
    }

    state.users.edit(request).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ==========================================
// SPOTS
// ==========================================

/// `GET /api/spots`
pub async fn get_all_spots(
    state: web::Data<Arc<AppState>>,
    _caller: AuthContext,
) -> Result<HttpResponse, ServiceError> {
    let spots = state.spots.get_all().await?;
    Ok(HttpResponse::Ok().json(spots))
}

/// `GET /api/spots/{id}`
pub async fn get_spot(
    state: web::Data<Arc<AppState>>,
    _caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let spot = state.spots.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(spot))
}

/// `POST /api/spots/price`
pub async fn get_price(
    state: web::Data<Arc<AppState>>,
    _caller: AuthContext,
    body: web::Json<PriceRequest>,
) -> Result<HttpResponse, ServiceError> {
    let price = state.spots.price(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PriceResponse { price }))
}

/// `POST /api/spots` (admin)
pub async fn add_spot(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    body: web::Json<AddSpotRequest>,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    let spot_id = state.spots.add(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SpotCreatedResponse { spot_id }))
}

/// `PATCH /api/spots` (admin)
pub async fn edit_spot(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    body: web::Json<EditSpotRequest>,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    state.spots.edit(body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /api/spots/{id}` (admin)
pub async fn delete_spot(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    state.spots.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ==========================================
// RESERVATIONS
// ==========================================

/// Book a spot. The price is quoted by the spot registry, never taken
/// from the client.
///
/// ## Endpoint
///
/// `POST /api/reservations`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:3003/api/reservations \
///   -H "Authorization: Bearer $TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "user_id": "8c0f...",
///     "spot_id": "51d2...",
///     "start_time": "2024-05-01T10:00:00Z",
///     "end_time": "2024-05-01T11:00:00Z"
///   }'
/// ```
pub async fn book_reservation(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    body: web::Json<BookReservationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    caller.require_self_or_admin(&request.user_id)?;

    let price_paid = state
        .spots
        .price(PriceRequest {
            spot_id: request.spot_id.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
        })
        .await?;
    debug!("Quoted {} for spot {}", price_paid, request.spot_id);

    let reservation_id = state
        .reservations
        .add(AddReservationRequest {
            user_id: request.user_id,
            spot_id: request.spot_id,
            start_time: request.start_time,
            end_time: request.end_time,
            status: None,
            price_paid,
            created_at: None,
        })
        .await?;

    info!("Reservation {} booked by {}", reservation_id, caller.user_id);
    Ok(HttpResponse::Created().json(ReservationCreatedResponse { reservation_id }))
}

/// `PATCH /api/reservations` (owner of the stored and the new record, or admin)
pub async fn edit_reservation(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    body: web::Json<EditReservationRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();

    let stored = state.reservations.get(&request.reservation_id).await?;
    caller.require_self_or_admin(&stored.user_id)?;
    caller.require_self_or_admin(&request.user_id)?;

    state.reservations.edit(request).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `PATCH /api/reservations/cancel/{id}` (owner or admin)
pub async fn cancel_reservation(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservation_id = path.into_inner();

    let stored = state.reservations.get(&reservation_id).await?;
    caller.require_self_or_admin(&stored.user_id)?;

    state.reservations.cancel(&reservation_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/reservations/{id}` (owner or admin)
pub async fn get_reservation(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservation = state.reservations.get(&path.into_inner()).await?;
    caller.require_self_or_admin(&reservation.user_id)?;

    Ok(HttpResponse::Ok().json(reservation))
}

/// `DELETE /api/reservations/{id}` (admin)
pub async fn delete_reservation(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    state.reservations.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/reservations` (admin)
pub async fn get_all_reservations(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
) -> Result<HttpResponse, ServiceError> {
    caller.require_admin()?;

    let reservations = state.reservations.get_all().await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// `GET /api/reservations/user/{id}` (self or admin)
pub async fn get_user_reservations(
    state: web::Data<Arc<AppState>>,
    caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    caller.require_self_or_admin(&user_id)?;

    let reservations = state.reservations.get_by_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// `GET /api/reservations/spot/{id}`
pub async fn get_spot_reservations(
    state: web::Data<Arc<AppState>>,
    _caller: AuthContext,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reservations = state.reservations.get_by_spot(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// Availability across several spots; every spot must exist.
///
/// `POST /api/reservations/availability/check`
pub async fn check_availability(
    state: web::Data<Arc<AppState>>,
    _caller: AuthContext,
    body: web::Json<AvailabilityRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    state.spots.ensure_exist(&request.spot_ids).await?;

    let available = state.reservations.check_availability(request).await?;
    Ok(HttpResponse::Ok().json(available))
}
