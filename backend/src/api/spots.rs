//! # Spot Service Handlers
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST | `/spots` | 201 + `{"spot_id"}` |
//! | PATCH | `/spots` | 204 |
//! | DELETE | `/spots/{id}` | 204 |
//! | GET | `/spots/{id}` | 200 + spot |
//! | GET | `/spots` | 200 + array |
//! | POST/GET | `/spots/price` | 200 + `{"price"}` |

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use crate::models::{AddSpotRequest, EditSpotRequest, PriceRequest, PriceResponse, SpotCreatedResponse};
use crate::services::ServiceError;
use crate::AppState;

/// `POST /spots`
pub async fn add_spot(
    state: web::Data<Arc<AppState>>,
    body: web::Json<AddSpotRequest>,
) -> Result<HttpResponse, ServiceError> {
    let spot_id = state.spots.add(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(SpotCreatedResponse { spot_id }))
}

/// Partial update.
///
/// ## Endpoint
///
/// `PATCH /spots`
///
/// ```json
/// { "spot_id": "51d2...", "price_per_hour": 6.5 }
/// ```
///
/// Fields left out keep their stored value.
pub async fn edit_spot(
    state: web::Data<Arc<AppState>>,
    body: web::Json<EditSpotRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    info!("Edit spot request: {}", request.spot_id);

    state.spots.edit(request).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /spots/{id}`
pub async fn delete_spot(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    state.spots.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /spots/{id}`
pub async fn get_spot(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let spot = state.spots.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(spot))
}

/// `GET /spots`
pub async fn get_all_spots(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, ServiceError> {
    let spots = state.spots.get_all().await?;
    Ok(HttpResponse::Ok().json(spots))
}

/// Price of booking a spot over a window, truncated to cents.
///
/// ## Endpoint
///
/// `POST /spots/price`
///
/// ```json
/// { "spot_id": "51d2...", "start_time": "2024-05-01T10:00:00Z", "end_time": "2024-05-01T11:00:00Z" }
/// ```
pub async fn get_price(
    state: web::Data<Arc<AppState>>,
    body: web::Json<PriceRequest>,
) -> Result<HttpResponse, ServiceError> {
    let price = state.spots.price(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PriceResponse { price }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    use crate::api::configure_internal_routes;
    use crate::api::test_support::test_state;
    use crate::db::{Spot, SpotSize};

    #[actix_web::test]
    async fn test_spot_lifecycle_and_price() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_internal_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/spots")
            .set_json(json!({
                "latitude": 52.23,
                "longitude": 21.01,
                "price_per_hour": 5.005,
                "size": "small",
                "type": "ev",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: SpotCreatedResponse = test::read_body_json(resp).await;

        let req = test::TestRequest::post()
            .uri("/spots/price")
            .set_json(json!({
                "spot_id": created.spot_id,
                "start_time": "2024-05-01T10:00:00Z",
                "end_time": "2024-05-01T11:00:00Z",
            }))
            .to_request();
        let quote: PriceResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(quote.price, 5.00);

        let req = test::TestRequest::patch()
            .uri("/spots")
            .set_json(json!({ "spot_id": created.spot_id, "size": "large" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/spots/{}", created.spot_id))
            .to_request();
        let spot: Spot = test::call_and_read_body_json(&app, req).await;
        assert_eq!(spot.size, SpotSize::Large);
        assert_eq!(spot.price_per_hour, 5.0);

        let req = test::TestRequest::delete()
            .uri(&format!("/spots/{}", created.spot_id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/spots").to_request();
        let spots: Vec<Spot> = test::call_and_read_body_json(&app, req).await;
        assert!(spots.is_empty());
    }

    #[actix_web::test]
    async fn test_price_for_missing_spot_is_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_internal_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/spots/price")
            .set_json(json!({
                "spot_id": "missing",
                "start_time": "2024-05-01T10:00:00Z",
                "end_time": "2024-05-01T11:00:00Z",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
