//! # API Route Configuration
//!
//! This module sets up the HTTP routes for the two listeners.
//!
//! The public listener carries only the `/api` facade, where every
//! route authenticates and applies its role rule. The service routes
//! trust their callers and are mounted on the internal listener alone.

use actix_web::web;

use crate::services::ServiceError;

use super::{gateway, handlers, reservations, spots, users};

/// Routes shared by both listeners, plus the JSON error handler.
fn configure_common(cfg: &mut web::ServiceConfig) {
    // Malformed JSON bodies become the standard 400 error body
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::ValidationFailed(err.to_string()).into()
    });

    cfg.app_data(json_config)
        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))

        // Health check endpoint
        .route("/health", web::get().to(handlers::health_check));
}

/// Configure the client-facing routes.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                          GET - Health check
/// └── /api
///     ├── /users
///     │   ├── /register                POST - Sign up (role user)
///     │   ├── /login                   POST - Issue token
///     │   ├── /                        GET all, PATCH edit
///     │   └── /{id}                    GET, DELETE
///     ├── /spots
///     │   ├── /                        GET all, POST add, PATCH edit
///     │   ├── /price                   POST - Price quote
///     │   └── /{id}                    GET, DELETE
///     └── /reservations
///         ├── /                        POST book, PATCH edit, GET all
///         ├── /cancel/{id}             PATCH - Cancel
///         ├── /availability/check      POST|GET - Free spots in a window
///         ├── /user/{id}               GET - By user
///         ├── /spot/{id}               GET - By spot
///         └── /{id}                    GET, DELETE
/// ```
///
/// Literal segments (`/register`, `/price`) are registered before the
/// `/{id}` catch-all of the same method.
pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    configure_common(cfg);

    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .route("/register", web::post().to(gateway::register))
                    .route("/login", web::post().to(gateway::login))
                    .route("", web::get().to(gateway::get_all_users))
                    .route("", web::patch().to(gateway::edit_user))
                    .route("/{id}", web::get().to(gateway::get_user))
                    .route("/{id}", web::delete().to(gateway::delete_user)),
            )
            .service(
                web::scope("/spots")
                    .route("", web::get().to(gateway::get_all_spots))
                    .route("", web::post().to(gateway::add_spot))
                    .route("", web::patch().to(gateway::edit_spot))
                    .route("/price", web::post().to(gateway::get_price))
                    .route("/{id}", web::get().to(gateway::get_spot))
                    .route("/{id}", web::delete().to(gateway::delete_spot)),
            )
            .service(
                web::scope("/reservations")
                    .route("", web::post().to(gateway::book_reservation))
                    .route("", web::patch().to(gateway::edit_reservation))
                    .route("", web::get().to(gateway::get_all_reservations))
                    .route(
                        "/cancel/{id}",
                        web::patch().to(gateway::cancel_reservation),
                    )
                    .route(
                        "/availability/check",
                        web::post().to(gateway::check_availability),
                    )
                    .route(
                        "/availability/check",
                        web::get().to(gateway::check_availability),
                    )
                    .route("/user/{id}", web::get().to(gateway::get_user_reservations))
                    .route("/spot/{id}", web::get().to(gateway::get_spot_reservations))
                    .route("/{id}", web::get().to(gateway::get_reservation))
                    .route("/{id}", web::delete().to(gateway::delete_reservation)),
            ),
    );
}

/// Configure the internal service routes. No authentication.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                          GET - Health check
/// ├── /reservations
/// │   ├── /                            POST add, PATCH edit, GET all
/// │   ├── /cancel/{id}                 PATCH - Cancel
/// │   ├── /availability/check          POST|GET - Free spots in a window
/// │   ├── /user/{id}                   GET - By user
/// │   ├── /spot/{id}                   GET - By spot
/// │   └── /{id}                        GET, DELETE
/// ├── /spots
/// │   ├── /                            POST add, PATCH edit, GET all
/// │   ├── /price                       POST|GET - Price quote
/// │   └── /{id}                        GET, DELETE
/// └── /users
///     ├── /                            POST add, PATCH edit, GET all
///     ├── /login                       POST - Issue token
///     ├── /authorize                   GET - Check bearer token
///     └── /{id}                        GET, DELETE
/// ```
pub fn configure_internal_routes(cfg: &mut web::ServiceConfig) {
    configure_common(cfg);

    cfg
        // Reservation service
        .service(
            web::scope("/reservations")
                .route("", web::post().to(reservations::add_reservation))
                .route("", web::patch().to(reservations::edit_reservation))
                .route("", web::get().to(reservations::get_all_reservations))
                .route("/cancel/{id}", web::patch().to(reservations::cancel_reservation))
                .route(
                    "/availability/check",
                    web::post().to(reservations::check_availability),
                )
                .route(
                    "/availability/check",
                    web::get().to(reservations::check_availability),
                )
                .route("/user/{id}", web::get().to(reservations::get_user_reservations))
                .route("/spot/{id}", web::get().to(reservations::get_spot_reservations))
                .route("/{id}", web::get().to(reservations::get_reservation))
                .route("/{id}", web::delete().to(reservations::delete_reservation)),
        )

        // Spot service
        .service(
            web::scope("/spots")
                .route("", web::post().to(spots::add_spot))
                .route("", web::patch().to(spots::edit_spot))
                .route("", web::get().to(spots::get_all_spots))
                .route("/price", web::post().to(spots::get_price))
                .route("/price", web::get().to(spots::get_price))
                .route("/{id}", web::get().to(spots::get_spot))
                .route("/{id}", web::delete().to(spots::delete_spot)),
        )

        // User service
        .service(
            web::scope("/users")
                .route("", web::post().to(users::add_user))
                .route("", web::patch().to(users::edit_user))
                .route("", web::get().to(users::get_all_users))
                .route("/login", web::post().to(users::login))
                .route("/authorize", web::get().to(users::authorize))
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}", web::delete().to(users::delete_user)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    use crate::api::test_support::test_state;

    #[actix_web::test]
    async fn test_public_listener_hides_service_routes() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_public_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "username": "mallory",
                "email": "mallory@x.com",
                "password": "pw",
                "role": "admin",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        assert!(state.users.get_all().await.unwrap().is_empty());

        for uri in ["/users", "/reservations", "/spots", "/users/authorize"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let status = test::call_service(&app, req).await.status();
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", uri);
        }

        let req = test::TestRequest::get().uri("/api/reservations").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::get().uri("/health").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_internal_listener_has_no_facade() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_internal_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/spots").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/spots").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
