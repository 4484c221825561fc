//! # User Service Handlers
//!
//! Account CRUD plus the two endpoints the facade relies on:
//! `POST /users/login` issues a token, `GET /users/authorize` turns a
//! bearer token back into `{"user_id", "role"}`.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::info;

use crate::models::{
    AddUserRequest, EditUserRequest, LoginRequest, TokenResponse, UserCreatedResponse,
    UserResponse,
};
use crate::services::ServiceError;
use crate::AppState;

/// `POST /users`
pub async fn add_user(
    state: web::Data<Arc<AppState>>,
    body: web::Json<AddUserRequest>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = state.users.add(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserCreatedResponse { user_id }))
}

/// `PATCH /users`
pub async fn edit_user(
    state: web::Data<Arc<AppState>>,
    body: web::Json<EditUserRequest>,
) -> Result<HttpResponse, ServiceError> {
    state.users.edit(body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /users/{id}`
pub async fn delete_user(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    state.users.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /users/{id}`
pub async fn get_user(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let user = state.users.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// `GET /users`
pub async fn get_all_users(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, ServiceError> {
    let users: Vec<UserResponse> = state
        .users
        .get_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Exchange credentials for a token.
///
/// ## Endpoint
///
/// `POST /users/login`
///
/// ## Response
///
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiJ9..." }
/// ```
pub async fn login(
    state: web::Data<Arc<AppState>>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    info!("Login request for {}", request.username);

    let token = state.users.login(request).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// Validate the `Authorization: Bearer <token>` header.
///
/// `GET /users/authorize` → `{"user_id": "...", "role": "user"}`
pub async fn authorize(
    state: web::Data<Arc<AppState>>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let ctx = state.users.authorize(header_value)?;
    Ok(HttpResponse::Ok().json(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    use crate::api::configure_internal_routes;
    use crate::api::test_support::test_state;
    use crate::auth::AuthContext;
    use crate::db::Role;

    #[actix_web::test]
    async fn test_user_roundtrip_hides_hash() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_internal_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "username": "ann",
                "email": "ann@x.com",
                "password": "correct horse",
                "role": "admin",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: UserCreatedResponse = test::read_body_json(resp).await;

        let req = test::TestRequest::get()
            .uri(&format!("/users/{}", created.user_id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["username"], "ann");
        assert!(body.get("password_hash").is_none());

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "username": "ann",
                "email": "other@x.com",
                "password": "correct horse",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_login_then_authorize() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_internal_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "username": "ann",
                "email": "ann@x.com",
                "password": "correct horse",
            }))
            .to_request();
        let created: UserCreatedResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(json!({ "username": "ann", "password": "correct horse" }))
            .to_request();
        let token: TokenResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/users/authorize")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token.token)))
            .to_request();
        let ctx: AuthContext = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ctx.user_id, created.user_id);
        assert_eq!(ctx.role, Role::User);

        let req = test::TestRequest::get().uri("/users/authorize").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(json!({ "username": "ann", "password": "wrong password" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
