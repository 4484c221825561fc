//! # User Directory
//!
//! Accounts, credentials and access tokens.
//!
//! ## Responsibilities
//!
//! - Create, edit, delete and read accounts
//! - Keep `username` and `email` unique across all accounts
//! - Exchange credentials for a token (`login`)
//! - Turn a bearer header back into an [`AuthContext`] (`authorize`)
//!
//! Password hashes are stored but never returned; handlers map [`User`]
//! into `UserResponse` before serializing.

use chrono::Utc;
use garde::Validate;
use tracing::{debug, info, warn};

use crate::auth::{self, AuthContext, TokenIssuer};
use crate::db::{Collection, Filter, Role, User};
use crate::models::{AddUserRequest, EditUserRequest, LoginRequest};
use crate::utils;

use super::ServiceError;

/// The service managing user accounts.
#[derive(Clone)]
pub struct UserDirectory {
    users: Collection<User>,
    tokens: TokenIssuer,
}

impl UserDirectory {
    /// Create a new UserDirectory.
    ///
    /// ## Arguments
    ///
    /// * `users` - Handle on the `users` collection
    /// * `tokens` - Signs tokens on login, verifies them on authorize
    pub fn new(users: Collection<User>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    // ==========================================
    // ACCOUNT OPERATIONS
    // ==========================================

    /// Create an account.
    ///
    /// ## Returns
    ///
    /// * `Ok(String)` - The generated user id
    /// * `Err(ServiceError::ValidationFailed)` - Username not 3..=30 chars, bad email, empty password
    /// * `Err(ServiceError::Conflict)` - Username or email already taken
    pub async fn add(&self, request: AddUserRequest) -> Result<String, ServiceError> {
        request.validate()?;

        self.ensure_unique(&request.username, &request.email, None)
            .await?;

        let user = User {
            user_id: utils::new_id(),
            username: request.username,
            email: request.email,
            password_hash: auth::hash_password(&request.password)?,
            role: request.role,
            updated_at: Utc::now(),
        };

        self.users.insert(&user).await?;

        info!("User {} created ({})", user.user_id, user.username);
        Ok(user.user_id)
    }

    /// Apply a partial update to an account. A new password is re-hashed.
    pub async fn edit(&self, request: EditUserRequest) -> Result<(), ServiceError> {
        request.validate()?;
        let mut user = self.get(&request.user_id).await?;

        if let Some(username) = request.username {
            user.username = username;
        }
        if let Some(email) = request.email {
            user.email = email;
        }
        if let Some(password) = request.password {
            user.password_hash = auth::hash_password(&password)?;
        }
        if let Some(role) = request.role {
            user.role = role;
        }

        self.ensure_unique(&user.username, &user.email, Some(user.user_id.as_str()))
            .await?;

        user.updated_at = Utc::now();
        self.users.replace(&user).await?;

        info!("User {} updated", user.user_id);
        Ok(())
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), ServiceError> {
        self.users.delete(user_id).await?;
        info!("User {} deleted", user_id);
        Ok(())
    }

    // ==========================================
    // QUERIES
    // ==========================================

    pub async fn get(&self, user_id: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_key(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", user_id)))
    }

    pub async fn get_all(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.find_all().await?)
    }

    // ==========================================
    // AUTHENTICATION
    // ==========================================

    /// Verify credentials and issue an access token.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<String, ServiceError> {
        let found = self
            .users
            .find(&Filter::eq("username", request.username.as_str()))
            .await?;

        let user = match found.into_iter().next() {
            Some(user) if auth::verify_password(&request.password, &user.password_hash) => user,
            _ => {
                warn!("Failed login for {}", request.username);
                return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
            }
        };

        let token = self.tokens.issue(&user.user_id, user.role)?;
        info!("User {} logged in", user.user_id);
        Ok(token)
    }

    /// Resolve an `Authorization` header value into the calling user.
    pub fn authorize(&self, header: &str) -> Result<AuthContext, ServiceError> {
        let token = auth::bearer_token(header)?;
        let ctx = self.tokens.verify(token)?;
        debug!("Authorized {} as {:?}", ctx.user_id, ctx.role);
        Ok(ctx)
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        exclude: Option<&str>,
    ) -> Result<(), ServiceError> {
        let mut clauses = vec![Filter::Or(vec![
            Filter::eq("username", username),
            Filter::eq("email", email),
        ])];
        if let Some(user_id) = exclude {
            clauses.push(Filter::ne("user_id", user_id));
        }

        let taken = self.users.find(&Filter::And(clauses)).await?;
        match taken.first() {
            Some(other) if other.username == username => Err(ServiceError::Conflict(format!(
                "username {} is already taken",
                username
            ))),
            Some(_) => Err(ServiceError::Conflict(format!(
                "email {} is already registered",
                email
            ))),
            None => Ok(()),
        }
    }
}

/// Whether `role` may be assigned by `caller`.
pub fn may_assign_role(caller: &AuthContext, role: Option<Role>) -> bool {
    role.is_none() || caller.is_admin()
}
