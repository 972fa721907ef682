//! Account service: signup, signin and the bootstrap administrator
//!
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{DomainError, DomainResult, NewUser, User, UserRepository, UserRole};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password_with_cost, verify_password};

/// Authentication result returned after a successful signin
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_config: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            users,
            jwt_config,
            bcrypt_cost,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new account holder. Signup always grants `USER` only.
    pub async fn signup(&self, email: &str, password: &str) -> DomainResult<User> {
        if self.users.exists_by_email(email).await? {
            warn!("Signup rejected: email already registered");
            return Err(DomainError::Conflict(format!("email {} is already taken", email)));
        }

        let user = self.create_user(email, password, vec![UserRole::User]).await?;
        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Check email + password and issue a JWT.
    pub async fn signin(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Signin rejected: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let candidate = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .map_err(|e| DomainError::Storage(format!("password check aborted: {}", e)))?
            .unwrap_or(false);

        if !valid {
            warn!(user_id = user.id, "Signin rejected: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let token = create_token(user.id, &user.email, &user.roles, &self.jwt_config)
            .map_err(|e| DomainError::Storage(format!("failed to create token: {}", e)))?;

        info!(user_id = user.id, "User signed in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    // ── Bootstrap ───────────────────────────────────────────────

    /// Create an administrator when there are no users at all.
    /// Returns the new admin, or `None` if users already exist.
    pub async fn ensure_default_admin(
        &self,
        email: &str,
        password: &str,
    ) -> DomainResult<Option<User>> {
        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(email, password, vec![UserRole::User, UserRole::Admin])
            .await?;
        info!(user_id = admin.id, "Default admin created");
        Ok(Some(admin))
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        roles: Vec<UserRole>,
    ) -> DomainResult<User> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
                .await
                .map_err(|e| DomainError::Storage(format!("password hashing aborted: {}", e)))?
                .map_err(|e| DomainError::Validation(format!("cannot hash password: {}", e)))?;

        self.users
            .insert(NewUser {
                email: email.to_string(),
                password_hash,
                roles,
            })
            .await
    }
}
