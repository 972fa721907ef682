//! JWT Token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::UserRole;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email the user signs in with; services resolve the acting user by it
    pub email: String,
    /// Granted roles (`USER`, `ADMIN`)
    pub roles: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user_id: i64, email: &str, roles: &[UserRole], config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }
}

/// Create a JWT token for a user
pub fn create_token(
    user_id: i64,
    email: &str,
    roles: &[UserRole],
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let token_claims = TokenClaims::new(user_id, email, roles, config);

    encode(
        &Header::default(),
        &token_claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode a JWT token
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret".into(),
            expiration_hours: 1,
            issuer: "cardbank".into(),
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = config();
        let token =
            create_token(7, "anna@example.com", &[UserRole::User, UserRole::Admin], &config)
                .unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "anna@example.com");
        assert!(!claims.is_expired());
        assert!(claims.has_role(UserRole::Admin));
        assert!(claims.has_role(UserRole::User));
    }

    #[test]
    fn user_token_has_no_admin_role() {
        let config = config();
        let token = create_token(8, "bob@example.com", &[UserRole::User], &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert!(!claims.has_role(UserRole::Admin));
    }

    #[test]
    fn test_invalid_token() {
        assert!(verify_token("invalid-token", &config()).is_err());
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let mut other = config();
        other.issuer = "someone-else".into();
        let token = create_token(1, "a@example.com", &[UserRole::User], &other).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }
}
