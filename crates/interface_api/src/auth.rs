//! Authentication
//!
//! HS256 bearer tokens. The decoded [`Claims`] are the request's
//! [`Principal`]: the email is the identity claims are owned by, and the
//! role names map onto [`Role`].

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_claims::{Principal, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's email, the identity claims are recorded against
    pub email: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Principal for Claims {
    fn identity(&self) -> &str {
        &self.email
    }

    fn has_role(&self, role: Role) -> bool {
        self.roles
            .iter()
            .any(|name| name.parse::<Role>().map_or(false, |held| held == role))
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `email` - User's email
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    email: &str,
    roles: &[Role],
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token("u-1", "hr@example.com", &[Role::Hr], SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.identity(), "hr@example.com");
        assert!(claims.has_role(Role::Hr));
        assert!(!claims.has_role(Role::Manager));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token("u-1", "a@example.com", &[Role::Lecturer], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_unknown_role_names_are_ignored() {
        let claims = Claims {
            sub: "u-2".to_string(),
            email: "x@example.com".to_string(),
            roles: vec!["admin".to_string(), "coordinator".to_string()],
            exp: 0,
            iat: 0,
        };
        assert!(claims.has_role(Role::Coordinator));
        assert!(!claims.has_role(Role::Lecturer));
    }
}
