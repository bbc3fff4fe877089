//! Bearer-token authentication.
//!
//! Identity arrives as an HS256 JWT minted by the platform's identity
//! provider. Handlers take the caller as an explicit [`AuthenticatedUser`]
//! parameter; there is no ambient session lookup anywhere in the services.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

pub const ADMIN_ROLE: &str = "admin";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            token_ttl,
        }
    }
}

/// Issues and verifies bearer tokens.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.clone()]);
        validation.set_issuer(&[config.issuer.clone()]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issues a signed token for the given user.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        name: Option<String>,
        email: Option<String>,
        roles: Vec<String>,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name,
            email,
            roles,
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))
    }

    /// Verifies a token's signature, expiry, issuer and audience.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token verification failed");
                ServiceError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

/// The caller's identity, extracted from the Authorization header and passed
/// explicitly into every authenticated operation.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }

    /// Fails with `Forbidden` unless the caller carries the admin role.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Administrator access required".to_string(),
            ))
        }
    }
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = ServiceError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid subject claim".to_string()))?;
        Ok(Self {
            user_id,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        })
    }
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing Authorization header".to_string())
            })?;

        let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("Authorization header must be a Bearer token".to_string())
        })?;

        let claims = state.auth.verify_token(token)?;
        AuthenticatedUser::try_from(claims)
    }
}

pub type SharedAuthService = Arc<AuthService>;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "test_secret_key_for_testing_purposes_only_32chars",
            "launchpad",
            "launchpad-api",
            Duration::hours(1),
        ))
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue_token(
                user_id,
                Some("Ada".to_string()),
                Some("ada@example.com".to_string()),
                vec![ADMIN_ROLE.to_string()],
            )
            .expect("token should be issued");

        let claims = service.verify_token(&token).expect("token should verify");
        assert_eq!(claims.sub, user_id.to_string());

        let user = AuthenticatedUser::try_from(claims).expect("claims should convert");
        assert_eq!(user.user_id, user_id);
        assert!(user.is_admin());
        assert!(user.require_admin().is_ok());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = test_service();
        assert!(service.verify_token("not-a-token").is_err());
    }

    #[test]
    fn non_admin_is_forbidden() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            name: None,
            email: None,
            roles: vec!["member".to_string()],
        };
        assert!(user.require_admin().is_err());
    }
}
