//! WebSocket authentication. Validates the JWT carried by the
//! first-message handshake.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhub_core::config::AuthConfig;
use taskhub_core::error::AppError;
use taskhub_core::types::id::{TenantId, UserId};

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID.
    pub sub: Uuid,
    /// Tenant the user belongs to.
    pub tenant: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Authenticated identity extracted from a valid token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: UserId,
    /// Tenant ID.
    pub tenant_id: TenantId,
}

/// Authenticates WebSocket connections using JWT access tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validates a token and extracts the connection identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedConnection, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::authentication("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication(format!("Token validation failed: {e}")),
            })?;

        Ok(AuthenticatedConnection {
            user_id: UserId::from_uuid(token_data.claims.sub),
            tenant_id: TenantId::from_uuid(token_data.claims.tenant),
        })
    }
}
