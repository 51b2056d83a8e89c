//! Bearer token verification.
//!
//! Tokens are issued elsewhere; this side only checks the HS256 signature
//! and expiry and reads the user ID.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use mindful_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Opaque user identifier.
    pub user_id: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// The caller, as established by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// Verifies access tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and return its user.
    pub fn verify(&self, token: &str) -> AppResult<CurrentUser> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })?;

        if data.claims.user_id.is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(CurrentUser {
            id: data.claims.user_id,
        })
    }
}
