//! Token verification contract consumed by the decision engine, and its backends.
use async_trait::async_trait;
use thiserror::Error;

use crate::authorizer::{BearerCredential, VerifiedClaims};

pub mod cognito;
pub mod factory;
pub mod jwks;

pub use cognito::{CognitoJwtVerifier, CognitoSettings, TokenUse};
pub use factory::build_verifier;
pub use jwks::{HttpJwksFetcher, JwksCache, JwksError, JwksFetcher, StaticJwksFetcher};

/// Verification outcome other than success.
///
/// The engine never looks at the reason inside `Rejected`; it is carried for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The credential is not acceptable (signature, expiry, issuer, client, ...).
    #[error("credential rejected: {0}")]
    Rejected(String),
    /// The backend could not reach a verdict (key endpoint down, bad key document, ...).
    #[error("verification backend unavailable: {0}")]
    Unavailable(String),
}

impl VerificationError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// A credential verification backend.
///
/// Implementations are process-wide singletons shared across concurrent requests, so they
/// must be `Send + Sync` and must not need re-initialization per call.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn verify(
        &self,
        credential: &BearerCredential,
    ) -> Result<VerifiedClaims, VerificationError>;
}
