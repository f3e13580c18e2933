use thiserror::Error;

use crate::authorizer::extractor::ExtractionError;
use crate::services::verifier::VerificationError;

/// Why a request was not allowed.
///
/// Everything except [`AuthorizationError::InternalFailure`] is a caller-credential
/// problem and is turned into the uniform deny decision by the engine. `InternalFailure`
/// means the authorizer itself is broken and is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("no authorization material presented")]
    MissingCredential,
    #[error("authorization material is not a bearer credential")]
    MalformedCredential,
    #[error("credential rejected: {0}")]
    VerificationRejected(String),
    #[error("verified credential carries no principal claim")]
    UnresolvableIdentity,
    #[error("token verification backend failure: {0}")]
    InternalFailure(String),
}

impl AuthorizationError {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalFailure(_))
    }

    /// Short, stable label for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::VerificationRejected(_) => "verification_rejected",
            Self::UnresolvableIdentity => "unresolvable_identity",
            Self::InternalFailure(_) => "internal_failure",
        }
    }
}

impl From<ExtractionError> for AuthorizationError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::MissingHeader => Self::MissingCredential,
            ExtractionError::MalformedHeader => Self::MalformedCredential,
        }
    }
}

impl From<VerificationError> for AuthorizationError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Rejected(reason) => Self::VerificationRejected(reason),
            VerificationError::Unavailable(reason) => Self::InternalFailure(reason),
        }
    }
}
