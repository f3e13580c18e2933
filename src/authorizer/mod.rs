/*
 * Responsibility
 * - Request-time allow/deny decision for a bearer credential
 * - No I/O of its own; token verification is injected as a `TokenVerifier`
 */
pub mod claims;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod policy;
pub mod request;

pub use claims::{VerifiedClaims, resolve_principal};
pub use engine::{Authorizer, DENY_PRINCIPAL};
pub use error::AuthorizationError;
pub use extractor::{BearerCredential, ExtractionError, extract};
pub use policy::{Effect, PolicyDecision, PolicyDocument, Statement, build_policy};
pub use request::AuthorizationRequest;
