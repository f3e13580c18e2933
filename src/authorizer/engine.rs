//! Authorization decision engine.
//!
//! Steps: header check → extract → verify (the only await) → resolve principal → decide.
//! Each step is fallible; any credential failure short-circuits to the same deny decision
//! (principal `"user"`, effect Deny, the request's resource), so the response never tells
//! the caller which step failed. Only a verifier backend fault is returned as an error.
//!
//! A request without a resource gets a principal-only decision on either path.

use std::sync::Arc;

use crate::authorizer::claims::resolve_principal;
use crate::authorizer::error::AuthorizationError;
use crate::authorizer::extractor;
use crate::authorizer::policy::{Effect, PolicyDecision, build_policy};
use crate::authorizer::request::AuthorizationRequest;
use crate::services::verifier::TokenVerifier;

/// Principal reported on every deny decision.
pub const DENY_PRINCIPAL: &str = "user";

/// Stateless per request; cheap to share behind `Arc`.
#[derive(Clone)]
pub struct Authorizer {
    verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("verifier", &self.verifier.backend_name())
            .finish()
    }
}

impl Authorizer {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Decide whether the request may invoke its target resource.
    ///
    /// Returns `Err` only for [`AuthorizationError::InternalFailure`].
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<PolicyDecision, AuthorizationError> {
        match self.authenticate(request).await {
            Ok(principal) => {
                tracing::info!(principal = %principal, resource = ?request.resource(), "allow");
                Ok(build_policy(
                    principal,
                    Some(Effect::Allow),
                    request.resource(),
                ))
            }
            Err(err) if err.is_internal() => {
                tracing::error!(error = %err, resource = ?request.resource(), "authorizer failure");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(
                    stage = err.stage(),
                    error = %err,
                    resource = ?request.resource(),
                    "deny"
                );
                Ok(deny(request))
            }
        }
    }

    async fn authenticate(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<String, AuthorizationError> {
        let credential = extractor::extract(request.authorization())?;
        let claims = self.verifier.verify(&credential).await?;

        resolve_principal(&claims)
            .map(str::to_string)
            .ok_or(AuthorizationError::UnresolvableIdentity)
    }
}

fn deny(request: &AuthorizationRequest) -> PolicyDecision {
    build_policy(DENY_PRINCIPAL, Some(Effect::Deny), request.resource())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Map;

    use super::*;
    use crate::authorizer::claims::VerifiedClaims;
    use crate::authorizer::extractor::BearerCredential;
    use crate::authorizer::policy::INVOKE_ACTION;
    use crate::services::verifier::VerificationError;

    const ARN: &str = "arn:aws:execute-api:us-east-1:123456789012:abc123/prod/GET/items";

    /// Verifier answering from a fixed token table; unknown tokens are rejected.
    #[derive(Default)]
    struct FakeVerifier {
        tokens: HashMap<String, Result<VerifiedClaims, VerificationError>>,
        calls: AtomicUsize,
    }

    impl FakeVerifier {
        fn with(mut self, token: &str, outcome: Result<VerifiedClaims, VerificationError>) -> Self {
            self.tokens.insert(token.to_string(), outcome);
            self
        }
    }

    #[async_trait]
    impl TokenVerifier for FakeVerifier {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn verify(
            &self,
            credential: &BearerCredential,
        ) -> Result<VerifiedClaims, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .get(credential.as_str())
                .cloned()
                .unwrap_or_else(|| Err(VerificationError::Rejected("unknown token".into())))
        }
    }

    fn claims(sub: Option<&str>, client_id: Option<&str>) -> VerifiedClaims {
        VerifiedClaims::new(
            sub.map(str::to_string),
            client_id.map(str::to_string),
            Map::new(),
        )
    }

    fn fixture() -> Arc<FakeVerifier> {
        Arc::new(
            FakeVerifier::default()
                .with("valid", Ok(claims(Some("u-42"), Some("login-client"))))
                .with("machine", Ok(claims(None, Some("svc-1"))))
                .with("anonymous", Ok(claims(None, None)))
                .with(
                    "expired",
                    Err(VerificationError::Rejected("token expired".into())),
                )
                .with(
                    "outage",
                    Err(VerificationError::Unavailable("jwks fetch failed".into())),
                ),
        )
    }

    async fn decide(header: Option<&str>) -> Result<PolicyDecision, AuthorizationError> {
        let authorizer = Authorizer::new(fixture());
        authorizer
            .authorize(&AuthorizationRequest::new(header.map(str::to_string), ARN))
            .await
    }

    fn assert_uniform_deny(decision: &PolicyDecision) {
        assert_eq!(decision.principal_id(), DENY_PRINCIPAL);
        assert_eq!(decision.effect(), Some(Effect::Deny));
        assert_eq!(decision.resource(), Some(ARN));
    }

    #[tokio::test]
    async fn no_header_is_denied() {
        let decision = decide(None).await.unwrap();
        assert_uniform_deny(&decision);
    }

    #[tokio::test]
    async fn wrong_scheme_is_denied() {
        let decision = decide(Some("Token abc")).await.unwrap();
        assert_uniform_deny(&decision);
    }

    #[tokio::test]
    async fn scheme_without_credential_is_denied() {
        let decision = decide(Some("Bearer")).await.unwrap();
        assert_uniform_deny(&decision);
    }

    #[tokio::test]
    async fn valid_token_is_allowed_for_subject() {
        let decision = decide(Some("Bearer valid")).await.unwrap();

        assert_eq!(decision.principal_id(), "u-42");
        assert_eq!(decision.effect(), Some(Effect::Allow));
        assert_eq!(decision.resource(), Some(ARN));
        let policy = decision.policy().unwrap();
        assert_eq!(policy.statement.len(), 1);
        assert_eq!(policy.statement[0].action, INVOKE_ACTION);
    }

    #[tokio::test]
    async fn rejected_token_is_denied() {
        let decision = decide(Some("Bearer expired")).await.unwrap();
        assert_uniform_deny(&decision);

        let decision = decide(Some("Bearer forged")).await.unwrap();
        assert_uniform_deny(&decision);
    }

    #[tokio::test]
    async fn machine_token_falls_back_to_client_id() {
        let decision = decide(Some("Bearer machine")).await.unwrap();
        assert_eq!(decision.principal_id(), "svc-1");
        assert_eq!(decision.effect(), Some(Effect::Allow));
    }

    #[tokio::test]
    async fn token_without_identity_is_denied() {
        let decision = decide(Some("Bearer anonymous")).await.unwrap();
        assert_uniform_deny(&decision);
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let err = decide(Some("Bearer outage")).await.unwrap_err();
        assert!(err.is_internal());
        assert_eq!(
            err,
            AuthorizationError::InternalFailure("jwks fetch failed".into())
        );
    }

    #[tokio::test]
    async fn verifier_not_called_for_malformed_headers() {
        let verifier = fixture();
        let authorizer = Authorizer::new(verifier.clone());

        for header in [None, Some(""), Some("Token abc"), Some("Bearer a b")] {
            let request = AuthorizationRequest::new(header.map(str::to_string), ARN);
            authorizer.authorize(&request).await.unwrap();
        }

        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_resource_yields_principal_only_decisions() {
        let authorizer = Authorizer::new(fixture());

        let denied = authorizer
            .authorize(&AuthorizationRequest::new(None, ""))
            .await
            .unwrap();
        assert_eq!(denied.principal_id(), DENY_PRINCIPAL);
        assert!(denied.policy().is_none());

        let allowed = authorizer
            .authorize(&AuthorizationRequest::new(Some("Bearer valid".into()), ""))
            .await
            .unwrap();
        assert_eq!(allowed.principal_id(), "u-42");
        assert!(allowed.policy().is_none());
    }

    #[tokio::test]
    async fn repeated_decisions_are_identical() {
        let authorizer = Authorizer::new(fixture());
        let request = AuthorizationRequest::new(Some("Bearer valid".into()), ARN);

        let first = authorizer.authorize(&request).await.unwrap();
        let second = authorizer.authorize(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let authorizer = Arc::new(Authorizer::new(fixture()));

        let handles: Vec<_> = ["Bearer valid", "Bearer expired", "Bearer machine"]
            .into_iter()
            .cycle()
            .take(30)
            .map(|header| {
                let authorizer = authorizer.clone();
                tokio::spawn(async move {
                    let request = AuthorizationRequest::new(Some(header.to_string()), ARN);
                    (header, authorizer.authorize(&request).await.unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (header, decision) = handle.await.unwrap();
            let expected = match header {
                "Bearer valid" => "u-42",
                "Bearer machine" => "svc-1",
                _ => DENY_PRINCIPAL,
            };
            assert_eq!(decision.principal_id(), expected);
        }
    }
}
