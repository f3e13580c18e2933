use serde_json::{Map, Value};

/// Claims of a credential that a [`TokenVerifier`](crate::services::verifier::TokenVerifier)
/// has already validated.
///
/// Only verifier backends build this type; the decision engine just reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifiedClaims {
    subject: Option<String>,
    client_id: Option<String>,
    additional: Map<String, Value>,
}

impl VerifiedClaims {
    pub fn new(
        subject: Option<String>,
        client_id: Option<String>,
        additional: Map<String, Value>,
    ) -> Self {
        Self {
            subject,
            client_id,
            additional,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }
}

/// Pick the principal: subject first, then client id (machine-to-machine tokens carry no
/// subject). Empty values count as absent.
pub fn resolve_principal(claims: &VerifiedClaims) -> Option<&str> {
    claims
        .subject()
        .filter(|s| !s.is_empty())
        .or_else(|| claims.client_id().filter(|c| !c.is_empty()))
}
