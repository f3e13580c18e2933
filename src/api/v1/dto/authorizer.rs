/*
 * Responsibility
 * - Wire shapes of the gateway's custom authorizer contract
 *   - request: TOKEN event (authorizationToken) or REQUEST event (headers)
 *   - response: { principalId, policyDocument? }
 * - Field names and order must match what the gateway expects
 */
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::authorizer::{AuthorizationRequest, PolicyDecision};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    /// `TOKEN` or `REQUEST`; absent is treated as `TOKEN`.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Missing or empty → the response carries only `principalId`.
    #[serde(default)]
    pub method_arn: String,
}

impl AuthorizerEvent {
    pub fn into_request(self) -> Result<AuthorizationRequest, &'static str> {
        let authorization = match self.event_type.as_deref().unwrap_or("TOKEN") {
            "TOKEN" => self.authorization_token,
            // Header names are case-insensitive.
            "REQUEST" => self.headers.and_then(|headers| {
                headers
                    .into_iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
                    .map(|(_, value)| value)
            }),
            _ => return Err("unsupported authorizer event type"),
        };

        Ok(AuthorizationRequest::new(authorization, self.method_arn))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_document: Option<PolicyDocumentBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocumentBody {
    pub version: &'static str,
    pub statement: Vec<StatementBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementBody {
    pub action: &'static str,
    pub effect: &'static str,
    pub resource: String,
}

impl From<&PolicyDecision> for AuthorizerResponse {
    fn from(decision: &PolicyDecision) -> Self {
        let policy_document = decision.policy().map(|policy| PolicyDocumentBody {
            version: policy.version,
            statement: policy
                .statement
                .iter()
                .map(|s| StatementBody {
                    action: s.action,
                    effect: s.effect.as_str(),
                    resource: s.resource.clone(),
                })
                .collect(),
        });

        Self {
            principal_id: decision.principal_id().to_string(),
            policy_document,
        }
    }
}
