//! Policy Builder.
//!
//! A [`PolicyDecision`] either carries a full policy (exactly one statement) or only the
//! principal. Effect and resource live together inside [`Statement`], so a decision with
//! only one of them cannot be represented.

use std::fmt;

/// Policy language version tag understood by the gateway.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The single action every statement grants or denies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub action: &'static str,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: [Statement; 1],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    principal_id: String,
    policy: Option<PolicyDocument>,
}

impl PolicyDecision {
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn policy(&self) -> Option<&PolicyDocument> {
        self.policy.as_ref()
    }

    pub fn effect(&self) -> Option<Effect> {
        self.policy.as_ref().map(|p| p.statement[0].effect)
    }

    pub fn resource(&self) -> Option<&str> {
        self.policy.as_ref().map(|p| p.statement[0].resource.as_str())
    }

    pub fn is_allow(&self) -> bool {
        self.effect() == Some(Effect::Allow)
    }
}

pub fn build_policy(
    principal_id: impl Into<String>,
    effect: Option<Effect>,
    resource: Option<&str>,
) -> PolicyDecision {
    let policy = match (effect, resource) {
        (Some(effect), Some(resource)) => Some(PolicyDocument {
            version: POLICY_VERSION,
            statement: [Statement {
                action: INVOKE_ACTION,
                effect,
                resource: resource.to_string(),
            }],
        }),
        _ => None,
    };

    PolicyDecision {
        principal_id: principal_id.into(),
        policy,
    }
}
