/// One inbound authorization request, as handed over by the enforcement layer.
///
/// - `authorization` is the raw header value (may be absent)
/// - `resource` is the protected route identifier (e.g. a method ARN); it becomes the
///   policy resource on both the allow and the deny path. An empty identifier counts as
///   absent, and the decision then carries only the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    authorization: Option<String>,
    resource: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(authorization: Option<String>, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self {
            authorization,
            resource: (!resource.is_empty()).then_some(resource),
        }
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }
}
