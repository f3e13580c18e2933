//! `Authorization` header → bearer credential.
//!
//! Only the exact `"<scheme> <credential>"` form is accepted: the value is split on
//! single spaces and must yield exactly two parts. The scheme is compared to `bearer`
//! case-insensitively.

use std::fmt;

use thiserror::Error;

const BEARER_SCHEME: &str = "bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is not of the form 'Bearer <token>'")]
    MalformedHeader,
}

/// Opaque, non-empty credential taken from the header.
///
/// Debug output is redacted so the credential never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerCredential").field(&"<redacted>").finish()
    }
}

pub fn extract(raw_header: Option<&str>) -> Result<BearerCredential, ExtractionError> {
    let raw = match raw_header {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ExtractionError::MissingHeader),
    };

    let parts: Vec<&str> = raw.split(' ').collect();
    let [scheme, credential] = parts.as_slice() else {
        return Err(ExtractionError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || credential.is_empty() {
        return Err(ExtractionError::MalformedHeader);
    }

    Ok(BearerCredential((*credential).to_string()))
}
