use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::authorizer::{BearerCredential, VerifiedClaims};
use crate::services::verifier::jwks::{JwksCache, JwksError};
use crate::services::verifier::{TokenVerifier, VerificationError};

/// Which kind of user-pool token is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUse {
    Access,
    Id,
}

impl TokenUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Id => "id",
        }
    }
}

impl FromStr for TokenUse {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(Self::Access),
            "id" => Ok(Self::Id),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CognitoSettings {
    pub issuer: String,
    /// Accepted app client ids. Must not be empty.
    pub client_ids: Vec<String>,
    pub token_use: TokenUse,
    pub leeway_seconds: u64,
}

/// User-pool token claims the verifier inspects. Everything else lands in `rest`.
#[derive(Debug, Clone, Deserialize)]
struct UserPoolClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    token_use: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// RS256 verifier for user-pool issued JWTs.
///
/// Checks signature (key by `kid` from the JWKS cache), `exp`/`nbf`, `iss`, `token_use`
/// and that the token was issued to one of the accepted app clients.
pub struct CognitoJwtVerifier {
    client_ids: Vec<String>,
    token_use: TokenUse,
    validation: Validation,
    jwks: JwksCache,
}

impl fmt::Debug for CognitoJwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CognitoJwtVerifier")
            .field("client_ids", &self.client_ids)
            .field("token_use", &self.token_use)
            .field("validation", &self.validation)
            .field("jwks", &self.jwks)
            .finish()
    }
}

impl CognitoJwtVerifier {
    pub fn new(settings: CognitoSettings, jwks: JwksCache) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_seconds;

        // Access tokens carry `client_id` instead of `aud`; id tokens carry `aud`.
        match settings.token_use {
            TokenUse::Id => validation.set_audience(&settings.client_ids),
            TokenUse::Access => validation.validate_aud = false,
        }

        Self {
            client_ids: settings.client_ids,
            token_use: settings.token_use,
            validation,
            jwks,
        }
    }

    /// Prefetch signing keys so the first request does not pay for the fetch.
    pub async fn hydrate(&self) -> Result<usize, JwksError> {
        self.jwks.hydrate().await
    }

    fn accepts_client(&self, client: &str) -> bool {
        self.client_ids.iter().any(|id| id == client)
    }
}

#[async_trait]
impl TokenVerifier for CognitoJwtVerifier {
    fn backend_name(&self) -> &'static str {
        "cognito-jwt"
    }

    async fn verify(
        &self,
        credential: &BearerCredential,
    ) -> Result<VerifiedClaims, VerificationError> {
        let token = credential.as_str();

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| VerificationError::rejected(format!("invalid token header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(VerificationError::rejected(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| VerificationError::rejected("token header has no 'kid'"))?;

        let key = self.jwks.decoding_key(&kid).await?;

        let mut claims = jsonwebtoken::decode::<UserPoolClaims>(token, &key, &self.validation)
            .map_err(|e| VerificationError::rejected(format!("jwt verification failed: {e}")))?
            .claims;

        match claims.token_use.as_deref() {
            Some(token_use) if token_use == self.token_use.as_str() => {}
            other => {
                return Err(VerificationError::rejected(format!(
                    "unexpected token_use {other:?}, expected '{}'",
                    self.token_use
                )));
            }
        }

        let client = match self.token_use {
            TokenUse::Access => claims.client_id.take(),
            TokenUse::Id => claims.aud.take(),
        };
        let client = client.filter(|c| self.accepts_client(c)).ok_or_else(|| {
            VerificationError::rejected("token was not issued to an accepted client")
        })?;

        if let Some(token_use) = claims.token_use {
            claims.rest.insert("token_use".to_string(), Value::String(token_use));
        }

        Ok(VerifiedClaims::new(claims.sub, Some(client), claims.rest))
    }
}
