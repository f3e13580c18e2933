//! Signing-key cache for JWT verification.
//!
//! Keys are fetched lazily (or up front via `hydrate`) and kept for the lifetime of the
//! process. A token signed with an unknown `kid` triggers a refetch, at most once per
//! refresh cooldown, which picks up key rotation on the issuer side.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{JwkSet, PublicKeyUse};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use url::Url;

use crate::services::verifier::VerificationError;

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("jwks request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("jwks endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid jwks document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Where the key set comes from.
#[async_trait]
pub trait JwksFetcher: Send + Sync {
    // Human readable source (for logging).
    fn source(&self) -> &str;

    async fn fetch(&self) -> Result<JwkSet, JwksError>;
}

/// Fetches the key set from the issuer's JWKS endpoint.
#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    client: reqwest::Client,
    uri: Url,
}

impl HttpJwksFetcher {
    pub fn new(uri: Url, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, uri })
    }
}

#[async_trait]
impl JwksFetcher for HttpJwksFetcher {
    fn source(&self) -> &str {
        self.uri.as_str()
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let response = self.client.get(self.uri.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// A pinned key set (configured inline, never refetched from the network).
#[derive(Debug, Clone)]
pub struct StaticJwksFetcher {
    keys: JwkSet,
}

impl StaticJwksFetcher {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    pub fn from_json(document: &str) -> Result<Self, JwksError> {
        Ok(Self::new(serde_json::from_str(document)?))
    }
}

#[async_trait]
impl JwksFetcher for StaticJwksFetcher {
    fn source(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        Ok(self.keys.clone())
    }
}

/// Outcome of the most recent fetch attempt, successful or not.
#[derive(Default)]
struct RefreshState {
    last_attempt: Option<Instant>,
    last_error: Option<String>,
}

/// Process-wide key cache, safe to share between concurrent requests.
///
/// Lookups of cached keys only take the `keys` read lock. Refetches are serialized by the
/// `refresh` mutex and run without holding `keys`, which is write-locked just long enough
/// to swap in the new map.
pub struct JwksCache {
    fetcher: Arc<dyn JwksFetcher>,
    refresh_cooldown: Duration,
    keys: RwLock<HashMap<String, DecodingKey>>,
    refresh: Mutex<RefreshState>,
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("source", &self.fetcher.source())
            .field("refresh_cooldown", &self.refresh_cooldown)
            .finish()
    }
}

impl JwksCache {
    pub fn new(fetcher: Arc<dyn JwksFetcher>, refresh_cooldown: Duration) -> Self {
        Self {
            fetcher,
            refresh_cooldown,
            keys: RwLock::new(HashMap::new()),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Fetch the key set now. Returns the number of usable keys.
    pub async fn hydrate(&self) -> Result<usize, JwksError> {
        let mut refresh = self.refresh.lock().await;
        self.fetch_keys(&mut refresh).await
    }

    /// Look up the verification key for `kid`.
    ///
    /// - unknown `kid` after a refetch → `Rejected`
    /// - key set could not be fetched → `Unavailable`
    ///
    /// At most one fetch is attempted per refresh cooldown, whether it succeeds or fails.
    /// Within the cooldown the last outcome is reused.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerificationError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let mut refresh = self.refresh.lock().await;

        // Another task may have refreshed while we waited for the refresh lock.
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let cooling_down = refresh
            .last_attempt
            .is_some_and(|at| at.elapsed() < self.refresh_cooldown);

        if cooling_down {
            if let Some(err) = &refresh.last_error {
                return Err(VerificationError::Unavailable(err.clone()));
            }
        } else {
            self.fetch_keys(&mut refresh).await.map_err(|err| {
                tracing::error!(error = %err, source = self.fetcher.source(), "jwks fetch failed");
                VerificationError::Unavailable(err.to_string())
            })?;
        }
        drop(refresh);

        self.cached(kid)
            .await
            .ok_or_else(|| VerificationError::rejected(format!("unknown signing key id '{kid}'")))
    }

    async fn cached(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.read().await.get(kid).cloned()
    }

    async fn fetch_keys(&self, refresh: &mut RefreshState) -> Result<usize, JwksError> {
        refresh.last_attempt = Some(Instant::now());

        let set = match self.fetcher.fetch().await {
            Ok(set) => set,
            Err(err) => {
                refresh.last_error = Some(err.to_string());
                return Err(err);
            }
        };
        refresh.last_error = None;

        let fresh = decoding_keys(&set);
        let count = fresh.len();
        *self.keys.write().await = fresh;

        tracing::debug!(source = self.fetcher.source(), keys = count, "jwks refreshed");
        Ok(count)
    }
}

fn decoding_keys(set: &JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::with_capacity(set.keys.len());

    for jwk in &set.keys {
        let Some(kid) = jwk.common.key_id.as_deref() else {
            tracing::warn!("skipping jwk without 'kid'");
            continue;
        };

        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            continue;
        }

        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid.to_string(), key);
            }
            Err(err) => tracing::warn!(kid = %kid, error = %err, "skipping unusable jwk"),
        }
    }

    keys
}
