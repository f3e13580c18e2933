/// Factory: build the process-wide `CognitoJwtVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, JwksSource};
use crate::services::verifier::{
    CognitoJwtVerifier, HttpJwksFetcher, JwksCache, JwksError, JwksFetcher, StaticJwksFetcher,
};

pub fn build_verifier(config: &Config) -> Result<Arc<CognitoJwtVerifier>, JwksError> {
    let fetcher: Arc<dyn JwksFetcher> = match &config.jwks_source {
        JwksSource::Remote(uri) => Arc::new(HttpJwksFetcher::new(
            uri.clone(),
            config.jwks_fetch_timeout,
        )?),
        JwksSource::Pinned(document) => Arc::new(StaticJwksFetcher::from_json(document)?),
    };

    let jwks = JwksCache::new(fetcher, config.jwks_refresh_cooldown);

    Ok(Arc::new(CognitoJwtVerifier::new(
        config.cognito_settings(),
        jwks,
    )))
}
