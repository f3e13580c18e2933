/*
 * Responsibility
 * - Load settings from environment variables (.env honored) once at startup
 * - Validate them (missing/invalid values fail the startup)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::services::verifier::{CognitoSettings, TokenUse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<String>) -> Result<Self, ConfigError> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(Self::Text),
            Some(v) if v.eq_ignore_ascii_case("text") => Ok(Self::Text),
            Some(v) if v.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(_) => Err(ConfigError::Invalid("LOG_FORMAT")),
        }
    }
}

/// Where the verifier gets its signing keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwksSource {
    Remote(Url),
    /// Inline JWKS document (pinned keys, no network).
    Pinned(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_format: LogFormat,
    /// Upper bound for one request; always above `jwks_fetch_timeout`.
    pub request_timeout: Duration,

    pub user_pool_id: String,
    pub region: String,
    pub client_ids: Vec<String>,
    pub token_use: TokenUse,
    pub jwks_source: JwksSource,

    pub token_leeway_seconds: u64,
    pub jwks_refresh_cooldown: Duration,
    pub jwks_fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(lookup("APP_ENV"));
        let log_format = LogFormat::parse(lookup("LOG_FORMAT"))?;

        let user_pool_id = lookup("COGNITO_USER_POOL_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("COGNITO_USER_POOL_ID"))?;

        // Pool ids look like `<region>_<suffix>`.
        let region = match lookup("COGNITO_REGION").filter(|v| !v.trim().is_empty()) {
            Some(region) => region.trim().to_string(),
            None => user_pool_id
                .split_once('_')
                .map(|(region, _)| region.to_string())
                .filter(|region| !region.is_empty())
                .ok_or(ConfigError::Invalid("COGNITO_USER_POOL_ID"))?,
        };

        let client_ids = accepted_client_ids(&lookup);
        if client_ids.is_empty() {
            return Err(ConfigError::Missing("COGNITO_APP_CLIENT_IDS"));
        }

        let token_use = match lookup("COGNITO_TOKEN_USE") {
            Some(v) => TokenUse::from_str(&v).map_err(|_| ConfigError::Invalid("COGNITO_TOKEN_USE"))?,
            None => TokenUse::Access,
        };

        let jwks_source = match (lookup("COGNITO_JWKS_JSON"), lookup("COGNITO_JWKS_URI")) {
            (Some(document), _) if !document.trim().is_empty() => JwksSource::Pinned(document),
            (_, Some(uri)) if !uri.trim().is_empty() => JwksSource::Remote(
                Url::parse(uri.trim()).map_err(|_| ConfigError::Invalid("COGNITO_JWKS_URI"))?,
            ),
            _ => JwksSource::Remote(
                Url::parse(&format!("{}/.well-known/jwks.json", issuer(&region, &user_pool_id)))
                    .map_err(|_| ConfigError::Invalid("COGNITO_USER_POOL_ID"))?,
            ),
        };

        let token_leeway_seconds = parse_or(&lookup, "TOKEN_LEEWAY_SECONDS", 0)?;
        let jwks_refresh_cooldown =
            Duration::from_secs(parse_or(&lookup, "JWKS_REFRESH_COOLDOWN_SECONDS", 10)?);
        let jwks_fetch_timeout =
            Duration::from_millis(parse_or(&lookup, "JWKS_FETCH_TIMEOUT_MS", 1500)?);
        let request_timeout =
            Duration::from_millis(parse_or(&lookup, "REQUEST_TIMEOUT_MS", 5000)?);
        // A key fetch must be able to finish inside the request that triggered it.
        if request_timeout <= jwks_fetch_timeout {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_MS"));
        }

        Ok(Self {
            addr,
            app_env,
            log_format,
            request_timeout,
            user_pool_id,
            region,
            client_ids,
            token_use,
            jwks_source,
            token_leeway_seconds,
            jwks_refresh_cooldown,
            jwks_fetch_timeout,
        })
    }

    pub fn issuer(&self) -> String {
        issuer(&self.region, &self.user_pool_id)
    }

    pub fn cognito_settings(&self) -> CognitoSettings {
        CognitoSettings {
            issuer: self.issuer(),
            client_ids: self.client_ids.clone(),
            token_use: self.token_use,
            leeway_seconds: self.token_leeway_seconds,
        }
    }
}

fn issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

/// Union of the comma-separated list and the per-population keys, in order, de-duplicated.
fn accepted_client_ids<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ids: Vec<String> = Vec::new();

    let listed = lookup("COGNITO_APP_CLIENT_IDS").unwrap_or_default();
    let named = ["COGNITO_APP_CLIENT_ID_LOGIN", "COGNITO_APP_CLIENT_ID_MACHINE"]
        .into_iter()
        .filter_map(|key| lookup(key));

    for id in listed
        .split(',')
        .map(|s| s.trim().to_string())
        .chain(named.map(|s| s.trim().to_string()))
    {
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }

    ids
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
