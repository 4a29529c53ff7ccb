/*
 * Responsibility
 * - 環境変数の読み込み (PORT, CORS, Auth0 domain / audience / algorithms など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - AuthConfig は gate (resolver / verifier) の構築時にそのまま渡す
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything the authorization gate needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Expected `iss`, e.g. `https://dev-xxxx.us.auth0.com/`.
    pub issuer: String,
    /// Expected `aud`.
    pub audience: String,
    pub jwks_url: Url,
    /// Allow-list for the token's `alg`. RSA family only.
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
    pub jwks_timeout: Duration,
    /// `Duration::ZERO` disables the key-set cache.
    pub jwks_cache_ttl: Duration,
}

impl AuthConfig {
    /// Issuer and key-set URL as published by an Auth0 tenant.
    pub fn auth0_endpoints(domain: &str) -> Result<(String, Url), ConfigError> {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        if domain.is_empty() {
            return Err(ConfigError::Invalid("AUTH0_DOMAIN"));
        }

        let issuer = format!("https://{}/", domain);
        let jwks_url = Url::parse(&format!("{}.well-known/jwks.json", issuer))
            .map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))?;

        Ok((issuer, jwks_url))
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let derived = match std::env::var("AUTH0_DOMAIN") {
            Ok(domain) => Some(Self::auth0_endpoints(&domain)?),
            Err(_) => None,
        };

        let issuer = match (std::env::var("AUTH_ISSUER"), &derived) {
            (Ok(issuer), _) => issuer,
            (Err(_), Some((issuer, _))) => issuer.clone(),
            (Err(_), None) => return Err(ConfigError::Missing("AUTH0_DOMAIN or AUTH_ISSUER")),
        };

        let jwks_url = match (std::env::var("AUTH_JWKS_URL"), &derived) {
            (Ok(url), _) => Url::parse(&url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            (Err(_), Some((_, url))) => url.clone(),
            (Err(_), None) => return Err(ConfigError::Missing("AUTH0_DOMAIN or AUTH_JWKS_URL")),
        };

        let audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let algorithms = parse_algorithms(
            &std::env::var("AUTH_ALGORITHMS").unwrap_or_else(|_| "RS256".to_string()),
        )?;

        let leeway_seconds = env_u64("AUTH_LEEWAY_SECONDS", 0)?;

        let jwks_timeout = Duration::from_millis(env_u64("JWKS_TIMEOUT_MS", 5000)?);
        if jwks_timeout.is_zero() {
            return Err(ConfigError::Invalid("JWKS_TIMEOUT_MS"));
        }

        let jwks_cache_ttl = Duration::from_secs(env_u64("JWKS_CACHE_TTL_SECONDS", 0)?);

        Ok(Self {
            issuer,
            audience,
            jwks_url,
            algorithms,
            leeway_seconds,
            jwks_timeout,
            jwks_cache_ttl,
        })
    }
}

fn env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_u64(key, std::env::var(key).ok().as_deref(), default)
}

/// Unset (or blank) falls back to `default`; anything else must be a plain integer.
fn parse_u64(key: &'static str, value: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid(key)),
    }
}

/// Parses a comma-separated allow-list. Only RSA algorithms are accepted since
/// keys are resolved as RSA modulus/exponent pairs.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        if !matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ) {
            return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }

    Ok(algorithms)
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub http: HttpConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            request_timeout: std::env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            body_limit_bytes: std::env::var("HTTP_BODY_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.body_limit_bytes),
        };

        let auth = AuthConfig::from_env()?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            http,
            auth,
        })
    }
}
