use crate::auth::password::WorkFactor;
use argon2::password_hash::PasswordHash;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Minimum signing secret length in bytes.
pub const MIN_TOKEN_SECRET_BYTES: usize = 32;

/// Deployment mode. Anything not explicitly development is treated as production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl std::str::FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(format!("expected development or production, got {}", s)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub app_env: AppEnv,

    // Server
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,

    // Credential store
    pub redis_url: String,

    // Session tokens
    pub token_secret: Zeroizing<Vec<u8>>,
    /// True when no secret was configured and a per-process key was generated.
    pub token_secret_ephemeral: bool,
    pub token_ttl_secs: u64,

    // Password hashing
    pub work_factor: WorkFactor,

    // Startup provisioning
    pub admin_identifier: Option<String>,
    pub admin_password_hash: Option<String>,

    // Rate limiting
    pub rate_limit_login_per_min: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("bind_addr", &self.bind_addr)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("static_dir", &self.static_dir)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("redis_url", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("token_secret_ephemeral", &self.token_secret_ephemeral)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("work_factor", &self.work_factor)
            .field("admin_identifier", &self.admin_identifier)
            .field(
                "admin_password_hash",
                &self.admin_password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rate_limit_login_per_min", &self.rate_limit_login_per_min)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Outside development a missing or short `TOKEN_SECRET` and a work factor
    /// below the Argon2id floor are fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        let app_env = parse_env_or_default("APP_ENV", AppEnv::Production)?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let static_dir = env::var("STATIC_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;

        // Redis - required, it is the only credential store
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Session tokens
        let (token_secret, token_secret_ephemeral) = load_token_secret(app_env)?;

        let token_ttl_secs = parse_env_or_default("TOKEN_TTL_SECS", 86_400)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Password hashing
        let work_factor = work_factor_from_env()?;
        if app_env != AppEnv::Development && !work_factor.meets_floor() {
            return Err(ConfigError::InvalidValue(
                "ARGON2_MEMORY_KIB/ARGON2_ITERATIONS".to_string(),
                format!(
                    "below the production floor (m={}, t={})",
                    crate::auth::password::MIN_MEMORY_KIB,
                    crate::auth::password::MIN_ITERATIONS
                ),
            ));
        }

        // Startup provisioning - both or neither
        let admin_identifier = env::var("ADMIN_IDENTIFIER").ok().filter(|s| !s.is_empty());
        let admin_password_hash = env::var("ADMIN_PASSWORD_HASH").ok().filter(|s| !s.is_empty());
        match (&admin_identifier, &admin_password_hash) {
            (Some(identifier), Some(hash)) => {
                validate_identifier(identifier)
                    .map_err(|e| ConfigError::InvalidValue("ADMIN_IDENTIFIER".to_string(), e))?;
                validate_admin_hash(hash, app_env, &work_factor).map_err(|e| {
                    ConfigError::InvalidValue("ADMIN_PASSWORD_HASH".to_string(), e)
                })?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ConfigError::MissingVar("ADMIN_PASSWORD_HASH".to_string()))
            }
            (None, Some(_)) => return Err(ConfigError::MissingVar("ADMIN_IDENTIFIER".to_string())),
        }

        // Rate limiting
        let rate_limit_login_per_min = parse_env_or_default("RATE_LIMIT_LOGIN_PER_MIN", 5)?;

        Ok(Config {
            app_env,
            bind_addr,
            cors_allowed_origins,
            static_dir,
            max_body_bytes,
            redis_url,
            token_secret,
            token_secret_ephemeral,
            token_ttl_secs,
            work_factor,
            admin_identifier,
            admin_password_hash,
            rate_limit_login_per_min,
        })
    }
}

/// Read `TOKEN_SECRET`. There is no built-in fallback value.
fn load_token_secret(app_env: AppEnv) -> Result<(Zeroizing<Vec<u8>>, bool), ConfigError> {
    match env::var("TOKEN_SECRET").ok().filter(|s| !s.is_empty()) {
        Some(secret) => {
            let secret = Zeroizing::new(secret.into_bytes());
            if secret.len() < MIN_TOKEN_SECRET_BYTES {
                return Err(ConfigError::InvalidValue(
                    "TOKEN_SECRET".to_string(),
                    format!("must be at least {} bytes", MIN_TOKEN_SECRET_BYTES),
                ));
            }
            Ok((secret, false))
        }
        None if app_env == AppEnv::Development => {
            let mut key = Zeroizing::new(vec![0u8; MIN_TOKEN_SECRET_BYTES]);
            rand::fill(key.as_mut_slice());
            Ok((key, true))
        }
        None => Err(ConfigError::MissingVar("TOKEN_SECRET".to_string())),
    }
}

/// Argon2 cost from `ARGON2_*`, validated by argon2 itself.
///
/// Split out so the `hash-password` command can run without the rest of the config.
pub fn work_factor_from_env() -> Result<WorkFactor, ConfigError> {
    let _ = dotenvy::dotenv();

    let defaults = WorkFactor::default();
    let work_factor = WorkFactor {
        memory_kib: parse_env_or_default("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
        iterations: parse_env_or_default("ARGON2_ITERATIONS", defaults.iterations)?,
        parallelism: parse_env_or_default("ARGON2_PARALLELISM", defaults.parallelism)?,
    };

    work_factor.params().map_err(|e| {
        ConfigError::InvalidValue("ARGON2_*".to_string(), e.to_string())
    })?;

    Ok(work_factor)
}

/// Check a provisioned PHC string before it reaches the store.
///
/// Outside development the hash must be Argon2id at or above the floor and
/// carry the configured work factor, so unknown identifiers (verified
/// against a decoy built from `work_factor`) cost the same as known ones.
fn validate_admin_hash(hash: &str, app_env: AppEnv, work_factor: &WorkFactor) -> Result<(), String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("not a PHC hash string: {}", e))?;
    if app_env == AppEnv::Development {
        return Ok(());
    }

    let stored = WorkFactor::from_phc(&parsed)?;
    if !stored.meets_floor() {
        return Err(format!(
            "hash cost m={},t={} is below the production floor (m={}, t={})",
            stored.memory_kib,
            stored.iterations,
            crate::auth::password::MIN_MEMORY_KIB,
            crate::auth::password::MIN_ITERATIONS
        ));
    }
    if stored != *work_factor {
        return Err(format!(
            "hash cost m={},t={},p={} differs from ARGON2_* (m={},t={},p={}); re-hash with hash-password",
            stored.memory_kib,
            stored.iterations,
            stored.parallelism,
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism
        ));
    }
    Ok(())
}

/// Admin identifiers: 2-254 chars, alphanumeric plus `-`, `_`, `.`, `@`.
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.len() < 2 || identifier.len() > 254 {
        return Err("must be 2-254 characters".to_string());
    }
    if !identifier
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    {
        return Err(
            "may only contain alphanumeric characters, hyphens, underscores, dots and @"
                .to_string(),
        );
    }
    Ok(())
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
