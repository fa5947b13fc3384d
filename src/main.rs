//! lotgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis
//! 3. Upsert the provisioned admin credential, if configured
//! 4. Build router with API routes + optional static SPA serving
//! 5. Apply CORS and security headers middleware
//! 6. Start Axum server
//!
//! Also supports `hash-password` for producing `ADMIN_PASSWORD_HASH` values.

use lotgate::{
    auth::{AppState, SecretHasher, TokenService},
    config::{self, AppEnv, Config},
    middleware::{cors_layer, security_headers},
    models::Role,
    routes,
    storage::{self, AttemptLimiter, RedisAttemptLimiter, RedisCredentialStore},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use zeroize::Zeroizing;

fn hash_password(secret: &str) -> Result<String, String> {
    let work_factor = config::work_factor_from_env().map_err(|e| e.to_string())?;
    let hasher = SecretHasher::new(work_factor).map_err(|e| e.to_string())?;
    hasher.hash(secret).map_err(|e| e.to_string())
}

fn print_hash_password_usage() {
    eprintln!("Usage: lotgate hash-password <secret>");
    eprintln!();
    eprintln!("Hash an admin secret with Argon2id using ARGON2_* from the environment.");
    eprintln!();
    eprintln!("Then set in .env:");
    eprintln!("  ADMIN_IDENTIFIER=admin");
    eprintln!("  ADMIN_PASSWORD_HASH='<output>'");
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "hash-password" {
        if args.len() != 3 {
            print_hash_password_usage();
            std::process::exit(1);
        }
        let secret = Zeroizing::new(args[2].clone());

        match hash_password(&secret) {
            Ok(hash) => println!("{}", hash),
            Err(e) => {
                eprintln!("Error hashing secret: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(bind_addr = %config.bind_addr, app_env = ?config.app_env, "Starting lotgate");

    if config.token_secret_ephemeral {
        tracing::warn!("TOKEN_SECRET not set; using a random per-process key, sessions end on restart");
    }
    if config.app_env == AppEnv::Development && !config.work_factor.meets_floor() {
        tracing::warn!(work_factor = ?config.work_factor, "Argon2 work factor is below the production floor");
    }

    let redis_client = redis::Client::open(config.redis_url.as_str()).expect("Invalid Redis URL");

    // Verify Redis connection
    let mut con = redis_client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");

    if let (Some(identifier), Some(hash)) = (&config.admin_identifier, &config.admin_password_hash)
    {
        storage::credential::upsert_admin(&mut con, identifier, hash, Role::Admin)
            .await
            .expect("Failed to upsert admin credential");
        tracing::info!(identifier = %identifier, "Admin credential provisioned");
    }

    let hasher = SecretHasher::new(config.work_factor).expect("Failed to build password hasher");
    let tokens = TokenService::new(&config.token_secret, config.token_ttl_secs)
        .expect("Failed to build token service");

    let limiter: Option<Arc<dyn AttemptLimiter>> = if config.rate_limit_login_per_min > 0 {
        Some(Arc::new(RedisAttemptLimiter::new(redis_client.clone())))
    } else {
        tracing::warn!("Login rate limiting disabled");
        None
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(RedisCredentialStore::new(redis_client)),
        limiter,
        tokens: Arc::new(tokens),
        hasher: Arc::new(hasher),
    };

    let mut app = routes::api_router(state);
    if let Some(dir) = &config.static_dir {
        tracing::info!(static_dir = %dir.display(), "Serving frontend");
        app = app.fallback_service(ServeDir::new(dir));
    }

    let app = app
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(axum::middleware::from_fn(security_headers));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    // with_connect_info feeds the per-IP login throttle
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
