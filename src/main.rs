//! turnstile application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Select a session store (Redis when configured, in-memory otherwise)
//! 3. Build the authentication gate from the route rules
//! 4. Build router with greeting + login routes
//! 5. Apply gate and security headers middleware
//! 6. Start Axum server
//!
//! Also supports a `hashpw` subcommand for generating the Argon2 hash
//! `FORM_PASSWORD_HASH` expects.

use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use turnstile::{
    auth::{FormLogin, OAuth2Login},
    config::Config,
    gate::{middleware::AppState, Gate},
    middleware::security_headers,
    routes,
    storage::{memory::MemorySessionStore, redis::RedisSessionStore, SessionStore},
};

fn print_hashpw_usage() {
    eprintln!("Usage: turnstile hashpw <password>");
    eprintln!();
    eprintln!("Generate an Argon2id hash for FORM_PASSWORD_HASH.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  turnstile hashpw mysecretpassword");
    eprintln!();
    eprintln!("Then set in .env:");
    eprintln!("  FORM_USER=admin");
    eprintln!("  FORM_PASSWORD_HASH=<output>");
}

#[tokio::main]
async fn main() {
    // Check for hashpw subcommand
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "hashpw" {
        if args.len() != 3 {
            print_hashpw_usage();
            std::process::exit(1);
        }

        match turnstile::auth::form::hash_password(&args[2]) {
            Ok(hash) => {
                println!("{}", hash);
            }
            Err(e) => {
                eprintln!("Error hashing password: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting turnstile on {}", config.bind_addr);

    // Select the session store backend
    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Invalid Redis URL");

            // Verify Redis connection before serving traffic
            client
                .get_multiplexed_async_connection()
                .await
                .expect("Failed to connect to Redis");

            tracing::info!("Using Redis session store");
            Arc::new(RedisSessionStore::new(client))
        }
        None => {
            tracing::info!("Using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
    };

    // Build the gate from the immutable rule set
    let gate = Arc::new(Gate::new(
        config.rules.clone(),
        store.clone(),
        config.login_path.clone(),
        Duration::from_millis(config.session_lookup_timeout_ms),
    ));

    // Login flow adapters
    let form = config
        .form
        .as_ref()
        .map(|f| {
            tracing::info!(username = %f.username, "Form login enabled");
            Arc::new(FormLogin::new(
                f.username.clone(),
                f.password_hash.clone(),
                config.session_ttl_secs,
            ))
        });
    let oauth = config.oauth.as_ref().map(|o| {
        tracing::info!(client_id = %o.client_id, "OAuth2 login enabled");
        Arc::new(OAuth2Login::new(o.clone(), config.session_ttl_secs))
    });

    // Build shared state
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        gate,
        form,
        oauth,
    };

    // Build router:
    // - application + login routes
    // - gate middleware (innermost, runs before any handler)
    // - security headers middleware
    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    let cors = CorsLayer::new();

    let app = routes::router(&config)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            turnstile::gate::middleware::route_gate,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start server
    axum::serve(listener, app).await.expect("Server error");
}
