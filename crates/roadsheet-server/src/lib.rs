pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod pdf;

use axum::{extract::FromRef, Router};
use roadsheet_core::Role;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::db::models::NewUser;
use crate::db::{Database, Store};
use crate::mail::Mailer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: SessionKeys,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let sessions = SessionKeys::new(
            &config.session_secret,
            config.session_ttl_hours,
            config.cookie_secure,
        );
        Self {
            store,
            mailer,
            sessions,
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Create the configured admin account if it does not exist yet
async fn ensure_admin(store: &dyn Store, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    if store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    store
        .create_user(NewUser {
            name: "Administrator".to_string(),
            email: email.clone(),
            password_hash: auth::hash_password(password)?,
            role: Role::Admin,
        })
        .await?;
    tracing::info!("Created admin account {}", email);

    Ok(())
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    // Initialize database
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    db.migrate().await?;

    ensure_admin(&db, &config).await?;

    let mailer = mail::from_config(&config);
    let addr = config.listen_addr();

    // Create application state
    let state = AppState::new(Arc::new(db), mailer, config);

    // Start the server
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
