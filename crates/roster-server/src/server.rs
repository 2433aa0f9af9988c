//! Application state, router assembly, and the serve loop.
//!
//! Startup is two-phase: [`init`] builds and verifies every process-wide
//! singleton (key set fetch included) and fails before the listener is
//! bound if any of them cannot be built; [`run`] only binds and serves a
//! fully initialized state.

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use url::Url;

use roster_auth::{
    AuthState, CognitoClient, FetchConfig, KeyResolver, TokenVerifier, VerifierConfig,
};
use roster_store::UserStore;

use crate::config::AppConfig;
use crate::handlers;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Verifier state for the Bearer token extractor.
    pub auth: AuthState,

    /// The record store. One instance per process; handlers share it.
    pub store: Arc<UserStore>,

    /// Client for the Cognito login flow.
    pub login: Arc<CognitoClient>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Builds the process-wide singletons from the configuration.
///
/// The JWKS fetch happens here, before any listener exists; the service
/// must not accept connections it cannot verify tokens for.
///
/// A missing or unreadable record file is only a warning at this point —
/// the store stays uninitialized and retries the load when an operation
/// first needs the records.
///
/// # Errors
///
/// Returns an error if the JWKS URL is unusable, the key set cannot be
/// fetched, or the login client cannot be built.
pub async fn init(config: &AppConfig) -> anyhow::Result<AppState> {
    let jwks_url = Url::parse(&config.cognito.jwks_url())?;
    let resolver = KeyResolver::fetch(&jwks_url, &FetchConfig::default()).await?;
    tracing::info!(url = %jwks_url, keys = resolver.len(), "signing key set fetched");

    let verifier = TokenVerifier::new(VerifierConfig::from(&config.cognito), resolver);
    let login = CognitoClient::new(&config.cognito)?;

    let store = Arc::new(UserStore::new(config.store.data_file.clone()));
    match store.load_all().await {
        Ok(records) => {
            tracing::info!(count = records.len(), "record store hydrated");
        }
        Err(e) => {
            tracing::warn!(
                path = %config.store.data_file.display(),
                error = %e,
                "record store not hydrated; operations will retry the load"
            );
        }
    }

    Ok(AppState {
        auth: AuthState::new(Arc::new(verifier)),
        store,
        login: Arc::new(login),
    })
}

/// Assembles the router over the given state.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/login", post(handlers::login))
        // Protected routes; the BearerAuth extractor gates each handler.
        .route("/profile", get(handlers::profile))
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until a shutdown signal.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server loop
/// fails.
pub async fn run(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_app(state);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
