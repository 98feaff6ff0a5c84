pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod jwt;
pub mod password;

use api::create_api_router;
use auth::AuthService;
use axum::Router;
use config::SecretStore;
use db::Database;
use jwt::TokenSigner;
use password::PasswordHasher;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing secrets and token lifetimes
    pub secrets: SecretStore,
    /// bcrypt cost for passwords and refresh fingerprints
    pub hash_cost: u32,
}

/// Build the authentication service for a configuration.
pub fn create_auth_service(config: &ServerConfig) -> AuthService {
    let signer = Arc::new(TokenSigner::new(&config.secrets));
    AuthService::new(
        config.db.clone(),
        signer,
        PasswordHasher::new(config.hash_cost),
    )
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let service = create_auth_service(config);
    let signer = service.signer().clone();

    Router::new().nest("/api", create_api_router(service, signer))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
