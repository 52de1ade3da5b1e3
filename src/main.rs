// Register the redirect URI in Google Cloud console, e.g.
// - Redirect_url: http://localhost:8080/google-callback
// Set .env file
// ```.env
// client_id="your_client_id"
// client_secret="your_client_secret"
// redirect_uri="http://localhost:8080/google-callback"
// ```
// finally ```cargo run```
use std::sync::Arc;

use google_login::{
    config::Config,
    handler::{AppState, router},
    session::MemoryStore,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let addr = config.bind_addr();

    let state = AppState::new(config, Arc::new(MemoryStore::new()));
    let app = router(state)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    anyhow::Ok(())
}
