// Social feed HTTP server

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use social_feed::{
    app_state::AppState, config::Config, data_seeder::seed_sample_data,
    http_interface::create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if config.seed_sample_data {
        seed_sample_data(app_state.database.pool(), &app_state.follows, 5, 3).await?;
    }

    let app = create_router(app_state).layer(CorsLayer::permissive());

    // Start server
    let addr = config.server_address();
    tracing::info!(%addr, database = %config.database.url, "social feed server starting");
    tracing::info!("  POST   /follow             - Request to follow a user");
    tracing::info!("  PATCH  /follow             - Accept a follow request");
    tracing::info!("  DELETE /follow/{{user_id}}   - Remove a follow");
    tracing::info!("  GET    /follow             - Look up follow edges");
    tracing::info!("  GET    /feed               - Assemble the viewer's feed");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
