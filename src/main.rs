use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use birdspot::auth::{self, db as auth_db};
use birdspot::config::Config;
use birdspot::db::{self, LogOnError};
use birdspot::routes;
use birdspot::state::AppState;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "birdspot=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");

  {
    let conn = db::try_lock(&pool).expect("Database lock failed during startup");

    if let Some(count) = auth_db::cleanup_expired_sessions(&conn).log_warn("Failed to clean up expired sessions") {
      tracing::info!("Removed {} expired sessions", count);
    }

    if let Err(e) = db::species::seed_catalog(&conn, &config.species_catalog) {
      tracing::warn!("Species catalog not imported: {}", e);
    }
  }

  auth::prepare_dummy_hash();

  let app = routes::router(AppState::new(pool.clone(), &config), &config.static_dir);

  let bind_addr = config.bind_address();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config.port);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server failed to start");

  tracing::info!("Shutting down");
  db::close(pool);
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
}
