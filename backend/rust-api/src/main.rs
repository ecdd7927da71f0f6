use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use city_events_api::config::{Config, LogFormat};
use city_events_api::services::{EventService, OpenAgendaClient, PgEventStore};
use city_events_api::{database, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "city_events_api=debug,tower_http=debug".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }

    info!("Starting City Events API server...");

    let db_pool = database::new_pool(&config.database_url, config.database_max_connections).await?;
    info!("Database connection pool created");
    database::run_migrations(&db_pool).await?;

    let feed = OpenAgendaClient::new(&config.openagenda, config.feed_timeout())?;
    if feed.is_configured() {
        info!("OpenAgenda feed enabled for agenda {}", config.openagenda.agenda_uid);
    } else {
        info!("OPENAGENDA_AGENDA_UID not set, serving local events only");
    }
    let store = PgEventStore::new(db_pool.clone());

    let app_state = AppState {
        config: config.clone(),
        events: Arc::new(EventService::new(Arc::new(feed), Arc::new(store))),
    };
    let app = routes::build_router(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutting down gracefully...");
            db_pool.close().await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
