use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use family_budget_sync::api::local::LocalApi;
use family_budget_sync::api::SessionContext;
use family_budget_sync::db;
use family_budget_sync::services::projection_service::ProjectionCache;
use family_budget_sync::services::sync_service::SyncEngine;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("family_budget_sync=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("Starting family budget sync runner...");

    let server_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:budget.db".to_string());
    let queue_url =
        std::env::var("QUEUE_DATABASE_URL").unwrap_or_else(|_| "sqlite:queue.db".to_string());
    let user_id = std::env::var("SYNC_USER_ID").unwrap_or_else(|_| "local-user".to_string());

    info!("Opening authoritative store at {}", server_url);
    let server_pool = match db::init_server_db(&server_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open authoritative store: {}", e);
            return;
        }
    };

    info!("Opening local queue at {}", queue_url);
    let queue_pool = match db::init_queue_db(&queue_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open local queue: {}", e);
            return;
        }
    };

    let api = Arc::new(LocalApi::new(server_pool));
    let engine = SyncEngine::new(
        queue_pool,
        api.clone(),
        api,
        Arc::new(AsyncMutex::new(ProjectionCache::new())),
    );
    let session = SessionContext::new(&user_id, "");

    match engine.drain(&session).await {
        Ok(report) => info!(
            synced = report.synced,
            remaining = report.remaining,
            "sync pass complete"
        ),
        Err(e) => error!("sync pass failed: {}", e),
    }
}
