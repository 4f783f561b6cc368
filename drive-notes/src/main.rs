//! Drive Notes Service: plain-text notes kept in a Google Drive folder.
//!
//! Serves raw note routes plus a workspace API (open buffers, pins,
//! archive, categories) backed by the `_SYSTEM_MASTER.txt` config file.
//!
//! Default: http://127.0.0.1:9110/

mod config;
mod controller;
mod drive_client;
mod master_config;
mod routes;
mod store;
mod view;
mod workspace;

use config::{Config, StorageBackend};
use drive_client::DriveClient;
use routes::AppState;
use std::sync::Arc;
use store::{MemoryStore, NoteStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store: Arc<dyn NoteStore> = match config.storage {
        StorageBackend::Memory => {
            log::info!("Using in-memory note storage (nothing is persisted)");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Drive => match config.drive_credentials() {
            Ok(credentials) => {
                match &config.folder_id {
                    Some(folder) => log::info!("[DRIVE] Using folder {}", folder),
                    None => log::warn!("[DRIVE] No folder configured, listing the whole drive"),
                }
                Arc::new(DriveClient::new(credentials, config.folder_id.clone()))
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
    };

    let state = Arc::new(AppState::new(store));

    // A failed first load is not fatal; clients can retry via /api/workspace/refresh
    if let Err(e) = state.controller.refresh().await {
        log::error!("Initial workspace load failed: {}", e);
    }

    let cors = tower_http::cors::CorsLayer::permissive();
    let app = routes::router(state).layer(cors);

    let addr = config.bind_addr();
    log::info!("Drive Notes Service listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
