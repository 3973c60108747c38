use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use word_rush::config::Config;
use word_rush::dictionary::Dictionary;
use word_rush::handlers::Handle;
use word_rush::lobby::GameServer;
use word_rush::store::{JsonUserStore, MemoryUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("word_rush=info,tower_http=info")),
        )
        .init();
    let config = Config::from_env();

    let dictionary = match Dictionary::new(&config.dictionary_path) {
        Ok(dictionary) => {
            info!(
                words = dictionary.len(),
                path = %config.dictionary_path.display(),
                "dictionary loaded"
            );
            dictionary
        }
        Err(e) => {
            warn!(
                path = %config.dictionary_path.display(),
                "dictionary unavailable, every word will be rejected: {e}"
            );
            Dictionary::default()
        }
    };

    let store: Arc<dyn UserStore> = match &config.user_store_path {
        Some(path) => Arc::new(JsonUserStore::open(path).await?),
        None => {
            warn!("USER_STORE_PATH not set, accounts live in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let bind_addr = config.bind_addr;
    let static_dir = config.static_dir.clone();
    let server = GameServer::new(config, dictionary, store);

    let app = Router::new()
        .route("/", get(Handle::root))
        .route("/leaderboard", get(Handle::leaderboard))
        .route("/status", get(Handle::status))
        .route("/ws", get(Handle::websocket))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(server);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
