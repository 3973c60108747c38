use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::{Html, IntoResponse},
};
use tracing::debug;

use crate::handlers::WebSockets;
use crate::lobby::GameServer;
use crate::render::Render;

const LEADERBOARD_SIZE: usize = 10;

pub struct Handle {}

impl Handle {
    pub async fn root() -> impl IntoResponse {
        Html(Render::root())
    }

    pub async fn leaderboard(State(server): State<GameServer>) -> impl IntoResponse {
        let entries = server.leaderboard(LEADERBOARD_SIZE).await;
        Html(Render::leaderboard(&entries))
    }

    pub async fn status(State(server): State<GameServer>) -> impl IntoResponse {
        let stats = server.stats().await;
        Html(Render::status(&stats))
    }

    pub async fn websocket(
        ws: WebSocketUpgrade,
        State(server): State<GameServer>,
    ) -> impl IntoResponse {
        debug!("websocket upgrade requested");
        ws.on_upgrade(|socket| async move { WebSockets::new(socket, server).await })
    }
}
