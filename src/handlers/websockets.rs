use axum::extract::ws::{Message, WebSocket};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::lobby::{Connection, GameServer};
use crate::models::{ClientEvent, ServerEvent};

pub struct WebSockets {}

impl WebSockets {
    /// Drives one client socket until it closes, then releases the player.
    pub async fn new(ws: WebSocket, server: GameServer) {
        let (sender, receiver) = ws.split();
        let (outbox, inbox) = mpsc::unbounded_channel::<ServerEvent>();

        let send_task = Self::spawn_sender_task(inbox, sender);
        let mut conn = Connection::new(outbox);
        info!(connection = %conn.id, "websocket connected");

        Self::receive_messages(receiver, &server, &mut conn).await;

        server.disconnect(&mut conn).await;
        send_task.abort();
        info!(connection = %conn.id, "websocket closed");
    }

    fn spawn_sender_task(
        mut inbox: UnboundedReceiver<ServerEvent>,
        mut sender: SplitSink<WebSocket, Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = inbox.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!("failed to encode event: {error}");
                        continue;
                    }
                };
                if let Err(error) = sender.send(Message::Text(text)).await {
                    debug!("failed to send message: {error}");
                    break;
                }
            }
        })
    }

    async fn receive_messages(
        mut receiver: SplitStream<WebSocket>,
        server: &GameServer,
        conn: &mut Connection,
    ) {
        while let Some(message) = receiver.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(error) => {
                    debug!(connection = %conn.id, "websocket error: {error}");
                    break;
                }
            };
            match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => server.dispatch(conn, event).await,
                Err(error) => warn!(connection = %conn.id, "failed to parse client event: {error}"),
            }
        }
    }
}
