//! The coordinating service.
//!
//! All rooms, both match queues and the online-presence map live in one
//! [`Lobby`] behind a single async mutex; every client event and every timer
//! tick takes the lock, mutates, and releases it before any call into the
//! user store. A room can therefore vanish between a handler's lock and its
//! next one, and each re-lock looks the room up again.

mod lifecycle;
mod matchmaking;
mod rooms;
mod session;

use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::error::{AuthError, RequestError, RoomError};
use crate::models::{
    ClientEvent, LeaderboardEntry, MatchQueue, PlayerId, Presence, Rank, Room, RoomId,
    RoomSummary, ScoreEntry, SeatInfo, ServerEvent,
};
use crate::store::UserStore;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub type Outbox = UnboundedSender<ServerEvent>;

/// One client socket as the lobby sees it.
#[derive(Debug)]
pub struct Connection {
    pub id: Uuid,
    pub outbox: Outbox,
    pub player: Option<PlayerId>,
}

impl Connection {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbox,
            player: None,
        }
    }

    pub fn send(&self, event: ServerEvent) {
        if self.outbox.send(event).is_err() {
            debug!(connection = %self.id, "dropping event for closed connection");
        }
    }
}

#[derive(Debug)]
struct Session {
    connection: Uuid,
    outbox: Outbox,
    lp: u32,
}

/// Who is online, and where to reach them. At most one live handle per
/// account.
#[derive(Debug, Default)]
pub struct PresenceMap {
    sessions: HashMap<PlayerId, Session>,
}

impl PresenceMap {
    fn is_online(&self, player: &PlayerId) -> bool {
        self.sessions.contains_key(player)
    }

    fn is_current(&self, player: &PlayerId, connection: Uuid) -> bool {
        self.sessions
            .get(player)
            .is_some_and(|s| s.connection == connection)
    }

    fn insert(&mut self, player: PlayerId, session: Session) -> Option<Session> {
        self.sessions.insert(player, session)
    }

    /// Drops the session only if it still belongs to `connection`.
    fn release(&mut self, player: &PlayerId, connection: Uuid) -> bool {
        if !self.is_current(player, connection) {
            return false;
        }
        self.sessions.remove(player);
        true
    }

    fn lp(&self, player: &PlayerId) -> u32 {
        self.sessions.get(player).map_or(0, |s| s.lp)
    }

    fn set_lp(&mut self, player: &PlayerId, lp: u32) {
        if let Some(session) = self.sessions.get_mut(player) {
            session.lp = lp;
        }
    }

    fn send(&self, player: &PlayerId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(player) {
            if session.outbox.send(event).is_err() {
                debug!(%player, "dropping event for closed connection");
            }
        }
    }

    /// Everyone still seated in `room`, quitters excluded.
    fn to_room(&self, room: &Room, event: ServerEvent) {
        for participant in room.humans() {
            if participant.presence != Presence::Quit {
                self.send(&participant.id, event.clone());
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for player in self.sessions.keys() {
            self.send(player, event.clone());
        }
    }
}

#[derive(Debug, Default)]
pub struct Lobby {
    rooms: HashMap<RoomId, Room>,
    ranked_queue: MatchQueue,
    quick_queue: MatchQueue,
    presence: PresenceMap,
}

impl Lobby {
    /// The one room a player is actively seated in, if any.
    fn active_room_of(&self, player: &PlayerId) -> Option<RoomId> {
        self.rooms
            .values()
            .find(|room| room.is_active_for(player))
            .map(|room| room.id.clone())
    }

    fn ensure_free(&self, player: &PlayerId) -> Result<(), RoomError> {
        match self.active_room_of(player) {
            Some(_) => Err(RoomError::AlreadyInRoom),
            None => Ok(()),
        }
    }

    fn leave_queues(&mut self, player: &PlayerId) -> bool {
        let ranked = self.ranked_queue.remove(player);
        let quick = self.quick_queue.remove(player);
        ranked || quick
    }

    fn room_list(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.is_listed())
            .filter_map(Room::summary)
            .collect();
        rooms.sort_by(|a, b| a.room_id.0.cmp(&b.room_id.0));
        rooms
    }

    fn broadcast_room_list(&self) {
        self.presence.broadcast(ServerEvent::RoomListUpdate {
            rooms: self.room_list(),
        });
    }
}

fn seats(room: &Room) -> Vec<SeatInfo> {
    room.participants()
        .iter()
        .map(|p| SeatInfo {
            username: p.id.clone(),
            lp: p.lp,
            rank: p.rank,
            ready: room.is_ready(&p.id),
            is_bot: p.is_bot(),
        })
        .collect()
}

fn scores(room: &Room) -> Vec<ScoreEntry> {
    room.participants()
        .iter()
        .map(|p| ScoreEntry {
            username: p.id.clone(),
            score: p.score,
        })
        .collect()
}

/// Counts for the status page and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyStats {
    pub rooms: usize,
    pub ranked_queue: usize,
    pub quick_queue: usize,
    pub online: usize,
}

#[derive(Clone)]
pub struct GameServer {
    lobby: Arc<Mutex<Lobby>>,
    store: Arc<dyn UserStore>,
    dictionary: Arc<Dictionary>,
    config: Arc<Config>,
}

impl GameServer {
    pub fn new(config: Config, dictionary: Dictionary, store: Arc<dyn UserStore>) -> Self {
        Self {
            lobby: Arc::new(Mutex::new(Lobby::default())),
            store,
            dictionary: Arc::new(dictionary),
            config: Arc::new(config),
        }
    }

    /// Routes one client event. Failures go back to the sender only.
    pub async fn dispatch(&self, conn: &mut Connection, event: ClientEvent) {
        // a newer reconnect may have taken over this account
        if let Some(player) = conn.player.clone() {
            let current = self.lobby.lock().await.presence.is_current(&player, conn.id);
            if !current {
                conn.player = None;
            }
        }

        let result: Result<(), RequestError> = match event {
            ClientEvent::Register(credentials) => self.register(conn, credentials).await,
            ClientEvent::Login(credentials) => self.login(conn, credentials).await,
            ClientEvent::ReconnectUser(credentials) => self.reconnect(conn, credentials).await,
            ClientEvent::Logout {} => {
                self.disconnect(conn).await;
                Ok(())
            }
            ClientEvent::SendChat { message } => self.chat(conn, &message).await,
            ClientEvent::GetLeaderboard {} => {
                let entries = self.leaderboard(10).await;
                conn.send(ServerEvent::UpdateLeaderboard { entries });
                Ok(())
            }
            ClientEvent::FindMatch {} => self.find_match(conn).await,
            ClientEvent::QuickMatch {} => self.quick_match(conn).await,
            ClientEvent::CancelMatch {} => self.cancel_match(conn).await,
            ClientEvent::LeaveWaitingRoom { room_id } => {
                self.leave_waiting_room(conn, &room_id).await
            }
            ClientEvent::ReadyRanked { room_id } => self.ready_ranked(conn, &room_id).await,
            ClientEvent::GetRoomList {} => {
                let rooms = self.lobby.lock().await.room_list();
                conn.send(ServerEvent::RoomListUpdate { rooms });
                Ok(())
            }
            ClientEvent::CreateRoom { password } => self.create_room(conn, password).await,
            ClientEvent::JoinRoom { room_id, password } => {
                self.join_room(conn, &room_id, password.as_deref()).await
            }
            ClientEvent::StartCustomGame { room_id } => {
                self.start_custom_game(conn, &room_id).await
            }
            ClientEvent::StartAiMatch {} => self.start_ai_match(conn).await,
            ClientEvent::SubmitWord { room_id, word } => {
                self.submit_word(conn, &room_id, &word).await
            }
            ClientEvent::QuitMatch { room_id } => self.quit_match(conn, &room_id).await,
        };

        if let Err(error) = result {
            debug!(connection = %conn.id, %error, "request rejected");
            conn.send(match error {
                RequestError::Auth(e) => ServerEvent::AuthError {
                    message: e.to_string(),
                },
                RequestError::Room(e) => ServerEvent::RoomError {
                    message: e.to_string(),
                },
            });
        }
    }

    pub async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        match self.store.top_by_rating(limit).await {
            Ok(users) => users
                .into_iter()
                .map(|user| LeaderboardEntry {
                    rank: Rank::for_rating(user.lp),
                    lp: user.lp,
                    username: user.username,
                })
                .collect(),
            Err(e) => {
                warn!("leaderboard unavailable: {e}");
                Vec::new()
            }
        }
    }

    pub async fn stats(&self) -> LobbyStats {
        let lobby = self.lobby.lock().await;
        LobbyStats {
            rooms: lobby.rooms.len(),
            ranked_queue: lobby.ranked_queue.len(),
            quick_queue: lobby.quick_queue.len(),
            online: lobby.presence.sessions.len(),
        }
    }

    fn require_player(conn: &Connection) -> Result<PlayerId, RoomError> {
        conn.player.clone().ok_or(RoomError::NotAuthenticated)
    }

    fn require_login(conn: &Connection) -> Result<PlayerId, AuthError> {
        conn.player.clone().ok_or(AuthError::NotAuthenticated)
    }
}
