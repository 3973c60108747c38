use super::{seats, Connection, GameServer, Session};
use crate::error::{AuthError, PersistenceError, RequestError};
use crate::models::{
    apply_delta, Credentials, PlayerId, Profile, Rank, RoomCategory, RoomStatus, ServerEvent,
    BOT_PREFIX,
};
use crate::store::{RatingUpdate, UserRecord};
use tracing::{info, warn};

const MAX_CHAT_LEN: usize = 200;

fn validate(credentials: &Credentials) -> Result<(), AuthError> {
    let name = &credentials.username;
    let valid_name = (3..=16).contains(&name.chars().count())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.to_ascii_uppercase().starts_with(BOT_PREFIX);
    if !valid_name {
        return Err(AuthError::InvalidUsername);
    }
    if credentials.password.chars().count() < 4 {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

impl GameServer {
    pub(super) async fn register(
        &self,
        conn: &mut Connection,
        credentials: Credentials,
    ) -> Result<(), RequestError> {
        if conn.player.is_some() {
            return Err(AuthError::AlreadyOnline.into());
        }
        validate(&credentials)?;

        let record = UserRecord::new(&credentials.username, &credentials.password, 0);
        match self.store.create_user(record.clone()).await {
            Ok(()) => info!(player = %record.username, "registered"),
            Err(PersistenceError::Duplicate(_)) => return Err(AuthError::UsernameTaken.into()),
            Err(e) => {
                warn!("registration failed: {e}");
                return Err(AuthError::Unavailable.into());
            }
        }
        self.open_session(conn, record, false).await
    }

    pub(super) async fn login(
        &self,
        conn: &mut Connection,
        credentials: Credentials,
    ) -> Result<(), RequestError> {
        if conn.player.is_some() {
            return Err(AuthError::AlreadyOnline.into());
        }
        let record = self.verify(&credentials).await?;
        self.open_session(conn, record, false).await
    }

    /// Like login, but takes over an existing session and puts the player
    /// back into any room still running.
    pub(super) async fn reconnect(
        &self,
        conn: &mut Connection,
        credentials: Credentials,
    ) -> Result<(), RequestError> {
        if conn
            .player
            .as_ref()
            .is_some_and(|p| p.as_str() != credentials.username)
        {
            return Err(AuthError::AlreadyOnline.into());
        }
        let record = self.verify(&credentials).await?;
        self.open_session(conn, record, true).await
    }

    async fn verify(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        match self.store.get_user(&credentials.username).await {
            Ok(Some(record)) if record.verify(&credentials.password) => Ok(record),
            Ok(_) => Err(AuthError::BadCredentials),
            Err(e) => {
                warn!("login lookup failed: {e}");
                Err(AuthError::Unavailable)
            }
        }
    }

    async fn open_session(
        &self,
        conn: &mut Connection,
        record: UserRecord,
        resume: bool,
    ) -> Result<(), RequestError> {
        let player = PlayerId::new(record.username.clone());
        let mut lobby = self.lobby.lock().await;

        if !resume && lobby.presence.is_online(&player) {
            return Err(AuthError::AlreadyOnline.into());
        }
        let session = Session {
            connection: conn.id,
            outbox: conn.outbox.clone(),
            lp: record.lp,
        };
        if let Some(previous) = lobby.presence.insert(player.clone(), session) {
            if previous.connection != conn.id {
                let _ = previous.outbox.send(ServerEvent::AuthError {
                    message: "signed in from another connection".to_string(),
                });
            }
        }
        conn.player = Some(player.clone());
        info!(%player, resume, "session opened");

        conn.send(ServerEvent::AuthSuccess(Profile {
            username: player.clone(),
            lp: record.lp,
            rank: Rank::for_rating(record.lp),
            wins: record.wins,
            losses: record.losses,
        }));

        if !resume {
            return Ok(());
        }
        let Some(room_id) = lobby.active_room_of(&player) else {
            return Ok(());
        };
        let Some(room) = lobby.rooms.get_mut(&room_id) else {
            return Ok(());
        };
        room.mark_reconnected(&player);
        let room = &lobby.rooms[&room_id];

        match room.status {
            RoomStatus::Waiting if room.category() == RoomCategory::Ranked => {
                Self::announce_ranked_lobby(&lobby, &room_id)
            }
            RoomStatus::Waiting => Self::announce_roster(&lobby, &room_id),
            _ => {
                let (score, words) = room
                    .participant(&player)
                    .map(|p| (p.score, p.words.to_vec()))
                    .unwrap_or_default();
                info!(%player, room = %room_id, "rejoined running room");
                conn.send(ServerEvent::RejoinRoom {
                    room_id: room_id.clone(),
                    status: room.status,
                    board: room.board.clone(),
                    remaining: room.remaining,
                    score,
                    words,
                    players: seats(room),
                });
            }
        }
        Ok(())
    }

    /// Logout and socket close. Leaves queues and waiting rooms; a running
    /// room keeps the seat but counts the player as disconnected.
    pub async fn disconnect(&self, conn: &mut Connection) {
        let Some(player) = conn.player.take() else {
            return;
        };

        let to_settle = {
            let mut lobby = self.lobby.lock().await;
            if !lobby.presence.release(&player, conn.id) {
                // replaced by a newer connection, which now owns the game state
                return;
            }
            lobby.leave_queues(&player);

            let mut to_settle = Vec::new();
            if let Some(room_id) = lobby.active_room_of(&player) {
                let waiting = lobby
                    .rooms
                    .get(&room_id)
                    .is_some_and(|room| room.status == RoomStatus::Waiting);
                if waiting {
                    if let Err(e) = self.leave_waiting(&mut lobby, &room_id, &player) {
                        warn!(%player, room = %room_id, "leave on disconnect failed: {e}");
                    }
                } else if let Some(room) = lobby.rooms.get_mut(&room_id) {
                    if room.mark_disconnected(&player) {
                        info!(%player, room = %room_id, "player dropped mid-game");
                    }
                    if room.should_settle_early() {
                        to_settle.push(room_id);
                    }
                }
            }
            info!(%player, "session closed");
            to_settle
        };

        for room_id in to_settle {
            self.settle(&room_id).await;
        }
    }

    pub(super) async fn chat(&self, conn: &Connection, message: &str) -> Result<(), RequestError> {
        let player = Self::require_login(conn)?;
        let message: String = message.trim().chars().take(MAX_CHAT_LEN).collect();
        if message.is_empty() {
            return Ok(());
        }
        let lobby = self.lobby.lock().await;
        let rank = Rank::for_rating(lobby.presence.lp(&player));
        lobby.presence.broadcast(ServerEvent::ReceiveChat {
            username: player,
            rank,
            message,
        });
        Ok(())
    }

    /// Current stored LP, or zero when the store cannot answer.
    pub(super) async fn current_lp(&self, player: &PlayerId) -> u32 {
        match self.store.get_user(player.as_str()).await {
            Ok(Some(record)) => record.lp,
            Ok(None) => 0,
            Err(e) => {
                warn!(%player, "rating read failed, assuming 0: {e}");
                0
            }
        }
    }

    /// Applies `delta` to the stored rating and returns the new LP. Store
    /// failures are logged and swallowed; without a readable record nothing
    /// is written, so an outage cannot reset anyone to zero.
    pub(super) async fn apply_rating(
        &self,
        player: &PlayerId,
        delta: i32,
        won: bool,
        lost: bool,
    ) -> u32 {
        let current = match self.store.get_user(player.as_str()).await {
            Ok(Some(record)) => record.lp,
            Ok(None) => {
                warn!(%player, "no account to rate");
                return apply_delta(0, delta);
            }
            Err(e) => {
                warn!(%player, delta, "rating read failed, update skipped: {e}");
                return apply_delta(0, delta);
            }
        };

        let lp = apply_delta(current, delta);
        let update = RatingUpdate {
            lp,
            rank: Rank::for_rating(lp).label.to_string(),
            won,
            lost,
        };
        if let Err(e) = self.store.update_rating(player.as_str(), update).await {
            warn!(%player, delta, "rating write failed: {e}");
        }
        self.lobby.lock().await.presence.set_lp(player, lp);
        lp
    }
}
