use super::{seats, Connection, GameServer, Lobby};
use crate::error::RequestError;
use crate::models::{
    within_band, Participant, PlayerId, Room, RoomId, RoomKind, RoomStatus, ServerEvent,
    MAX_PLAYERS, MIN_PLAYERS,
};
use tracing::{info, warn};

impl GameServer {
    /// Ranked search: join a compatible waiting room, otherwise queue up and
    /// try to form a new room from the queue.
    pub(super) async fn find_match(&self, conn: &Connection) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        self.lobby.lock().await.ensure_free(&player)?;
        let lp = self.current_lp(&player).await;

        let mut lobby = self.lobby.lock().await;
        // the store call may have raced another request from this player
        lobby.ensure_free(&player)?;
        lobby.presence.set_lp(&player, lp);
        lobby.quick_queue.remove(&player);

        let band = self.config.match_band;
        let joinable = lobby
            .rooms
            .values()
            .filter(|room| room.status == RoomStatus::Waiting && !room.is_full())
            .filter_map(|room| room.anchor_lp().map(|anchor| (room, anchor)))
            .filter(|(_, anchor)| within_band(*anchor, lp, band))
            .min_by_key(|(_, anchor)| anchor.abs_diff(lp))
            .map(|(room, _)| room.id.clone());

        if let Some(room_id) = joinable {
            lobby.ranked_queue.remove(&player);
            if let Some(room) = lobby.rooms.get_mut(&room_id) {
                room.join(Participant::new(player.clone(), lp))?;
            }
            info!(%player, lp, room = %room_id, "joined ranked waiting room");
            Self::announce_ranked_lobby(&lobby, &room_id);
            return Ok(());
        }

        lobby.ranked_queue.enqueue(player.clone(), lp);
        if !self.form_ranked_group(&mut lobby, &player) {
            conn.send(ServerEvent::SearchingMatch { lp });
        }
        Ok(())
    }

    /// Pulls `player` and compatible queue entries into a new ranked room.
    pub(super) fn form_ranked_group(&self, lobby: &mut Lobby, player: &PlayerId) -> bool {
        let Some(group) =
            lobby
                .ranked_queue
                .take_group(player, self.config.match_band, MAX_PLAYERS)
        else {
            return false;
        };

        let mut room = Room::new(
            RoomKind::ranked(group[0].lp),
            self.config.ranked_visibility,
            self.config.round_seconds,
        );
        for entry in group {
            if let Err(e) = room.join(Participant::new(entry.player.clone(), entry.lp)) {
                warn!(player = %entry.player, "could not seat matched player: {e}");
            }
        }
        let room_id = room.id.clone();
        info!(
            room = %room_id,
            players = room.human_count(),
            anchor = ?room.anchor_lp(),
            "ranked match formed"
        );
        lobby.rooms.insert(room_id.clone(), room);
        Self::announce_ranked_lobby(lobby, &room_id);
        true
    }

    pub(super) fn announce_ranked_lobby(lobby: &Lobby, room_id: &RoomId) {
        let Some(room) = lobby.rooms.get(room_id) else {
            return;
        };
        lobby.presence.to_room(
            room,
            ServerEvent::RankedLobbyUpdate {
                room_id: room_id.clone(),
                anchor_lp: room.anchor_lp().unwrap_or_default(),
                players: seats(room),
            },
        );
    }

    /// Casual first-come pairing; the room starts as soon as it forms.
    pub(super) async fn quick_match(&self, conn: &Connection) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        lobby.ensure_free(&player)?;
        lobby.ranked_queue.remove(&player);

        let lp = lobby.presence.lp(&player);
        lobby.quick_queue.enqueue(player.clone(), lp);
        let Some(pair) = lobby.quick_queue.take_front(MIN_PLAYERS) else {
            conn.send(ServerEvent::SearchingMatch { lp });
            return Ok(());
        };

        let mut room = Room::new(
            RoomKind::Quick,
            self.config.casual_visibility,
            self.config.round_seconds,
        );
        for entry in pair {
            room.join(Participant::new(entry.player, entry.lp))?;
        }
        let room_id = room.id.clone();
        info!(room = %room_id, "quick match formed");
        lobby.rooms.insert(room_id.clone(), room);
        self.start_room(&mut lobby, &room_id);
        Ok(())
    }

    pub(super) async fn cancel_match(&self, conn: &Connection) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        if self.lobby.lock().await.leave_queues(&player) {
            info!(%player, "left match queue");
        }
        conn.send(ServerEvent::MatchCancelled {});
        Ok(())
    }

    /// Practice round against the house bots.
    pub(super) async fn start_ai_match(&self, conn: &Connection) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        lobby.ensure_free(&player)?;
        lobby.leave_queues(&player);

        let bots = super::lifecycle::BOT_NAMES
            .iter()
            .map(|name| PlayerId::bot(name))
            .collect();
        let mut room = Room::new(
            RoomKind::ai(bots),
            self.config.casual_visibility,
            self.config.round_seconds,
        );
        let lp = lobby.presence.lp(&player);
        room.join(Participant::new(player.clone(), lp))?;

        let room_id = room.id.clone();
        info!(%player, room = %room_id, "practice match created");
        lobby.rooms.insert(room_id.clone(), room);
        self.start_room(&mut lobby, &room_id);
        Ok(())
    }
}
