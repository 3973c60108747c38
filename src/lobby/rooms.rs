use super::{scores, seats, Connection, GameServer, Lobby};
use crate::error::{RequestError, RoomError};
use crate::models::{
    Participant, PlayerId, Rank, Room, RoomCategory, RoomId, RoomKind, RoomStatus,
    ScoreVisibility, ServerEvent, FORFEIT_PENALTY, MIN_PLAYERS,
};
use tracing::{debug, info};

impl GameServer {
    pub(super) async fn create_room(
        &self,
        conn: &Connection,
        password: Option<String>,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        lobby.ensure_free(&player)?;
        lobby.leave_queues(&player);

        let mut room = Room::new(
            RoomKind::custom(player.clone(), password),
            self.config.casual_visibility,
            self.config.round_seconds,
        );
        let lp = lobby.presence.lp(&player);
        room.join(Participant::new(player.clone(), lp))?;
        let room_id = room.id.clone();
        let locked = room.is_locked();
        lobby.rooms.insert(room_id.clone(), room);
        info!(%player, room = %room_id, locked, "custom room created");

        conn.send(ServerEvent::RoomCreated {
            room_id: room_id.clone(),
            locked,
        });
        Self::announce_roster(&lobby, &room_id);
        lobby.broadcast_room_list();
        Ok(())
    }

    pub(super) async fn join_room(
        &self,
        conn: &Connection,
        room_id: &RoomId,
        password: Option<&str>,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        lobby.ensure_free(&player)?;
        let lp = lobby.presence.lp(&player);

        let room = lobby.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        if room.category() != RoomCategory::Custom {
            return Err(RoomError::NotJoinable.into());
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted.into());
        }
        if room.is_full() {
            return Err(RoomError::Full.into());
        }
        if !room.check_password(password) {
            return Err(RoomError::WrongPassword.into());
        }
        room.join(Participant::new(player.clone(), lp))?;
        info!(%player, room = %room_id, "joined custom room");

        lobby.leave_queues(&player);
        Self::announce_roster(&lobby, room_id);
        lobby.broadcast_room_list();
        Ok(())
    }

    pub(super) async fn start_custom_game(
        &self,
        conn: &Connection,
        room_id: &RoomId,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        let room = lobby.rooms.get(room_id).ok_or(RoomError::NotFound)?;
        if room.category() != RoomCategory::Custom {
            return Err(RoomError::NotJoinable.into());
        }
        if room.host() != Some(&player) {
            return Err(RoomError::NotHost.into());
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted.into());
        }
        if room.human_count() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers.into());
        }

        info!(%player, room = %room_id, "host started custom game");
        self.start_room(&mut lobby, room_id);
        lobby.broadcast_room_list();
        Ok(())
    }

    pub(super) async fn ready_ranked(
        &self,
        conn: &Connection,
        room_id: &RoomId,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        let room = lobby.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        let start = room.set_ready(&player)?;
        debug!(%player, room = %room_id, start, "ready");

        Self::announce_ranked_lobby(&lobby, room_id);
        if start {
            self.start_room(&mut lobby, room_id);
        }
        Ok(())
    }

    pub(super) async fn leave_waiting_room(
        &self,
        conn: &Connection,
        room_id: &RoomId,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        self.leave_waiting(&mut lobby, room_id, &player)?;
        conn.send(ServerEvent::LeftRoom {
            room_id: room_id.clone(),
        });
        Ok(())
    }

    /// Takes `player` out of a room that has not started yet and tidies up
    /// behind them. A ranked room left with a single player dissolves and
    /// that player goes back into the queue.
    pub(super) fn leave_waiting(
        &self,
        lobby: &mut Lobby,
        room_id: &RoomId,
        player: &PlayerId,
    ) -> Result<(), RoomError> {
        let room = lobby.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        room.leave(player)?;
        info!(%player, room = %room_id, "left waiting room");

        let category = room.category();
        let remaining = room.human_count();
        if remaining == 0 {
            lobby.rooms.remove(room_id);
            if category == RoomCategory::Custom {
                lobby.broadcast_room_list();
            }
            return Ok(());
        }

        match category {
            RoomCategory::Ranked if remaining < MIN_PLAYERS => {
                let Some(room) = lobby.rooms.remove(room_id) else {
                    return Ok(());
                };
                for lone in room.humans() {
                    debug!(player = %lone.id, room = %room_id, "ranked room dissolved, requeueing");
                    lobby.ranked_queue.enqueue(lone.id.clone(), lone.lp);
                    lobby.presence.send(
                        &lone.id,
                        ServerEvent::LeftRoom {
                            room_id: room_id.clone(),
                        },
                    );
                    if !self.form_ranked_group(lobby, &lone.id) {
                        lobby
                            .presence
                            .send(&lone.id, ServerEvent::SearchingMatch { lp: lone.lp });
                    }
                }
            }
            RoomCategory::Ranked => Self::announce_ranked_lobby(lobby, room_id),
            _ => {
                Self::announce_roster(lobby, room_id);
                lobby.broadcast_room_list();
            }
        }
        Ok(())
    }

    pub(super) fn announce_roster(lobby: &Lobby, room_id: &RoomId) {
        let Some(room) = lobby.rooms.get(room_id) else {
            return;
        };
        lobby.presence.to_room(
            room,
            ServerEvent::PlayerJoined {
                room_id: room_id.clone(),
                host: room.host().cloned(),
                players: seats(room),
            },
        );
    }

    pub(super) async fn submit_word(
        &self,
        conn: &Connection,
        room_id: &RoomId,
        word: &str,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let mut lobby = self.lobby.lock().await;
        let room = lobby.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;

        match room.submit_word(&player, word, &self.dictionary) {
            Ok((word, points)) => {
                debug!(%player, room = %room_id, %word, points, "word accepted");
                conn.send(ServerEvent::WordResult {
                    room_id: room_id.clone(),
                    word,
                    accepted: true,
                    points,
                    reason: None,
                });
                let room = &lobby.rooms[room_id];
                match room.visibility {
                    ScoreVisibility::Live => lobby.presence.to_room(
                        room,
                        ServerEvent::ScoreUpdate {
                            room_id: room_id.clone(),
                            scores: scores(room),
                        },
                    ),
                    ScoreVisibility::Hidden => {
                        let (score, words) = room
                            .participant(&player)
                            .map(|p| (p.score, p.words.to_vec()))
                            .unwrap_or_default();
                        conn.send(ServerEvent::MyScoreUpdate {
                            room_id: room_id.clone(),
                            score,
                            words,
                        });
                    }
                }
            }
            Err(reason) => {
                debug!(%player, room = %room_id, ?reason, "word rejected");
                conn.send(ServerEvent::WordResult {
                    room_id: room_id.clone(),
                    word: word.trim().to_lowercase(),
                    accepted: false,
                    points: 0,
                    reason: Some(reason),
                });
            }
        }
        Ok(())
    }

    /// Forfeits a running round. Rated rooms charge the penalty now; the
    /// settlement that follows leaves this player's rating alone.
    pub(super) async fn quit_match(
        &self,
        conn: &Connection,
        room_id: &RoomId,
    ) -> Result<(), RequestError> {
        let player = Self::require_player(conn)?;
        let (penalty, settle_now) = {
            let mut lobby = self.lobby.lock().await;
            let room = lobby.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
            room.mark_quit(&player)?;
            let penalty = match room.category() {
                RoomCategory::Ai => 0,
                _ => FORFEIT_PENALTY,
            };
            let settle_now = room.should_settle_early();
            Self::announce_after_quit(&lobby, room_id);
            (penalty, settle_now)
        };
        info!(%player, room = %room_id, penalty, "player quit");

        let new_lp = if penalty == 0 {
            self.current_lp(&player).await
        } else {
            self.apply_rating(&player, penalty, false, true).await
        };
        conn.send(ServerEvent::QuitSuccess {
            room_id: room_id.clone(),
            lp_delta: penalty,
            new_lp,
            rank: Rank::for_rating(new_lp),
        });

        if settle_now {
            self.settle(room_id).await;
        }
        Ok(())
    }

    fn announce_after_quit(lobby: &Lobby, room_id: &RoomId) {
        let Some(room) = lobby.rooms.get(room_id) else {
            return;
        };
        if room.visibility == ScoreVisibility::Live {
            lobby.presence.to_room(
                room,
                ServerEvent::ScoreUpdate {
                    room_id: room_id.clone(),
                    scores: scores(room),
                },
            );
        }
    }
}
