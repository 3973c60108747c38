//! Everything a room does on its own once it leaves the waiting phase: the
//! loading delay, the per-second countdown, the bots, and settlement.

use super::{scores, seats, GameServer, Lobby};
use crate::dictionary::Dictionary;
use crate::models::{
    ai_delta, settle_standings, Outcome, Participant, PlayerId, PlayerResult, Presence, Rank,
    Room, RoomCategory, RoomId, RoomKind, RoomStatus, ScoreVisibility, ServerEvent, Timer,
    WordList,
};

use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

pub(super) const BOT_NAMES: [&str; 3] = ["Noodle", "Quill", "Sprocket"];
const BOT_DELAY_SECS: RangeInclusive<u64> = 5..=11;
const BOT_WORD_LEN: RangeInclusive<usize> = 3..=6;

enum Tick {
    Running,
    Expired,
    Gone,
}

fn bot_delay() -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(BOT_DELAY_SECS))
}

fn pick_bot_word(dictionary: &Dictionary, found: &WordList) -> Option<String> {
    let mut rng = rand::thread_rng();
    dictionary
        .random_word(
            &mut rng,
            *BOT_WORD_LEN.start(),
            *BOT_WORD_LEN.end(),
            |word| found.contains(word),
        )
        .map(str::to_string)
}

/// Competition place among everyone still in contention, bots included.
fn contender_place(room: &Room, participant: &Participant) -> Option<usize> {
    if participant.is_forfeited() {
        return None;
    }
    let ahead = room
        .participants()
        .iter()
        .filter(|p| !p.is_forfeited() && p.score > participant.score)
        .count();
    Some(ahead + 1)
}

impl GameServer {
    /// Waiting → Loading. Announces the board and hands the room to its
    /// countdown and bot tasks.
    pub(super) fn start_room(&self, lobby: &mut Lobby, room_id: &RoomId) {
        let Some(room) = lobby.rooms.get_mut(room_id) else {
            return;
        };
        let Some(cancel) = room.start_loading() else {
            return;
        };
        let bots: Vec<PlayerId> = match &room.kind {
            RoomKind::Ai { bots, .. } => bots.clone(),
            _ => Vec::new(),
        };
        let mut bot_tokens = Vec::with_capacity(bots.len());
        for bot in bots {
            if let Some(token) = room.add_bot_timer() {
                bot_tokens.push((bot, token));
            }
        }

        info!(
            room = %room_id,
            mode = ?room.category(),
            players = room.participants().len(),
            "room loading"
        );
        lobby.presence.to_room(
            room,
            ServerEvent::GameLoading {
                room_id: room_id.clone(),
                mode: room.category(),
                board: room.board.clone(),
                players: seats(room),
                visibility: room.visibility,
                delay_seconds: self.config.loading_seconds,
            },
        );

        self.spawn_countdown(room_id.clone(), cancel);
        for (bot, token) in bot_tokens {
            self.spawn_bot(room_id.clone(), bot, token);
        }
    }

    fn spawn_countdown(&self, room_id: RoomId, cancel_token: Arc<Notify>) {
        let server = self.clone();
        tokio::spawn(async move {
            let delay = Duration::from_secs(server.config.loading_seconds);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = cancel_token.notified() => {
                    debug!(room = %room_id, "countdown cancelled while loading");
                    return;
                }
            }
            if !server.begin_play(&room_id).await {
                return;
            }

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        match server.tick(&room_id).await {
                            Tick::Running => {}
                            Tick::Expired => {
                                server.settle(&room_id).await;
                                break;
                            }
                            Tick::Gone => break,
                        }
                    },
                    _ = cancel_token.notified() => {
                        debug!(room = %room_id, "countdown cancelled");
                        break;
                    }
                }
            }
        });
    }

    async fn begin_play(&self, room_id: &RoomId) -> bool {
        let mut lobby = self.lobby.lock().await;
        let Some(room) = lobby.rooms.get_mut(room_id) else {
            return false;
        };
        if !room.begin_playing(self.config.round_seconds) {
            return false;
        }
        let room = &lobby.rooms[room_id];
        lobby.presence.to_room(
            room,
            ServerEvent::GameStart {
                room_id: room_id.clone(),
                duration: room.remaining,
            },
        );
        info!(room = %room_id, seconds = room.remaining, "round started");
        true
    }

    async fn tick(&self, room_id: &RoomId) -> Tick {
        let mut lobby = self.lobby.lock().await;
        let Some(remaining) = lobby.rooms.get_mut(room_id).and_then(Room::tick) else {
            return Tick::Gone;
        };
        let room = &lobby.rooms[room_id];
        lobby.presence.to_room(
            room,
            ServerEvent::TimeUpdate {
                room_id: room_id.clone(),
                remaining,
                display: Timer::format_time(remaining),
            },
        );
        if remaining == 0 {
            Tick::Expired
        } else {
            Tick::Running
        }
    }

    /// Ends a round: rates every human, reports the results and drops the
    /// room. Safe to call more than once; only the first call does anything.
    pub async fn settle(&self, room_id: &RoomId) {
        let Some(mut room) = self.lobby.lock().await.rooms.remove(room_id) else {
            return;
        };
        if !room.settle() {
            return;
        }

        let category = room.category();
        let placements = match category {
            RoomCategory::Ai => Vec::new(),
            _ => settle_standings(&room.standings(), self.config.ruleset),
        };

        let ranking = room.ranking();
        let mut results = Vec::with_capacity(ranking.len());
        for id in &ranking {
            let Some(participant) = room.participant(id) else {
                continue;
            };
            let forfeited = participant.is_forfeited();

            let (place, delta, won, lost) = match placements.iter().find(|p| &p.player == id) {
                Some(placement) => (
                    placement.place,
                    placement.delta,
                    placement.outcome == Outcome::Win,
                    placement.outcome == Outcome::Loss,
                ),
                None => {
                    let delta = if participant.is_bot() {
                        0
                    } else {
                        ai_delta(participant.score, forfeited)
                    };
                    (contender_place(&room, participant), delta, false, false)
                }
            };

            let new_lp = if participant.is_bot() {
                None
            } else if participant.presence == Presence::Quit {
                // charged when they quit
                Some(self.current_lp(id).await)
            } else {
                Some(self.apply_rating(id, delta, won, lost).await)
            };

            results.push(PlayerResult {
                username: id.clone(),
                score: participant.score,
                words: participant.words.to_vec(),
                place,
                forfeited,
                is_bot: participant.is_bot(),
                lp_delta: delta,
                new_lp,
                rank: new_lp.map(Rank::for_rating),
            });
        }

        info!(room = %room_id, mode = ?category, players = results.len(), "room settled");
        let lobby = self.lobby.lock().await;
        lobby.presence.to_room(
            &room,
            ServerEvent::GameOver {
                room_id: room_id.clone(),
                results,
                ranking,
            },
        );
    }

    fn spawn_bot(&self, room_id: RoomId, bot: PlayerId, cancel_token: Arc<Notify>) {
        let server = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(bot_delay()) => {
                        if !server.bot_turn(&room_id, &bot).await {
                            break;
                        }
                    },
                    _ = cancel_token.notified() => break,
                }
            }
            debug!(room = %room_id, %bot, "bot stopped");
        });
    }

    /// One word from one bot. False once the room has gone.
    async fn bot_turn(&self, room_id: &RoomId, bot: &PlayerId) -> bool {
        let mut lobby = self.lobby.lock().await;
        let Some(room) = lobby.rooms.get_mut(room_id) else {
            return false;
        };
        match room.status {
            RoomStatus::Waiting | RoomStatus::Loading => return true,
            RoomStatus::Settled => return false,
            RoomStatus::Playing => {}
        }
        let Some(found) = room.participant(bot).map(|p| &p.words) else {
            return false;
        };
        let Some(word) = pick_bot_word(&self.dictionary, found) else {
            return true;
        };
        let Some(score) = room.credit_bot_word(bot, &word) else {
            return true;
        };

        let room = &lobby.rooms[room_id];
        let live = room.visibility == ScoreVisibility::Live;
        lobby.presence.to_room(
            room,
            ServerEvent::SpectatorUpdate {
                room_id: room_id.clone(),
                username: bot.clone(),
                word,
                score: live.then_some(score),
            },
        );
        if live {
            lobby.presence.to_room(
                room,
                ServerEvent::ScoreUpdate {
                    room_id: room_id.clone(),
                    scores: scores(room),
                },
            );
        }
        true
    }
}
