use super::board::Board;
use super::player::{Participant, PlayerId, Presence};
use super::rank::score_for_word_length;
use super::settlement::Standing;
use super::timer::Timer;
use crate::dictionary::Dictionary;
use crate::error::{RoomError, WordRejection};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomStatus {
    Waiting,
    Loading,
    Playing,
    Settled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomCategory {
    Ranked,
    Custom,
    Ai,
    Quick,
}

impl RoomCategory {
    pub fn prefix(self) -> &'static str {
        match self {
            RoomCategory::Ranked => "ranked",
            RoomCategory::Custom => "custom",
            RoomCategory::Ai => "ai",
            RoomCategory::Quick => "quickmatch",
        }
    }
}

/// Whether score changes reach the whole room as they happen or stay with
/// the scorer until the game is over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreVisibility {
    Live,
    Hidden,
}

impl FromStr for ScoreVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(ScoreVisibility::Live),
            "hidden" => Ok(ScoreVisibility::Hidden),
            other => Err(format!("unknown score visibility {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn generate(category: RoomCategory) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        RoomId(format!("{}_{}", category.prefix(), &suffix[..8]))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        RoomId(id.to_string())
    }
}

#[derive(Debug)]
pub enum RoomKind {
    Ranked {
        anchor_lp: u32,
        ready: HashSet<PlayerId>,
    },
    Custom {
        host: PlayerId,
        password: Option<String>,
    },
    Ai {
        bots: Vec<PlayerId>,
        bot_timers: Vec<Timer>,
    },
    Quick,
}

impl RoomKind {
    pub fn ranked(anchor_lp: u32) -> Self {
        RoomKind::Ranked {
            anchor_lp,
            ready: HashSet::new(),
        }
    }

    pub fn custom(host: PlayerId, password: Option<String>) -> Self {
        RoomKind::Custom {
            host,
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn ai(bots: Vec<PlayerId>) -> Self {
        RoomKind::Ai {
            bots,
            bot_timers: Vec::new(),
        }
    }
}

/// Row in the public custom-room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub host: PlayerId,
    pub players: usize,
    pub capacity: usize,
    pub locked: bool,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub status: RoomStatus,
    pub board: Board,
    pub visibility: ScoreVisibility,
    pub remaining: u32,
    participants: Vec<Participant>,
    countdown: Option<Timer>,
}

impl Room {
    pub fn new(kind: RoomKind, visibility: ScoreVisibility, round_seconds: u32) -> Self {
        let category = match &kind {
            RoomKind::Ranked { .. } => RoomCategory::Ranked,
            RoomKind::Custom { .. } => RoomCategory::Custom,
            RoomKind::Ai { .. } => RoomCategory::Ai,
            RoomKind::Quick => RoomCategory::Quick,
        };
        let mut room = Self {
            id: RoomId::generate(category),
            kind,
            status: RoomStatus::Waiting,
            board: Board::new(),
            visibility,
            remaining: round_seconds,
            participants: Vec::new(),
            countdown: None,
        };
        if let RoomKind::Ai { bots, .. } = &room.kind {
            let seats: Vec<Participant> = bots
                .iter()
                .map(|bot| Participant::new(bot.clone(), 0))
                .collect();
            room.participants.extend(seats);
        }
        room
    }

    pub fn category(&self) -> RoomCategory {
        match self.kind {
            RoomKind::Ranked { .. } => RoomCategory::Ranked,
            RoomKind::Custom { .. } => RoomCategory::Custom,
            RoomKind::Ai { .. } => RoomCategory::Ai,
            RoomKind::Quick => RoomCategory::Quick,
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn participant_mut(&mut self, id: &PlayerId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.participant(id).is_some()
    }

    /// True while `id` still holds a live seat here: present, not quit, and
    /// the room has not been settled.
    pub fn is_active_for(&self, id: &PlayerId) -> bool {
        self.status != RoomStatus::Settled
            && self
                .participant(id)
                .is_some_and(|p| p.presence != Presence::Quit)
    }

    pub fn humans(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.is_bot())
    }

    pub fn human_count(&self) -> usize {
        self.humans().count()
    }

    pub fn connected_humans(&self) -> usize {
        self.humans()
            .filter(|p| p.presence == Presence::Connected)
            .count()
    }

    pub fn is_full(&self) -> bool {
        self.human_count() >= MAX_PLAYERS
    }

    pub fn host(&self) -> Option<&PlayerId> {
        match &self.kind {
            RoomKind::Custom { host, .. } => Some(host),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(&self.kind, RoomKind::Custom { password: Some(_), .. })
    }

    pub fn check_password(&self, attempt: Option<&str>) -> bool {
        match &self.kind {
            RoomKind::Custom {
                password: Some(password),
                ..
            } => attempt == Some(password.as_str()),
            _ => true,
        }
    }

    pub fn anchor_lp(&self) -> Option<u32> {
        match &self.kind {
            RoomKind::Ranked { anchor_lp, .. } => Some(*anchor_lp),
            _ => None,
        }
    }

    pub fn is_ready(&self, id: &PlayerId) -> bool {
        match &self.kind {
            RoomKind::Ranked { ready, .. } => ready.contains(id),
            _ => false,
        }
    }

    pub fn join(&mut self, participant: Participant) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        if self.contains(&participant.id) {
            return Err(RoomError::AlreadyInRoom);
        }
        if self.is_full() {
            return Err(RoomError::Full);
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Removes a player from a waiting room. A departing custom host hands
    /// the room to the next player in join order.
    pub fn leave(&mut self, id: &PlayerId) -> Result<Participant, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or(RoomError::NotInRoom)?;
        let participant = self.participants.remove(index);

        match &mut self.kind {
            RoomKind::Ranked { ready, .. } => {
                ready.remove(id);
            }
            RoomKind::Custom { host, .. } if host == id => {
                if let Some(next) = self.participants.iter().find(|p| !p.is_bot()) {
                    *host = next.id.clone();
                }
            }
            _ => {}
        }
        Ok(participant)
    }

    /// Marks a ranked player ready. Returns whether the room may now start.
    pub fn set_ready(&mut self, id: &PlayerId) -> Result<bool, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        if !self.contains(id) {
            return Err(RoomError::NotInRoom);
        }
        match &mut self.kind {
            RoomKind::Ranked { ready, .. } => {
                ready.insert(id.clone());
            }
            _ => return Err(RoomError::NotJoinable),
        }
        Ok(self.all_ready())
    }

    pub fn all_ready(&self) -> bool {
        match &self.kind {
            RoomKind::Ranked { ready, .. } => {
                self.human_count() >= MIN_PLAYERS
                    && self.humans().all(|p| ready.contains(&p.id))
            }
            _ => false,
        }
    }

    /// Waiting → Loading. Hands back the countdown's cancel token once.
    pub fn start_loading(&mut self) -> Option<Arc<Notify>> {
        if self.status != RoomStatus::Waiting {
            return None;
        }
        self.status = RoomStatus::Loading;
        let timer = Timer::new();
        let token = timer.token();
        self.countdown = Some(timer);
        Some(token)
    }

    /// Loading → Playing with a fresh countdown.
    pub fn begin_playing(&mut self, round_seconds: u32) -> bool {
        if self.status != RoomStatus::Loading {
            return false;
        }
        self.status = RoomStatus::Playing;
        self.remaining = round_seconds;
        true
    }

    /// One second elapses. Returns the remaining time while playing.
    pub fn tick(&mut self) -> Option<u32> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.remaining)
    }

    pub fn add_bot_timer(&mut self) -> Option<Arc<Notify>> {
        match &mut self.kind {
            RoomKind::Ai { bot_timers, .. } => {
                let timer = Timer::new();
                let token = timer.token();
                bot_timers.push(timer);
                Some(token)
            }
            _ => None,
        }
    }

    /// Cancels the countdown and every bot timer. True the first time only.
    pub fn cancel_timers(&mut self) -> bool {
        let mut cancelled = self.countdown.as_mut().is_some_and(Timer::cancel);
        if let RoomKind::Ai { bot_timers, .. } = &mut self.kind {
            for timer in bot_timers.iter_mut() {
                cancelled |= timer.cancel();
            }
        }
        cancelled
    }

    pub fn settle(&mut self) -> bool {
        if self.status == RoomStatus::Settled {
            return false;
        }
        self.cancel_timers();
        self.status = RoomStatus::Settled;
        true
    }

    /// Validates and credits a human submission. Returns the normalized
    /// word and the points it earned.
    pub fn submit_word(
        &mut self,
        id: &PlayerId,
        raw: &str,
        dictionary: &Dictionary,
    ) -> Result<(String, u32), WordRejection> {
        if self.status != RoomStatus::Playing {
            return Err(WordRejection::NotInProgress);
        }
        let participant = self
            .participant_mut(id)
            .filter(|p| !p.is_forfeited())
            .ok_or(WordRejection::NotInRoom)?;

        let word = raw.trim().to_lowercase();
        let len = word.chars().count();
        if len < MIN_WORD_LEN {
            return Err(WordRejection::TooShort);
        }
        if participant.words.contains(&word) {
            return Err(WordRejection::Duplicate);
        }
        if !dictionary.contains(&word) {
            return Err(WordRejection::NotAWord);
        }

        let points = score_for_word_length(len);
        participant.credit(&word, points);
        Ok((word, points))
    }

    /// Credits a dictionary-drawn word to a bot, as a submission would.
    pub fn credit_bot_word(&mut self, id: &PlayerId, word: &str) -> Option<u32> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        let participant = self.participant_mut(id).filter(|p| p.is_bot())?;
        let points = score_for_word_length(word.chars().count());
        participant.credit(word, points).then_some(participant.score)
    }

    pub fn mark_disconnected(&mut self, id: &PlayerId) -> bool {
        match self.participant_mut(id) {
            Some(p) if p.presence == Presence::Connected => {
                p.presence = Presence::Disconnected;
                true
            }
            _ => false,
        }
    }

    pub fn mark_reconnected(&mut self, id: &PlayerId) -> bool {
        match self.participant_mut(id) {
            Some(p) if p.presence == Presence::Disconnected => {
                p.presence = Presence::Connected;
                true
            }
            _ => false,
        }
    }

    /// Manual forfeit during loading or play.
    pub fn mark_quit(&mut self, id: &PlayerId) -> Result<(), RoomError> {
        if !matches!(self.status, RoomStatus::Loading | RoomStatus::Playing) {
            return Err(RoomError::NotRunning);
        }
        let participant = self.participant_mut(id).ok_or(RoomError::NotInRoom)?;
        if participant.presence == Presence::Quit {
            return Err(RoomError::NotInRoom);
        }
        participant.presence = Presence::Quit;
        Ok(())
    }

    /// A running room nobody is left to play in.
    pub fn should_settle_early(&self) -> bool {
        matches!(self.status, RoomStatus::Loading | RoomStatus::Playing)
            && self.connected_humans() == 0
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.humans()
            .map(|p| Standing {
                player: p.id.clone(),
                score: p.score,
                forfeited: p.is_forfeited(),
            })
            .collect()
    }

    /// Everyone by final order: contenders by score, then forfeits.
    pub fn ranking(&self) -> Vec<PlayerId> {
        let mut order: Vec<&Participant> = self.participants.iter().collect();
        order.sort_by(|a, b| {
            a.is_forfeited()
                .cmp(&b.is_forfeited())
                .then(b.score.cmp(&a.score))
        });
        order.into_iter().map(|p| p.id.clone()).collect()
    }

    pub fn summary(&self) -> Option<RoomSummary> {
        let host = self.host()?.clone();
        Some(RoomSummary {
            room_id: self.id.clone(),
            host,
            players: self.human_count(),
            capacity: MAX_PLAYERS,
            locked: self.is_locked(),
        })
    }

    /// Custom rooms still taking players.
    pub fn is_listed(&self) -> bool {
        self.category() == RoomCategory::Custom
            && self.status == RoomStatus::Waiting
            && !self.is_full()
    }
}
