use super::rank::Rank;
use super::word_list::WordList;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOT_PREFIX: &str = "AI_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(name: impl Into<String>) -> Self {
        PlayerId(name.into())
    }

    pub fn bot(name: &str) -> Self {
        PlayerId(format!("{BOT_PREFIX}{name}"))
    }

    pub fn is_bot(&self) -> bool {
        self.0.starts_with(BOT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        PlayerId(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Presence {
    Connected,
    Disconnected,
    /// Left through `quitMatch`; the penalty was charged on the spot.
    Quit,
}

/// One seat in a room. Score and words live here, so they can never drift
/// apart from the roster.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PlayerId,
    pub score: u32,
    pub words: WordList,
    pub presence: Presence,
    /// Rating when the player sat down; display only.
    pub lp: u32,
    pub rank: Rank,
}

impl Participant {
    pub fn new(id: PlayerId, lp: u32) -> Self {
        Self {
            id,
            score: 0,
            words: WordList::new(),
            presence: Presence::Connected,
            lp,
            rank: Rank::for_rating(lp),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.id.is_bot()
    }

    /// Quit or disconnected: out of placement, charged the penalty instead.
    pub fn is_forfeited(&self) -> bool {
        self.presence != Presence::Connected
    }

    pub fn credit(&mut self, word: &str, points: u32) -> bool {
        if !self.words.add(word) {
            return false;
        }
        self.score += points;
        true
    }
}
