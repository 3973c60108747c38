mod board;
mod events;
mod matchmaking;
mod player;
mod rank;
mod room;
mod settlement;
mod timer;
mod word_list;

pub use board::Board;
pub use events::{
    ClientEvent, Credentials, LeaderboardEntry, PlayerResult, Profile, ScoreEntry, SeatInfo,
    ServerEvent,
};
pub use matchmaking::{within_band, MatchQueue, DEFAULT_LP_BAND};
pub use player::{Participant, PlayerId, Presence, BOT_PREFIX};
pub use rank::Rank;
pub use room::{
    Room, RoomCategory, RoomId, RoomKind, RoomStatus, RoomSummary, ScoreVisibility, MAX_PLAYERS,
    MIN_PLAYERS,
};
pub use settlement::{ai_delta, apply_delta, settle_standings, LpRuleset, Outcome, FORFEIT_PENALTY};
pub use timer::Timer;
pub use word_list::WordList;
