//! Named events exchanged over the websocket.
//!
//! Both directions use `{"event": "<name>", "data": {...}}`. Events without
//! a payload still send an empty `data` object.

use super::board::Board;
use super::player::PlayerId;
use super::rank::Rank;
use super::room::{RoomCategory, RoomId, RoomStatus, RoomSummary, ScoreVisibility};
use crate::error::WordRejection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Register(Credentials),
    Login(Credentials),
    ReconnectUser(Credentials),
    Logout {},
    SendChat {
        message: String,
    },
    GetLeaderboard {},
    FindMatch {},
    QuickMatch {},
    CancelMatch {},
    LeaveWaitingRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    ReadyRanked {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    GetRoomList {},
    CreateRoom {
        #[serde(default)]
        password: Option<String>,
    },
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(default)]
        password: Option<String>,
    },
    StartCustomGame {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    #[serde(rename = "startAIMatch")]
    StartAiMatch {},
    SubmitWord {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        word: String,
    },
    QuitMatch {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: PlayerId,
    pub lp: u32,
    pub rank: Rank,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub lp: u32,
    pub rank: Rank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInfo {
    pub username: PlayerId,
    pub lp: u32,
    pub rank: Rank,
    pub ready: bool,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub username: PlayerId,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub username: PlayerId,
    pub score: u32,
    pub words: Vec<String>,
    pub place: Option<usize>,
    pub forfeited: bool,
    pub is_bot: bool,
    pub lp_delta: i32,
    /// `None` for bots, which are never rated.
    pub new_lp: Option<u32>,
    pub rank: Option<Rank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    AuthSuccess(Profile),
    AuthError {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ReceiveChat {
        username: PlayerId,
        rank: Rank,
        message: String,
    },
    UpdateLeaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    RoomListUpdate {
        rooms: Vec<RoomSummary>,
    },
    SearchingMatch {
        lp: u32,
    },
    MatchCancelled {},
    #[serde(rename_all = "camelCase")]
    RankedLobbyUpdate {
        room_id: RoomId,
        anchor_lp: u32,
        players: Vec<SeatInfo>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        room_id: RoomId,
        host: Option<PlayerId>,
        players: Vec<SeatInfo>,
    },
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_id: RoomId,
        locked: bool,
    },
    RoomError {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    LeftRoom {
        room_id: RoomId,
    },
    #[serde(rename_all = "camelCase")]
    GameLoading {
        room_id: RoomId,
        mode: RoomCategory,
        board: Board,
        players: Vec<SeatInfo>,
        visibility: ScoreVisibility,
        delay_seconds: u64,
    },
    #[serde(rename_all = "camelCase")]
    GameStart {
        room_id: RoomId,
        duration: u32,
    },
    #[serde(rename_all = "camelCase")]
    TimeUpdate {
        room_id: RoomId,
        remaining: u32,
        display: String,
    },
    #[serde(rename_all = "camelCase")]
    WordResult {
        room_id: RoomId,
        word: String,
        accepted: bool,
        points: u32,
        reason: Option<WordRejection>,
    },
    #[serde(rename_all = "camelCase")]
    ScoreUpdate {
        room_id: RoomId,
        scores: Vec<ScoreEntry>,
    },
    #[serde(rename_all = "camelCase")]
    MyScoreUpdate {
        room_id: RoomId,
        score: u32,
        words: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    SpectatorUpdate {
        room_id: RoomId,
        username: PlayerId,
        word: String,
        /// Withheld while the room's scores are hidden.
        score: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        room_id: RoomId,
        results: Vec<PlayerResult>,
        ranking: Vec<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    QuitSuccess {
        room_id: RoomId,
        lp_delta: i32,
        new_lp: u32,
        rank: Rank,
    },
    #[serde(rename_all = "camelCase")]
    RejoinRoom {
        room_id: RoomId,
        status: RoomStatus,
        board: Board,
        remaining: u32,
        score: u32,
        words: Vec<String>,
        players: Vec<SeatInfo>,
    },
}
