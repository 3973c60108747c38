use serde::Serialize;
use thiserror::Error;

/// Failures while registering, logging in or resuming a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    BadCredentials,
    #[error("this account is already online")]
    AlreadyOnline,
    #[error("usernames are 3-16 letters, digits or underscores")]
    InvalidUsername,
    #[error("passwords need at least 4 characters")]
    WeakPassword,
    #[error("log in first")]
    NotAuthenticated,
    #[error("account service unavailable, try again")]
    Unavailable,
}

/// Reasons a word submission earns nothing. The round carries on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WordRejection {
    #[error("words need at least 3 letters")]
    TooShort,
    #[error("word already found")]
    Duplicate,
    #[error("not in the dictionary")]
    NotAWord,
    #[error("the round is not running")]
    NotInProgress,
    #[error("you are not playing in this room")]
    NotInRoom,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
    #[error("room is full")]
    Full,
    #[error("wrong room password")]
    WrongPassword,
    #[error("only the host can start the game")]
    NotHost,
    #[error("at least 2 players are needed")]
    NotEnoughPlayers,
    #[error("room is not accepting players")]
    NotJoinable,
    #[error("already in a room")]
    AlreadyInRoom,
    #[error("not a member of this room")]
    NotInRoom,
    #[error("game already started")]
    AlreadyStarted,
    #[error("game is not running")]
    NotRunning,
    #[error("log in first")]
    NotAuthenticated,
}

/// Backing store failures. Callers log these and fall back to defaults.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("user store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("user store format: {0}")]
    Format(#[from] serde_json::Error),
    #[error("user {0} already exists")]
    Duplicate(String),
    #[error("user {0} not found")]
    Missing(String),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Anything a client request can fail with, routed back to that client as
/// an `authError` or `roomError` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Room(#[from] RoomError),
}
