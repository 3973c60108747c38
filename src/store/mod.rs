//! Account persistence consumed by the lobby.
//!
//! The lobby only needs a handful of operations, so [`UserStore`] is a small
//! object-safe trait returning boxed futures. Two backends ship: an
//! in-memory map and a JSON file.

mod json_file;
mod memory;

pub use json_file::JsonUserStore;
pub use memory::MemoryUserStore;

use crate::error::PersistenceError;
use crate::models::Rank;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub lp: u32,
    pub rank: String,
    pub wins: u32,
    pub losses: u32,
}

impl UserRecord {
    pub fn new(username: &str, password: &str, lp: u32) -> Self {
        Self {
            username: username.to_string(),
            password_hash: hash_password(username, password),
            lp,
            rank: Rank::for_rating(lp).label.to_string(),
            wins: 0,
            losses: 0,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        self.password_hash == hash_password(&self.username, password)
    }
}

/// New rating after a match or a forfeit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingUpdate {
    pub lp: u32,
    pub rank: String,
    pub won: bool,
    pub lost: bool,
}

impl RatingUpdate {
    pub fn apply(&self, record: &mut UserRecord) {
        record.lp = self.lp;
        record.rank = self.rank.clone();
        record.wins += u32::from(self.won);
        record.losses += u32::from(self.lost);
    }
}

pub trait UserStore: Send + Sync {
    fn get_user<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, PersistenceError>>;

    /// Fails with [`PersistenceError::Duplicate`] if the name is taken.
    fn create_user(&self, record: UserRecord) -> BoxFuture<'_, Result<(), PersistenceError>>;

    fn update_rating<'a>(
        &'a self,
        username: &'a str,
        update: RatingUpdate,
    ) -> BoxFuture<'a, Result<(), PersistenceError>>;

    /// Highest LP first.
    fn top_by_rating(&self, limit: usize)
        -> BoxFuture<'_, Result<Vec<UserRecord>, PersistenceError>>;
}

// Salted with the username so equal passwords do not share a digest.
pub fn hash_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn sort_by_rating(mut users: Vec<UserRecord>, limit: usize) -> Vec<UserRecord> {
    users.sort_by(|a, b| b.lp.cmp(&a.lp).then_with(|| a.username.cmp(&b.username)));
    users.truncate(limit);
    users
}
