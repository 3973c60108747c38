use super::{sort_by_rating, RatingUpdate, UserRecord, UserStore};
use crate::error::PersistenceError;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

/// Accounts kept in one JSON file, rewritten after every change.
#[derive(Debug)]
pub struct JsonUserStore {
    path: PathBuf,
    users: Mutex<HashMap<String, UserRecord>>,
}

impl JsonUserStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let users: Vec<UserRecord> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), users = users.len(), "opened user store");

        let users = users
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    // Caller holds the lock, so writes never interleave.
    async fn flush(&self, users: &HashMap<String, UserRecord>) -> Result<(), PersistenceError> {
        let mut records: Vec<&UserRecord> = users.values().collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        let bytes = serde_json::to_vec_pretty(&records)?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl UserStore for JsonUserStore {
    fn get_user<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, PersistenceError>> {
        async move { Ok(self.users.lock().await.get(username).cloned()) }.boxed()
    }

    fn create_user(&self, record: UserRecord) -> BoxFuture<'_, Result<(), PersistenceError>> {
        async move {
            let mut users = self.users.lock().await;
            if users.contains_key(&record.username) {
                return Err(PersistenceError::Duplicate(record.username));
            }
            users.insert(record.username.clone(), record);
            self.flush(&users).await
        }
        .boxed()
    }

    fn update_rating<'a>(
        &'a self,
        username: &'a str,
        update: RatingUpdate,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            let mut users = self.users.lock().await;
            let record = users
                .get_mut(username)
                .ok_or_else(|| PersistenceError::Missing(username.to_string()))?;
            update.apply(record);
            self.flush(&users).await
        }
        .boxed()
    }

    fn top_by_rating(
        &self,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<UserRecord>, PersistenceError>> {
        async move {
            let users = self.users.lock().await.values().cloned().collect();
            Ok(sort_by_rating(users, limit))
        }
        .boxed()
    }
}
