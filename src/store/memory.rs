use super::{sort_by_rating, RatingUpdate, UserRecord, UserStore};
use crate::error::PersistenceError;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = users
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn get_user<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, PersistenceError>> {
        async move { Ok(self.users.read().await.get(username).cloned()) }.boxed()
    }

    fn create_user(&self, record: UserRecord) -> BoxFuture<'_, Result<(), PersistenceError>> {
        async move {
            let mut users = self.users.write().await;
            if users.contains_key(&record.username) {
                return Err(PersistenceError::Duplicate(record.username));
            }
            users.insert(record.username.clone(), record);
            Ok(())
        }
        .boxed()
    }

    fn update_rating<'a>(
        &'a self,
        username: &'a str,
        update: RatingUpdate,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            let mut users = self.users.write().await;
            let record = users
                .get_mut(username)
                .ok_or_else(|| PersistenceError::Missing(username.to_string()))?;
            update.apply(record);
            Ok(())
        }
        .boxed()
    }

    fn top_by_rating(
        &self,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<UserRecord>, PersistenceError>> {
        async move {
            let users = self.users.read().await.values().cloned().collect();
            Ok(sort_by_rating(users, limit))
        }
        .boxed()
    }
}
