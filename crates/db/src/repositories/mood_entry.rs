//! Mood entry repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mindful_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{MoodEntry, mood_entry};

/// Repository for mood entry operations.
#[derive(Clone)]
pub struct MoodEntryRepository {
    db: Arc<DatabaseConnection>,
}

impl MoodEntryRepository {
    /// Create a new mood entry repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new entry.
    pub async fn create(&self, model: mood_entry::ActiveModel) -> AppResult<mood_entry::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Find the user's most recent entries, newest first.
    pub async fn find_recent_by_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<mood_entry::Model>> {
        MoodEntry::find()
            .filter(mood_entry::Column::UserId.eq(user_id))
            .order_by(mood_entry::Column::CreatedAt, Order::Desc)
            .order_by(mood_entry::Column::Id, Order::Desc)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Find the user's entries with `start <= created_at <= end`, oldest first.
    pub async fn find_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<mood_entry::Model>> {
        MoodEntry::find()
            .filter(mood_entry::Column::UserId.eq(user_id))
            .filter(mood_entry::Column::CreatedAt.gte(start))
            .filter(mood_entry::Column::CreatedAt.lte(end))
            .order_by(mood_entry::Column::CreatedAt, Order::Asc)
            .order_by(mood_entry::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }
}
