//! Mood entry entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One journal record: a mood score with emotion and activity tags.
///
/// Entries are immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mood_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning user (issued by the external auth provider).
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Mood score, 1 through 10.
    pub mood_score: i32,

    /// Emotion labels (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub emotions: Json,

    /// Activity labels (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub activities: Json,

    /// Free-text notes, possibly empty.
    #[sea_orm(column_type = "Text")]
    pub notes: String,

    /// When the mood was recorded.
    #[sea_orm(indexed)]
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Emotion labels in submission order.
    #[must_use]
    pub fn emotion_labels(&self) -> Vec<String> {
        super::json_labels(&self.emotions)
    }

    /// Activity labels in submission order.
    #[must_use]
    pub fn activity_labels(&self) -> Vec<String> {
        super::json_labels(&self.activities)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
