//! Support group entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Support group - a topic-based group users can join up to its capacity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_group")]
pub struct Model {
    /// Stable slug, e.g. `aa`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name.
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Emotion labels this group is matched against.
    #[sea_orm(column_type = "JsonBinary")]
    pub indicators: Json,

    /// Meeting times as display strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub meeting_times: Json,

    /// Resource labels.
    #[sea_orm(column_type = "JsonBinary")]
    pub resources: Json,

    /// Maximum number of members.
    pub capacity: i32,

    /// Number of members (denormalized, kept within `0..=capacity`).
    #[sea_orm(default_value = 0)]
    pub current_members: i32,

    /// Inactive groups are hidden and cannot be joined.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// User who created the group; `None` for seeded groups.
    pub facilitator_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Free places left in the group.
    #[must_use]
    pub fn spots_available(&self) -> i32 {
        (self.capacity - self.current_members).max(0)
    }

    /// Indicator emotion labels.
    #[must_use]
    pub fn indicator_labels(&self) -> Vec<String> {
        super::json_labels(&self.indicators)
    }

    /// Meeting time strings.
    #[must_use]
    pub fn meeting_time_labels(&self) -> Vec<String> {
        super::json_labels(&self.meeting_times)
    }

    /// Resource labels.
    #[must_use]
    pub fn resource_labels(&self) -> Vec<String> {
        super::json_labels(&self.resources)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_membership::Entity")]
    Memberships,
}

impl Related<super::group_membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
