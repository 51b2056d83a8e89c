//! Group membership entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a membership.
///
/// Only `Active` is written today; `Pending` and `Inactive` are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl Default for MembershipStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Links a user to a support group. Unique per (user, group).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_membership")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub group_id: String,

    pub status: MembershipStatus,

    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::support_group::Entity",
        from = "Column::GroupId",
        to = "super::support_group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::support_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
