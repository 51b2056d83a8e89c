//! Support group repository.
//!
//! Owns the group registry and the membership ledger. The member counter on
//! `support_group` is only ever changed here, inside the same transaction as
//! the membership row it accounts for.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mindful_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::entities::group_membership::MembershipStatus;
use crate::entities::{GroupMembership, SupportGroup, group_membership, support_group};

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinedGroup {
    /// The new membership record.
    pub membership: group_membership::Model,
    /// The group as it stands after the join.
    pub group: support_group::Model,
}

/// Repository for support group and membership operations.
#[derive(Clone)]
pub struct SupportGroupRepository {
    db: Arc<DatabaseConnection>,
}

impl SupportGroupRepository {
    /// Create a new support group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Group Operations ====================

    /// Find group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<support_group::Model>> {
        SupportGroup::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Find all active groups, ordered by ID.
    pub async fn find_active(&self) -> AppResult<Vec<support_group::Model>> {
        SupportGroup::find()
            .filter(support_group::Column::IsActive.eq(true))
            .order_by(support_group::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Find active groups the user holds an active membership in, oldest
    /// membership first.
    pub async fn find_joined_by_user(&self, user_id: &str) -> AppResult<Vec<support_group::Model>> {
        let memberships = GroupMembership::find()
            .filter(group_membership::Column::UserId.eq(user_id))
            .filter(group_membership::Column::Status.eq(MembershipStatus::Active))
            .order_by(group_membership::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        if memberships.is_empty() {
            return Ok(vec![]);
        }

        let groups = SupportGroup::find()
            .filter(
                support_group::Column::Id
                    .is_in(memberships.iter().map(|m| m.group_id.as_str())),
            )
            .filter(support_group::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        // Restore join order
        let mut by_id: HashMap<String, support_group::Model> =
            groups.into_iter().map(|g| (g.id.clone(), g)).collect();

        Ok(memberships
            .iter()
            .filter_map(|m| by_id.remove(&m.group_id))
            .collect())
    }

    /// Insert groups whose ID is not taken yet. Returns the number inserted.
    pub async fn insert_missing(&self, models: Vec<support_group::ActiveModel>) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        SupportGroup::insert_many(models)
            .on_conflict(
                OnConflict::column(support_group::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Insert a new group.
    pub async fn create(&self, model: support_group::ActiveModel) -> AppResult<support_group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    /// Mark an active group inactive. Memberships are left in place.
    pub async fn deactivate(&self, group_id: &str) -> AppResult<support_group::Model> {
        let result = SupportGroup::update_many()
            .col_expr(support_group::Column::IsActive, Expr::value(false))
            .filter(support_group::Column::Id.eq(group_id))
            .filter(support_group::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Support group not found: {group_id}")));
        }

        self.find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Support group not found: {group_id}")))
    }

    // ==================== Membership Operations ====================

    /// Add a membership and take one capacity slot, atomically.
    ///
    /// The slot is taken with a single conditional update
    /// (`current_members < capacity`), so concurrent joins can never push the
    /// counter past capacity. A unique violation on insert means a concurrent
    /// join by the same user won the race.
    pub async fn join(
        &self,
        membership_id: &str,
        user_id: &str,
        group_id: &str,
        joined_at: DateTime<Utc>,
    ) -> AppResult<JoinedGroup> {
        let txn = self.db.begin().await?;

        SupportGroup::find_by_id(group_id)
            .filter(support_group::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Support group not found: {group_id}")))?;

        let existing = GroupMembership::find()
            .filter(group_membership::Column::UserId.eq(user_id))
            .filter(group_membership::Column::GroupId.eq(group_id))
            .one(&txn)
            .await?;

        if existing.is_some() {
            return Err(AppError::AlreadyMember(group_id.to_string()));
        }

        let taken = SupportGroup::update_many()
            .col_expr(
                support_group::Column::CurrentMembers,
                Expr::col(support_group::Column::CurrentMembers).add(1),
            )
            .filter(support_group::Column::Id.eq(group_id))
            .filter(support_group::Column::IsActive.eq(true))
            .filter(
                Expr::col(support_group::Column::CurrentMembers)
                    .lt(Expr::col(support_group::Column::Capacity)),
            )
            .exec(&txn)
            .await?;

        if taken.rows_affected == 0 {
            return Err(AppError::AtCapacity(group_id.to_string()));
        }

        let model = group_membership::ActiveModel {
            id: Set(membership_id.to_string()),
            user_id: Set(user_id.to_string()),
            group_id: Set(group_id.to_string()),
            status: Set(MembershipStatus::Active),
            joined_at: Set(joined_at.into()),
        };

        let membership = model.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::AlreadyMember(group_id.to_string())
            }
            _ => AppError::StorageUnavailable(e.to_string()),
        })?;

        let group = SupportGroup::find_by_id(group_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Support group not found: {group_id}")))?;

        txn.commit().await?;

        debug!(
            user_id = %user_id,
            group_id = %group_id,
            current_members = group.current_members,
            "Membership created"
        );

        Ok(JoinedGroup { membership, group })
    }

    /// Remove a membership and release its slot, atomically.
    ///
    /// Returns the group as it stands after the leave.
    pub async fn leave(&self, user_id: &str, group_id: &str) -> AppResult<support_group::Model> {
        let txn = self.db.begin().await?;

        let deleted = GroupMembership::delete_many()
            .filter(group_membership::Column::UserId.eq(user_id))
            .filter(group_membership::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "Not a member of support group: {group_id}"
            )));
        }

        SupportGroup::update_many()
            .col_expr(
                support_group::Column::CurrentMembers,
                Expr::cust("GREATEST(current_members - 1, 0)"),
            )
            .filter(support_group::Column::Id.eq(group_id))
            .exec(&txn)
            .await?;

        let group = SupportGroup::find_by_id(group_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Support group not found: {group_id}")))?;

        txn.commit().await?;

        debug!(
            user_id = %user_id,
            group_id = %group_id,
            current_members = group.current_members,
            "Membership removed"
        );

        Ok(group)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_group(id: &str, capacity: i32, current_members: i32) -> support_group::Model {
        support_group::Model {
            id: id.to_string(),
            name: format!("Group {id}"),
            description: "A test group".to_string(),
            indicators: json!(["Stressed", "Tired"]),
            meeting_times: json!(["Monday 7PM"]),
            resources: json!(["Peer Support"]),
            capacity,
            current_members,
            is_active: true,
            facilitator_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_membership(id: &str, user_id: &str, group_id: &str) -> group_membership::Model {
        group_membership::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            group_id: group_id.to_string(),
            status: MembershipStatus::Active,
            joined_at: Utc::now().into(),
        }
    }

    const fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let group = create_test_group("aa", 30, 25);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group.clone()]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.find_by_id("aa").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().spots_available(), 5);
    }

    #[tokio::test]
    async fn test_find_joined_by_user_keeps_join_order() {
        let first = create_test_membership("m1", "user1", "na");
        let second = create_test_membership("m2", "user1", "aa");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[first, second]])
                // Groups come back in storage order, not join order
                .append_query_results([[create_test_group("aa", 30, 1), create_test_group("na", 30, 1)]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let groups = repo.find_joined_by_user("user1").await.unwrap();

        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["na", "aa"]);
    }

    #[tokio::test]
    async fn test_find_joined_by_user_without_memberships() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group_membership::Model>::new()])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let groups = repo.find_joined_by_user("user1").await.unwrap();

        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_join_takes_a_slot() {
        let before = create_test_group("aa", 30, 25);
        let after = create_test_group("aa", 30, 26);
        let membership = create_test_membership("m1", "user1", "aa");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[before]])
                .append_query_results([Vec::<group_membership::Model>::new()])
                .append_exec_results([exec(1)])
                .append_query_results([[membership]])
                .append_query_results([[after]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let joined = repo.join("m1", "user1", "aa", Utc::now()).await.unwrap();

        assert_eq!(joined.membership.status, MembershipStatus::Active);
        assert_eq!(joined.group.current_members, 26);
        assert_eq!(joined.group.spots_available(), 4);
    }

    #[tokio::test]
    async fn test_join_missing_group() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<support_group::Model>::new()])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.join("m1", "user1", "nope", Utc::now()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_join_twice_is_already_member() {
        let group = create_test_group("aa", 30, 26);
        let existing = create_test_membership("m1", "user1", "aa");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group]])
                .append_query_results([[existing]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.join("m2", "user1", "aa", Utc::now()).await;

        assert!(matches!(result, Err(AppError::AlreadyMember(_))));
    }

    #[tokio::test]
    async fn test_join_full_group_is_at_capacity() {
        let group = create_test_group("cga", 20, 20);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group]])
                .append_query_results([Vec::<group_membership::Model>::new()])
                // Conditional increment matched no row
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.join("m1", "user1", "cga", Utc::now()).await;

        assert!(matches!(result, Err(AppError::AtCapacity(_))));
    }

    #[tokio::test]
    async fn test_leave_releases_a_slot() {
        let after = create_test_group("aa", 30, 25);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([[after]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let group = repo.leave("user1", "aa").await.unwrap();

        assert_eq!(group.current_members, 25);
    }

    #[tokio::test]
    async fn test_leave_without_membership_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.leave("user1", "aa").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_missing_with_nothing_to_insert() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = SupportGroupRepository::new(db);
        assert_eq!(repo.insert_missing(vec![]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deactivate_hides_group() {
        let mut after = create_test_group("aa", 30, 25);
        after.is_active = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[after]])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let group = repo.deactivate("aa").await.unwrap();

        assert!(!group.is_active);
        assert_eq!(group.current_members, 25);
    }

    #[tokio::test]
    async fn test_deactivate_inactive_group_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = SupportGroupRepository::new(db);
        let result = repo.deactivate("aa").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
