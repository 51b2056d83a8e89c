//! Support group service.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use mindful_common::{AppError, AppResult, IdGenerator};
use mindful_db::entities::group_membership::MembershipStatus;
use mindful_db::entities::{group_membership, labels_json, support_group};
use mindful_db::repositories::{MoodEntryRepository, SupportGroupRepository};
use mindful_db::seed;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use super::mood::normalize_labels;

/// Number of recent entries whose emotions drive recommendations.
const RECOMMENDATION_ENTRIES: u64 = 7;

/// Input for creating a support group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupportGroupInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub description: String,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub meeting_times: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[validate(range(min = 1, max = 1000, message = "capacity must be between 1 and 1000"))]
    pub capacity: i32,
}

/// Support group as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportGroupResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub indicators: Vec<String>,
    pub meeting_times: Vec<String>,
    pub resources: Vec<String>,
    pub capacity: i32,
    pub current_members: i32,
    pub spots_available: i32,
    pub is_active: bool,
}

impl From<support_group::Model> for SupportGroupResponse {
    fn from(model: support_group::Model) -> Self {
        Self {
            indicators: model.indicator_labels(),
            meeting_times: model.meeting_time_labels(),
            resources: model.resource_labels(),
            spots_available: model.spots_available(),
            id: model.id,
            name: model.name,
            description: model.description,
            capacity: model.capacity,
            current_members: model.current_members,
            is_active: model.is_active,
        }
    }
}

/// Membership as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<group_membership::Model> for MembershipResponse {
    fn from(model: group_membership::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            group_id: model.group_id,
            status: model.status,
            joined_at: model.joined_at.with_timezone(&Utc),
        }
    }
}

/// Result of joining a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupResponse {
    pub membership: MembershipResponse,
    pub current_members: i32,
    pub spots_available: i32,
}

/// Result of leaving a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupResponse {
    pub current_members: i32,
    pub spots_available: i32,
}

/// A group ranked against the user's recent emotions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecommendation {
    #[serde(flatten)]
    pub group: SupportGroupResponse,
    /// Share of the group's indicators found in the user's recent emotions.
    pub match_percentage: u32,
    pub matched_indicators: Vec<String>,
}

/// Percentage of `indicators` present in `emotions`, rounded.
#[must_use]
pub fn match_percentage(emotions: &BTreeSet<String>, indicators: &[String]) -> (u32, Vec<String>) {
    if emotions.is_empty() || indicators.is_empty() {
        return (0, vec![]);
    }

    let matched: Vec<String> = indicators
        .iter()
        .filter(|i| emotions.contains(i.as_str()))
        .cloned()
        .collect();
    let pct = (matched.len() as f64 / indicators.len() as f64 * 100.0).round() as u32;

    (pct, matched)
}

/// Rank groups by match percentage, ties broken by group ID.
#[must_use]
pub fn rank_groups(
    emotions: &BTreeSet<String>,
    groups: Vec<support_group::Model>,
) -> Vec<GroupRecommendation> {
    let mut ranked: Vec<GroupRecommendation> = groups
        .into_iter()
        .map(|group| {
            let (match_percentage, matched_indicators) =
                match_percentage(emotions, &group.indicator_labels());
            GroupRecommendation {
                group: group.into(),
                match_percentage,
                matched_indicators,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.match_percentage
            .cmp(&a.match_percentage)
            .then_with(|| a.group.id.cmp(&b.group.id))
    });

    ranked
}

/// Service for the group registry and the membership ledger.
#[derive(Clone)]
pub struct SupportGroupService {
    group_repo: SupportGroupRepository,
    entry_repo: MoodEntryRepository,
    id_gen: IdGenerator,
}

impl SupportGroupService {
    /// Create a new support group service.
    #[must_use]
    pub const fn new(group_repo: SupportGroupRepository, entry_repo: MoodEntryRepository) -> Self {
        Self {
            group_repo,
            entry_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// All active groups.
    pub async fn list_all(&self) -> AppResult<Vec<support_group::Model>> {
        self.group_repo.find_active().await
    }

    /// Groups the user is an active member of, in join order.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<support_group::Model>> {
        debug!(user_id = %user_id, "Listing joined groups");
        self.group_repo.find_joined_by_user(user_id).await
    }

    /// Create an active, empty group facilitated by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateSupportGroupInput,
    ) -> AppResult<support_group::Model> {
        input.validate()?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name: cannot be blank".to_string()));
        }

        let model = support_group::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            description: Set(input.description.trim().to_string()),
            indicators: Set(labels_json(&normalize_labels("indicators", &input.indicators)?)),
            meeting_times: Set(labels_json(&normalize_labels(
                "meetingTimes",
                &input.meeting_times,
            )?)),
            resources: Set(labels_json(&normalize_labels("resources", &input.resources)?)),
            capacity: Set(input.capacity),
            current_members: Set(0),
            is_active: Set(true),
            facilitator_id: Set(Some(user_id.to_string())),
            created_at: Set(Utc::now().into()),
        };

        let group = self.group_repo.create(model).await?;

        info!(
            user_id = %user_id,
            group_id = %group.id,
            capacity = group.capacity,
            "Support group created"
        );

        Ok(group)
    }

    /// Deactivate a group. Only its facilitator may do so; seeded groups
    /// have none.
    pub async fn deactivate(&self, user_id: &str, group_id: &str) -> AppResult<support_group::Model> {
        let group = self
            .group_repo
            .find_by_id(group_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Support group not found: {group_id}")))?;

        if group.facilitator_id.as_deref() != Some(user_id) {
            return Err(AppError::Forbidden(format!(
                "Only the facilitator can deactivate {group_id}"
            )));
        }

        let group = self.group_repo.deactivate(group_id).await?;

        info!(user_id = %user_id, group_id = %group_id, "Support group deactivated");

        Ok(group)
    }

    /// Join a group.
    pub async fn join(&self, user_id: &str, group_id: &str) -> AppResult<JoinGroupResponse> {
        let result = self
            .group_repo
            .join(&self.id_gen.generate(), user_id, group_id, Utc::now())
            .await;

        let joined = match result {
            Ok(joined) => joined,
            Err(e @ (AppError::AlreadyMember(_) | AppError::AtCapacity(_))) => {
                warn!(user_id = %user_id, group_id = %group_id, error = %e, "Join rejected");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        info!(
            user_id = %user_id,
            group_id = %group_id,
            current_members = joined.group.current_members,
            "Joined support group"
        );

        Ok(JoinGroupResponse {
            current_members: joined.group.current_members,
            spots_available: joined.group.spots_available(),
            membership: joined.membership.into(),
        })
    }

    /// Leave a group. Fails with `NotFound` when the user is not a member.
    pub async fn leave(&self, user_id: &str, group_id: &str) -> AppResult<LeaveGroupResponse> {
        let group = self.group_repo.leave(user_id, group_id).await?;

        info!(
            user_id = %user_id,
            group_id = %group_id,
            current_members = group.current_members,
            "Left support group"
        );

        Ok(LeaveGroupResponse {
            current_members: group.current_members,
            spots_available: group.spots_available(),
        })
    }

    /// Active groups ranked against the emotions of the user's recent entries.
    pub async fn recommend(&self, user_id: &str) -> AppResult<Vec<GroupRecommendation>> {
        let entries = self
            .entry_repo
            .find_recent_by_user(user_id, RECOMMENDATION_ENTRIES)
            .await?;
        let emotions: BTreeSet<String> = entries.iter().flat_map(|e| e.emotion_labels()).collect();

        let groups = self.group_repo.find_active().await?;

        debug!(
            user_id = %user_id,
            emotions = emotions.len(),
            groups = groups.len(),
            "Ranking support groups"
        );

        Ok(rank_groups(&emotions, groups))
    }

    /// Insert the default groups that are missing.
    pub async fn seed_defaults(&self) -> AppResult<u64> {
        let inserted = self
            .group_repo
            .insert_missing(seed::default_group_models())
            .await?;

        info!(inserted, "Seeded default support groups");

        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_group(id: &str, indicators: &[&str], capacity: i32, current: i32) -> support_group::Model {
        support_group::Model {
            id: id.to_string(),
            name: format!("Group {id}"),
            description: String::new(),
            indicators: json!(indicators),
            meeting_times: json!(["Daily 6PM"]),
            resources: json!([]),
            capacity,
            current_members: current,
            is_active: true,
            facilitator_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_membership(user_id: &str, group_id: &str) -> group_membership::Model {
        group_membership::Model {
            id: "m1".to_string(),
            user_id: user_id.to_string(),
            group_id: group_id.to_string(),
            status: MembershipStatus::Active,
            joined_at: Utc::now().into(),
        }
    }

    fn emotions(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn service(groups: MockDatabase, entries: MockDatabase) -> SupportGroupService {
        SupportGroupService::new(
            SupportGroupRepository::new(Arc::new(groups.into_connection())),
            MoodEntryRepository::new(Arc::new(entries.into_connection())),
        )
    }

    #[test]
    fn test_match_percentage() {
        let indicators: Vec<String> = vec!["Stressed".into(), "Overwhelmed".into(), "Tired".into()];

        let (pct, matched) = match_percentage(&emotions(&["Tired", "Happy", "Stressed"]), &indicators);
        assert_eq!(pct, 67);
        assert_eq!(matched, vec!["Stressed", "Tired"]);

        assert_eq!(match_percentage(&emotions(&[]), &indicators).0, 0);
        assert_eq!(match_percentage(&emotions(&["Tired"]), &[]).0, 0);
    }

    #[test]
    fn test_rank_groups_breaks_ties_by_id() {
        let groups = vec![
            create_test_group("na", &["Anxious", "Overwhelmed", "Tired"], 30, 0),
            create_test_group("aa", &["Stressed", "Overwhelmed", "Tired"], 30, 0),
            create_test_group("cga", &["Angry", "Stressed", "Anxious"], 20, 0),
        ];

        let ranked = rank_groups(&emotions(&["Tired", "Overwhelmed"]), groups);
        let ids: Vec<&str> = ranked.iter().map(|r| r.group.id.as_str()).collect();

        assert_eq!(ids, vec!["aa", "na", "cga"]);
        assert_eq!(ranked[0].match_percentage, 67);
        assert_eq!(ranked[2].match_percentage, 0);
    }

    #[test]
    fn test_group_response_from_model() {
        let response = SupportGroupResponse::from(create_test_group("aa", &["Tired"], 30, 25));

        assert_eq!(response.spots_available, 5);
        assert_eq!(response.indicators, vec!["Tired"]);
        assert_eq!(response.meeting_times, vec!["Daily 6PM"]);
    }

    #[tokio::test]
    async fn test_join_reports_spots() {
        let groups = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_group("aa", &["Tired"], 30, 25)]])
            .append_query_results([Vec::<group_membership::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[create_test_membership("user1", "aa")]])
            .append_query_results([[create_test_group("aa", &["Tired"], 30, 26)]]);
        let service = service(groups, MockDatabase::new(DatabaseBackend::Postgres));

        let joined = service.join("user1", "aa").await.unwrap();

        assert_eq!(joined.current_members, 26);
        assert_eq!(joined.spots_available, 4);
        assert_eq!(joined.membership.status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn test_join_twice_fails() {
        let groups = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_group("aa", &["Tired"], 30, 26)]])
            .append_query_results([[create_test_membership("user1", "aa")]]);
        let service = service(groups, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.join("user1", "aa").await;

        assert!(matches!(result, Err(AppError::AlreadyMember(_))));
    }

    #[tokio::test]
    async fn test_leave_reports_spots() {
        let groups = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .append_query_results([[create_test_group("aa", &["Tired"], 30, 24)]]);
        let service = service(groups, MockDatabase::new(DatabaseBackend::Postgres));

        let left = service.leave("user1", "aa").await.unwrap();

        assert_eq!(
            left,
            LeaveGroupResponse {
                current_members: 24,
                spots_available: 6,
            }
        );
    }

    #[tokio::test]
    async fn test_recommend_uses_recent_emotions() {
        let entries = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            mindful_db::entities::mood_entry::Model {
                id: "e1".to_string(),
                user_id: "user1".to_string(),
                mood_score: 3,
                emotions: json!(["Angry", "Stressed"]),
                activities: json!([]),
                notes: String::new(),
                created_at: Utc::now().into(),
            },
        ]]);
        let groups = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_group("aa", &["Stressed", "Overwhelmed", "Tired"], 30, 25),
            create_test_group("anger", &["Angry", "Stressed", "Overwhelmed"], 20, 16),
        ]]);
        let service = service(groups, entries);

        let ranked = service.recommend("user1").await.unwrap();

        assert_eq!(ranked[0].group.id, "anger");
        assert_eq!(ranked[0].match_percentage, 67);
        assert_eq!(ranked[0].group.spots_available, 4);
        assert_eq!(ranked[1].match_percentage, 33);
    }

    fn create_input(value: serde_json::Value) -> CreateSupportGroupInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_group_is_active_and_empty() {
        let mut stored = create_test_group("g1", &["Lonely"], 12, 0);
        stored.facilitator_id = Some("user1".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored]]);
        let service = service(db, MockDatabase::new(DatabaseBackend::Postgres));

        let group = service
            .create(
                "user1",
                create_input(json!({
                    "name": "  Evening circle ",
                    "indicators": ["Lonely", " Lonely "],
                    "meetingTimes": ["Friday 8PM"],
                    "capacity": 12
                })),
            )
            .await
            .unwrap();

        assert!(group.is_active);
        assert_eq!(group.current_members, 0);
        assert_eq!(group.facilitator_id.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_create_group_rejects_bad_input() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        for body in [
            json!({ "name": "Circle", "capacity": 0 }),
            json!({ "name": "Circle", "capacity": -3 }),
            json!({ "name": "", "capacity": 10 }),
            json!({ "name": "   ", "capacity": 10 }),
        ] {
            let result = service.create("user1", create_input(body)).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_deactivate_by_facilitator() {
        let mut group = create_test_group("g1", &["Lonely"], 12, 3);
        group.facilitator_id = Some("user1".to_string());
        let mut after = group.clone();
        after.is_active = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[group]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[after]]);
        let service = service(db, MockDatabase::new(DatabaseBackend::Postgres));

        let group = service.deactivate("user1", "g1").await.unwrap();

        assert!(!group.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_by_other_user_is_forbidden() {
        let mut group = create_test_group("g1", &["Lonely"], 12, 3);
        group.facilitator_id = Some("user1".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[group]]);
        let service = service(db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.deactivate("user2", "g1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_deactivate_seeded_group_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_group("aa", &["Tired"], 30, 2)]]);
        let service = service(db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.deactivate("user1", "aa").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_join_deactivated_group_is_not_found() {
        // The active-group lookup finds nothing once the flag is cleared
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<support_group::Model>::new()]);
        let service = service(db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.join("user1", "g1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
