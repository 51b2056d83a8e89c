//! Default support groups.
//!
//! Inserted at startup when absent. Existing rows are never touched, so
//! member counts and deactivations survive a restart.

use chrono::Utc;
use sea_orm::Set;

use crate::entities::{labels_json, support_group};

/// Definition of a default support group.
#[derive(Debug, Clone, Copy)]
pub struct GroupSeed {
    /// Stable slug.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Emotion labels the group is matched against.
    pub indicators: &'static [&'static str],
    /// Meeting schedule.
    pub meeting_times: &'static [&'static str],
    /// Resources offered.
    pub resources: &'static [&'static str],
    /// Maximum number of members.
    pub capacity: i32,
}

/// The default groups.
pub const DEFAULT_GROUPS: &[GroupSeed] = &[
    GroupSeed {
        id: "cga",
        name: "Criminal & Gang Anonymous (CGA)",
        description: "Support for individuals seeking to leave criminal lifestyles and gang affiliations.",
        indicators: &["Angry", "Stressed", "Anxious"],
        meeting_times: &["Monday 7PM", "Thursday 7PM"],
        resources: &["Counseling", "Job Training", "Legal Aid"],
        capacity: 20,
    },
    GroupSeed {
        id: "aa",
        name: "Alcoholics Anonymous (AA)",
        description: "Support for individuals recovering from alcohol addiction.",
        indicators: &["Stressed", "Overwhelmed", "Tired"],
        meeting_times: &["Daily 6PM", "Saturday 10AM"],
        resources: &["12-Step Program", "Sponsor System", "Recovery Literature"],
        capacity: 30,
    },
    GroupSeed {
        id: "na",
        name: "Narcotics Anonymous (NA)",
        description: "Support for individuals recovering from drug addiction.",
        indicators: &["Anxious", "Overwhelmed", "Tired"],
        meeting_times: &["Daily 8PM", "Sunday 11AM"],
        resources: &["Recovery Program", "Peer Support", "Crisis Hotline"],
        capacity: 30,
    },
    GroupSeed {
        id: "eid",
        name: "Emotional Intelligence Development",
        description: "Learn to understand and manage emotions effectively.",
        indicators: &["Stressed", "Overwhelmed", "Sad"],
        meeting_times: &["Tuesday 6PM", "Saturday 2PM"],
        resources: &["Workshops", "Personal Development", "Mindfulness Training"],
        capacity: 25,
    },
    GroupSeed {
        id: "anger",
        name: "Anger Management",
        description: "Develop skills to manage anger and aggressive responses.",
        indicators: &["Angry", "Stressed", "Overwhelmed"],
        meeting_times: &["Wednesday 7PM", "Saturday 3PM"],
        resources: &["Coping Strategies", "Stress Management", "Communication Skills"],
        capacity: 20,
    },
];

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| (*s).to_string()).collect()
}

impl GroupSeed {
    /// Build an insertable row with no members.
    #[must_use]
    pub fn to_active_model(&self) -> support_group::ActiveModel {
        support_group::ActiveModel {
            id: Set(self.id.to_string()),
            name: Set(self.name.to_string()),
            description: Set(self.description.to_string()),
            indicators: Set(labels_json(&owned(self.indicators))),
            meeting_times: Set(labels_json(&owned(self.meeting_times))),
            resources: Set(labels_json(&owned(self.resources))),
            capacity: Set(self.capacity),
            current_members: Set(0),
            is_active: Set(true),
            facilitator_id: Set(None),
            created_at: Set(Utc::now().into()),
        }
    }
}

/// Insertable rows for every default group.
#[must_use]
pub fn default_group_models() -> Vec<support_group::ActiveModel> {
    DEFAULT_GROUPS.iter().map(GroupSeed::to_active_model).collect()
}
