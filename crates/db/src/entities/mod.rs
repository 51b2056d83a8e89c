//! Database entities.

pub mod group_membership;
pub mod mood_entry;
pub mod support_group;

pub use group_membership::Entity as GroupMembership;
pub use mood_entry::Entity as MoodEntry;
pub use support_group::Entity as SupportGroup;

use sea_orm::entity::prelude::Json;

/// Read a JSON array column as a list of labels, skipping non-string items.
#[must_use]
pub fn json_labels(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Store a list of labels as a JSON array column.
#[must_use]
pub fn labels_json(labels: &[String]) -> Json {
    Json::Array(labels.iter().cloned().map(Json::String).collect())
}
