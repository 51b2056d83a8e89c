//! Mood journal service.

use chrono::{DateTime, Utc};
use mindful_common::{AppError, AppResult, IdGenerator, config::JournalConfig};
use mindful_db::entities::{labels_json, mood_entry};
use mindful_db::repositories::MoodEntryRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

/// Maximum number of labels per list.
pub const MAX_LABELS: usize = 20;

/// Maximum length of a single label, in characters.
pub const MAX_LABEL_CHARS: usize = 64;

/// Input for submitting a mood entry.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMoodEntryInput {
    #[serde(alias = "moodLevel")]
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: i32,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub notes: String,
    /// When the mood was felt; defaults to now.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Mood entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntryResponse {
    pub id: String,
    pub score: i32,
    pub emotions: Vec<String>,
    pub activities: Vec<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl From<mood_entry::Model> for MoodEntryResponse {
    fn from(model: mood_entry::Model) -> Self {
        Self {
            emotions: model.emotion_labels(),
            activities: model.activity_labels(),
            id: model.id,
            score: model.mood_score,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Trim labels, drop empty ones and remove duplicates, keeping the first
/// occurrence.
pub fn normalize_labels(field: &str, labels: &[String]) -> AppResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());

    for label in labels {
        let label = label.trim();
        if label.is_empty() || out.iter().any(|l| l == label) {
            continue;
        }
        if label.chars().count() > MAX_LABEL_CHARS {
            return Err(AppError::Validation(format!(
                "{field}: labels are limited to {MAX_LABEL_CHARS} characters"
            )));
        }
        out.push(label.to_string());
    }

    if out.len() > MAX_LABELS {
        return Err(AppError::Validation(format!(
            "{field}: at most {MAX_LABELS} labels are allowed"
        )));
    }

    Ok(out)
}

/// Service for writing and reading journal entries.
#[derive(Clone)]
pub struct MoodService {
    entry_repo: MoodEntryRepository,
    id_gen: IdGenerator,
    default_limit: u64,
    max_limit: u64,
}

impl MoodService {
    /// Create a new mood service.
    #[must_use]
    pub fn new(entry_repo: MoodEntryRepository, journal: &JournalConfig) -> Self {
        Self {
            entry_repo,
            id_gen: IdGenerator::new(),
            default_limit: journal.default_entry_limit,
            max_limit: journal.max_entry_limit,
        }
    }

    /// Validate and store a new entry.
    pub async fn submit(
        &self,
        user_id: &str,
        input: SubmitMoodEntryInput,
    ) -> AppResult<mood_entry::Model> {
        input.validate()?;

        let emotions = normalize_labels("emotions", &input.emotions)?;
        if emotions.is_empty() {
            return Err(AppError::Validation(
                "emotions: at least one emotion is required".to_string(),
            ));
        }
        let activities = normalize_labels("activities", &input.activities)?;

        let now = Utc::now();
        let recorded_at = match input.recorded_at {
            Some(at) if at > now => {
                return Err(AppError::Validation(
                    "recordedAt: cannot be in the future".to_string(),
                ));
            }
            Some(at) => at,
            None => now,
        };

        let model = mood_entry::ActiveModel {
            id: Set(self.id_gen.generate_at(recorded_at)),
            user_id: Set(user_id.to_string()),
            mood_score: Set(input.score),
            emotions: Set(labels_json(&emotions)),
            activities: Set(labels_json(&activities)),
            notes: Set(input.notes.trim().to_string()),
            created_at: Set(recorded_at.into()),
        };

        let entry = self.entry_repo.create(model).await?;

        info!(
            user_id = %user_id,
            entry_id = %entry.id,
            score = entry.mood_score,
            "Mood entry submitted"
        );

        Ok(entry)
    }

    /// List the user's entries, newest first.
    ///
    /// A missing limit uses the configured default; larger limits are capped.
    pub async fn list(&self, user_id: &str, limit: Option<u64>) -> AppResult<Vec<mood_entry::Model>> {
        let limit = limit
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
            .max(1);

        debug!(user_id = %user_id, limit, "Listing mood entries");

        self.entry_repo.find_recent_by_user(user_id, limit).await
    }
}
