//! Mood analytics aggregation.
//!
//! Everything here except [`AnalyticsService`] is a pure function of a
//! fetched entry set. The service reads one window of entries and derives
//! every output from that single snapshot.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Months, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use mindful_common::{AppError, AppResult};
use mindful_db::entities::mood_entry;
use mindful_db::repositories::MoodEntryRepository;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::insight::{self, Insights};

/// Time range analytics are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// The caller's local calendar day.
    Day,
    /// The 7 days ending now.
    #[default]
    Week,
    /// The calendar month ending now.
    Month,
}

impl WindowKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Order of the mood series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrder {
    /// For charting.
    #[default]
    OldestFirst,
    /// For "recent entries" lists.
    NewestFirst,
}

/// Resolve a local wall-clock time to an instant.
///
/// Times skipped by a DST transition resolve to the first valid time after
/// the gap.
fn local_instant<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map_or_else(
            || Utc.from_utc_datetime(&naive),
            |dt| dt.with_timezone(&Utc),
        )
}

/// Compute the inclusive `[start, end]` range for a window ending at `now`.
///
/// `now` carries the caller's timezone, which only matters for `Day`.
#[must_use]
pub fn window_bounds<Z: TimeZone>(kind: WindowKind, now: &DateTime<Z>) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = now.with_timezone(&Utc);

    match kind {
        WindowKind::Day => {
            let tz = now.timezone();
            let midnight = now.date_naive().and_time(NaiveTime::MIN);
            let start = local_instant(&tz, midnight);
            let next = local_instant(&tz, midnight + Duration::days(1));
            (start, next - Duration::milliseconds(1))
        }
        WindowKind::Week => (end - Duration::days(7), end),
        WindowKind::Month => {
            let start = now
                .clone()
                .checked_sub_months(Months::new(1))
                .map_or_else(|| end - Duration::days(30), |dt| dt.with_timezone(&Utc));
            (start, end)
        }
    }
}

/// Parse an IANA timezone name, falling back to `default` when absent.
pub fn resolve_timezone(name: Option<&str>, default: &str) -> AppResult<Tz> {
    let name = name.map_or(default, str::trim);
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone: {name}")))
}

/// One point of the mood chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub score: i32,
}

/// Headline numbers for a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub total_entries: usize,
    pub average_mood: Option<f64>,
    pub latest_score: Option<i32>,
    pub dominant_emotion: Option<String>,
}

/// Entry counts per mood band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodDistribution {
    /// Scores 1-2.
    pub very_low: u64,
    /// Scores 3-4.
    pub low: u64,
    /// Score 5.
    pub neutral: u64,
    /// Scores 6-7.
    pub good: u64,
    /// Scores 8-10.
    pub great: u64,
}

impl MoodDistribution {
    fn record(&mut self, score: i32) {
        match score {
            i32::MIN..=2 => self.very_low += 1,
            3..=4 => self.low += 1,
            5 => self.neutral += 1,
            6..=7 => self.good += 1,
            _ => self.great += 1,
        }
    }

    /// Total entries counted.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.very_low + self.low + self.neutral + self.good + self.great
    }
}

/// Full analytics for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnalytics {
    pub window: WindowKind,
    pub timezone: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub series: Vec<SeriesPoint>,
    pub emotion_counts: BTreeMap<String, u64>,
    pub activity_impact: BTreeMap<String, f64>,
    pub summary: MoodSummary,
    pub distribution: MoodDistribution,
}

fn chronological(entries: &[mood_entry::Model]) -> Vec<&mood_entry::Model> {
    let mut sorted: Vec<&mood_entry::Model> = entries.iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Distinct labels of one entry.
fn distinct(labels: Vec<String>) -> BTreeSet<String> {
    labels.into_iter().collect()
}

/// The chronological `(timestamp, score)` series in the requested order.
#[must_use]
pub fn mood_series(entries: &[mood_entry::Model], order: SeriesOrder) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = chronological(entries)
        .into_iter()
        .map(|e| SeriesPoint {
            timestamp: e.created_at.with_timezone(&Utc),
            score: e.mood_score,
        })
        .collect();

    if order == SeriesOrder::NewestFirst {
        series.reverse();
    }

    series
}

/// Occurrences of each emotion label; an entry counts each label once.
#[must_use]
pub fn emotion_counts(entries: &[mood_entry::Model]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        for label in distinct(entry.emotion_labels()) {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    counts
}

/// Mean score of the entries tagged with each activity.
#[must_use]
pub fn activity_impact(entries: &[mood_entry::Model]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (i64, u64)> = BTreeMap::new();
    for entry in entries {
        for label in distinct(entry.activity_labels()) {
            let (sum, count) = sums.entry(label).or_insert((0, 0));
            *sum += i64::from(entry.mood_score);
            *count += 1;
        }
    }

    sums.into_iter()
        .map(|(label, (sum, count))| (label, sum as f64 / count as f64))
        .collect()
}

/// Most frequent label; ties go to the alphabetically first.
#[must_use]
pub fn dominant_label(counts: &BTreeMap<String, u64>) -> Option<(&str, u64)> {
    let mut best: Option<(&str, u64)> = None;
    for (label, &count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((label.as_str(), count)),
        }
    }
    best
}

/// Mean score, or `None` without entries.
#[must_use]
pub fn average_score(entries: &[mood_entry::Model]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let sum: i64 = entries.iter().map(|e| i64::from(e.mood_score)).sum();
    Some(sum as f64 / entries.len() as f64)
}

/// Headline numbers.
#[must_use]
pub fn summarize(entries: &[mood_entry::Model], emotions: &BTreeMap<String, u64>) -> MoodSummary {
    MoodSummary {
        total_entries: entries.len(),
        average_mood: average_score(entries),
        latest_score: chronological(entries).last().map(|e| e.mood_score),
        dominant_emotion: dominant_label(emotions).map(|(label, _)| label.to_string()),
    }
}

/// Entry counts per mood band.
#[must_use]
pub fn distribution(entries: &[mood_entry::Model]) -> MoodDistribution {
    let mut dist = MoodDistribution::default();
    for entry in entries {
        dist.record(entry.mood_score);
    }
    dist
}

impl MoodAnalytics {
    /// Derive every output from one entry set.
    #[must_use]
    pub fn from_entries(
        window: WindowKind,
        timezone: &Tz,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        entries: &[mood_entry::Model],
        order: SeriesOrder,
    ) -> Self {
        let emotion_counts = emotion_counts(entries);

        Self {
            window,
            timezone: timezone.name().to_string(),
            start,
            end,
            series: mood_series(entries, order),
            summary: summarize(entries, &emotion_counts),
            activity_impact: activity_impact(entries),
            distribution: distribution(entries),
            emotion_counts,
        }
    }
}

/// Query for analytics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub window: WindowKind,
    #[serde(default)]
    pub order: SeriesOrder,
    /// IANA timezone name.
    pub tz: Option<String>,
}

/// Query for insights.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightQuery {
    #[serde(default)]
    pub window: WindowKind,
    /// IANA timezone name.
    pub tz: Option<String>,
}

/// Service computing analytics and insights over a user's journal.
#[derive(Clone)]
pub struct AnalyticsService {
    entry_repo: MoodEntryRepository,
    default_timezone: String,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub fn new(entry_repo: MoodEntryRepository, default_timezone: impl Into<String>) -> Self {
        Self {
            entry_repo,
            default_timezone: default_timezone.into(),
        }
    }

    async fn fetch_window(
        &self,
        user_id: &str,
        window: WindowKind,
        tz: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<(Tz, (DateTime<Utc>, DateTime<Utc>), Vec<mood_entry::Model>)> {
        let tz = resolve_timezone(tz, &self.default_timezone)?;
        let bounds = window_bounds(window, &now.with_timezone(&tz));

        let entries = self
            .entry_repo
            .find_in_range(user_id, bounds.0, bounds.1)
            .await?;

        debug!(
            user_id = %user_id,
            window = window.as_str(),
            timezone = tz.name(),
            entries = entries.len(),
            "Fetched analytics window"
        );

        Ok((tz, bounds, entries))
    }

    /// Analytics for the window ending now.
    pub async fn get_analytics(&self, user_id: &str, query: &AnalyticsQuery) -> AppResult<MoodAnalytics> {
        self.get_analytics_at(user_id, query, Utc::now()).await
    }

    /// Analytics for the window ending at `now`.
    pub async fn get_analytics_at(
        &self,
        user_id: &str,
        query: &AnalyticsQuery,
        now: DateTime<Utc>,
    ) -> AppResult<MoodAnalytics> {
        let (tz, bounds, entries) = self
            .fetch_window(user_id, query.window, query.tz.as_deref(), now)
            .await?;

        Ok(MoodAnalytics::from_entries(
            query.window,
            &tz,
            bounds,
            &entries,
            query.order,
        ))
    }

    /// Insights for the window ending now.
    pub async fn get_insights(&self, user_id: &str, query: &InsightQuery) -> AppResult<Insights> {
        let (tz, _, entries) = self
            .fetch_window(user_id, query.window, query.tz.as_deref(), Utc::now())
            .await?;

        Ok(insight::generate(&entries, &tz))
    }
}
