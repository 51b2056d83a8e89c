//! Rule-based insight generation.
//!
//! Same entries in, same strings out. No network or model calls.

use chrono::{TimeZone, Timelike};
use mindful_db::entities::mood_entry;
use serde::Serialize;

use super::analytics::{activity_impact, average_score, dominant_label, emotion_counts};

/// Suggestions shown before anything has been logged.
pub const STARTER_SUGGESTIONS: [&str; 3] = [
    "Start tracking your moods regularly",
    "Try to identify what affects your mood",
    "Consider setting some mood-related goals",
];

/// Minimum gap between an activity mean and the overall mean to call out.
const ACTIVITY_GAP: f64 = 0.5;

/// Minimum gap between periods (parts of day, halves of the window).
const PERIOD_GAP: f64 = 1.0;

/// Below this average the user is pointed at support groups.
const LOW_MOOD_AVERAGE: f64 = 4.0;

/// Patterns and suggestions derived from a window of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub patterns: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PartOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PartOfDay {
    const ALL: [Self; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    const fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    const fn phrase(self) -> &'static str {
        match self {
            Self::Morning => "in the morning",
            Self::Afternoon => "in the afternoon",
            Self::Evening => "in the evening",
            Self::Night => "at night",
        }
    }
}

fn mean(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64)
}

/// Highest and lowest scoring parts of the day, when at least two are
/// represented. Ties keep the earlier part of the day.
fn part_of_day_extremes<Z: TimeZone>(
    entries: &[mood_entry::Model],
    tz: &Z,
) -> Option<((PartOfDay, f64), (PartOfDay, f64))> {
    let mut buckets: [Vec<i32>; 4] = Default::default();
    for entry in entries {
        let hour = entry.created_at.with_timezone(tz).hour();
        buckets[PartOfDay::from_hour(hour) as usize].push(entry.mood_score);
    }

    let means: Vec<(PartOfDay, f64)> = PartOfDay::ALL
        .iter()
        .zip(buckets.iter())
        .filter_map(|(&part, scores)| mean(scores).map(|m| (part, m)))
        .collect();

    if means.len() < 2 {
        return None;
    }

    let mut best = means[0];
    let mut worst = means[0];
    for &(part, m) in &means[1..] {
        if m > best.1 {
            best = (part, m);
        }
        if m < worst.1 {
            worst = (part, m);
        }
    }

    Some((best, worst))
}

/// Mean of the later half minus mean of the earlier half.
fn trend(entries: &[mood_entry::Model]) -> Option<f64> {
    if entries.len() < 4 {
        return None;
    }

    let mut sorted: Vec<&mood_entry::Model> = entries.iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let scores: Vec<i32> = sorted.iter().map(|e| e.mood_score).collect();

    let (earlier, later) = scores.split_at(scores.len() / 2);
    Some(mean(later)? - mean(earlier)?)
}

/// Derive insights from a window of entries.
///
/// `tz` decides which part of the day an entry falls in.
#[must_use]
pub fn generate<Z: TimeZone>(entries: &[mood_entry::Model], tz: &Z) -> Insights {
    let mut insights = Insights::default();

    let Some(overall) = average_score(entries) else {
        insights.suggestions = STARTER_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect();
        return insights;
    };

    let emotions = emotion_counts(entries);
    if let Some((emotion, count)) = dominant_label(&emotions) {
        insights.patterns.push(format!(
            "You most often felt {emotion} ({count} of {} entries)",
            entries.len()
        ));
    }

    let impact = activity_impact(entries);
    if impact.is_empty() {
        insights
            .suggestions
            .push("Try logging an activity alongside your mood".to_string());
    }

    // BTreeMap iteration plus strict comparison keeps ties on the first label
    let mut best: Option<(&str, f64)> = None;
    let mut worst: Option<(&str, f64)> = None;
    for (label, &avg) in &impact {
        if avg >= overall + ACTIVITY_GAP && best.is_none_or(|(_, b)| avg > b) {
            best = Some((label.as_str(), avg));
        }
        if avg <= overall - ACTIVITY_GAP && worst.is_none_or(|(_, w)| avg < w) {
            worst = Some((label.as_str(), avg));
        }
    }

    if let Some((activity, avg)) = best {
        insights.patterns.push(format!(
            "Your mood is higher after {activity} (average {avg:.1} vs {overall:.1} overall)"
        ));
        insights
            .suggestions
            .push(format!("Make time for {activity} more often"));
    }
    if let Some((activity, avg)) = worst {
        insights.patterns.push(format!(
            "Your mood tends to be lower around {activity} (average {avg:.1} vs {overall:.1} overall)"
        ));
        insights.suggestions.push(format!(
            "Notice how you feel during {activity} and plan something restorative afterwards"
        ));
    }

    if let Some(((high, high_avg), (low, low_avg))) = part_of_day_extremes(entries, tz) {
        if high_avg - low_avg >= PERIOD_GAP {
            insights.patterns.push(format!(
                "Your mood tends to be higher {} than {}",
                high.phrase(),
                low.phrase()
            ));
        }
    }

    match trend(entries) {
        Some(delta) if delta >= PERIOD_GAP => {
            insights
                .patterns
                .push("Your mood has been improving over this period".to_string());
        }
        Some(delta) if delta <= -PERIOD_GAP => {
            insights
                .patterns
                .push("Your mood has dipped over this period".to_string());
            insights
                .suggestions
                .push("Consider reaching out to someone you trust".to_string());
        }
        _ => {}
    }

    if overall < LOW_MOOD_AVERAGE {
        insights.suggestions.push(
            "A support group that matches how you have been feeling could help".to_string(),
        );
    }

    if entries.len() < 3 {
        insights
            .suggestions
            .push("Log your mood daily to uncover clearer patterns".to_string());
    }

    insights
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use chrono_tz::Tz;
    use serde_json::json;

    fn entry_at(id: &str, score: i32, emotions: &[&str], activities: &[&str], at: DateTime<Utc>) -> mood_entry::Model {
        mood_entry::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            mood_score: score,
            emotions: json!(emotions),
            activities: json!(activities),
            notes: String::new(),
            created_at: at.into(),
        }
    }

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-04T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_input_gives_starter_suggestions() {
        let insights = generate(&[], &Utc);

        assert!(insights.patterns.is_empty());
        assert_eq!(insights.suggestions, STARTER_SUGGESTIONS.to_vec());
    }

    #[test]
    fn test_is_deterministic() {
        let entries = vec![
            entry_at("e1", 8, &["Happy"], &["Exercise"], base() + Duration::hours(9)),
            entry_at("e2", 3, &["Tired"], &["Work"], base() + Duration::hours(20)),
            entry_at("e3", 7, &["Calm"], &["Exercise"], base() + Duration::hours(33)),
        ];

        assert_eq!(generate(&entries, &Utc), generate(&entries, &Utc));
    }

    #[test]
    fn test_activity_patterns() {
        let entries = vec![
            entry_at("e1", 9, &["Happy"], &["Exercise"], base()),
            entry_at("e2", 8, &["Happy"], &["Exercise"], base() + Duration::hours(1)),
            entry_at("e3", 3, &["Tired"], &["Work"], base() + Duration::hours(2)),
        ];

        let insights = generate(&entries, &Utc);

        assert!(insights.patterns.contains(&"You most often felt Happy (2 of 3 entries)".to_string()));
        assert!(insights
            .patterns
            .iter()
            .any(|p| p.starts_with("Your mood is higher after Exercise")));
        assert!(insights
            .patterns
            .iter()
            .any(|p| p.starts_with("Your mood tends to be lower around Work")));
        assert!(insights
            .suggestions
            .contains(&"Make time for Exercise more often".to_string()));
    }

    #[test]
    fn test_suggests_activity_logging() {
        let entries = vec![entry_at("e1", 6, &["Calm"], &[], base())];

        let insights = generate(&entries, &Utc);

        assert!(insights
            .suggestions
            .contains(&"Try logging an activity alongside your mood".to_string()));
        assert!(insights
            .suggestions
            .contains(&"Log your mood daily to uncover clearer patterns".to_string()));
    }

    #[test]
    fn test_part_of_day_uses_timezone() {
        // 14:00 UTC is morning in Los Angeles and afternoon in UTC
        let entries = vec![
            entry_at("e1", 9, &["Happy"], &[], base() + Duration::hours(14)),
            entry_at("e2", 9, &["Happy"], &[], base() + Duration::hours(38)),
            entry_at("e3", 3, &["Sad"], &[], base() + Duration::hours(23)),
        ];
        let la: Tz = "America/Los_Angeles".parse().unwrap();

        let utc_insights = generate(&entries, &Utc);
        let la_insights = generate(&entries, &la);

        assert!(utc_insights
            .patterns
            .contains(&"Your mood tends to be higher in the afternoon than at night".to_string()));
        assert!(la_insights
            .patterns
            .contains(&"Your mood tends to be higher in the morning than in the afternoon".to_string()));
    }

    #[test]
    fn test_declining_trend() {
        let entries: Vec<_> = [8, 8, 7, 3, 2, 2]
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                entry_at(&format!("e{i}"), score, &["Calm"], &["Work"], base() + Duration::days(i as i64))
            })
            .collect();

        let insights = generate(&entries, &Utc);

        assert!(insights
            .patterns
            .contains(&"Your mood has dipped over this period".to_string()));
        assert!(insights
            .suggestions
            .contains(&"Consider reaching out to someone you trust".to_string()));
    }
}
