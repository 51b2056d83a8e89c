//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod insight;
pub mod mood;
pub mod support_group;

pub use analytics::AnalyticsService;
pub use mood::MoodService;
pub use support_group::SupportGroupService;
