//! Data access repositories.

pub mod mood_entry;
pub mod support_group;

pub use mood_entry::MoodEntryRepository;
pub use support_group::SupportGroupRepository;
