//! Core business logic for mindful.

pub mod services;

pub use services::*;
