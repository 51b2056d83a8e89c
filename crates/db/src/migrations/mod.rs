//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_mood_entry_table;
mod m20250101_000002_create_support_group_tables;
mod m20250101_000003_add_support_group_facilitator;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_mood_entry_table::Migration),
            Box::new(m20250101_000002_create_support_group_tables::Migration),
            Box::new(m20250101_000003_add_support_group_facilitator::Migration),
        ]
    }
}
