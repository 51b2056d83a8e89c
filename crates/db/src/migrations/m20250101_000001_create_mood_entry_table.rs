//! Create `mood_entry` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MoodEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoodEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MoodEntry::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(MoodEntry::MoodScore).integer().not_null())
                    .col(
                        ColumnDef::new(MoodEntry::Emotions)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(MoodEntry::Activities)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(MoodEntry::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MoodEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("mood_score BETWEEN 1 AND 10"))
                    .to_owned(),
            )
            .await?;

        // Range scans are always scoped to one user
        manager
            .create_index(
                Index::create()
                    .name("idx_mood_entry_user_id_created_at")
                    .table(MoodEntry::Table)
                    .col(MoodEntry::UserId)
                    .col(MoodEntry::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MoodEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MoodEntry {
    Table,
    Id,
    UserId,
    MoodScore,
    Emotions,
    Activities,
    Notes,
    CreatedAt,
}
