//! Create `support_group` and `group_membership` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupportGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupportGroup::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SupportGroup::Name).string_len(128).not_null())
                    .col(ColumnDef::new(SupportGroup::Description).text().not_null())
                    .col(
                        ColumnDef::new(SupportGroup::Indicators)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::MeetingTimes)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::Resources)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::Capacity)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::CurrentMembers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SupportGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust(
                        "current_members >= 0 AND current_members <= capacity",
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_support_group_is_active")
                    .table(SupportGroup::Table)
                    .col(SupportGroup::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupMembership::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembership::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::UserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::GroupId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(GroupMembership::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_membership_group")
                            .from(GroupMembership::Table, GroupMembership::GroupId)
                            .to(SupportGroup::Table, SupportGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_membership_group_id")
                    .table(GroupMembership::Table)
                    .col(GroupMembership::GroupId)
                    .to_owned(),
            )
            .await?;

        // At most one membership per (user_id, group_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_membership_unique")
                    .table(GroupMembership::Table)
                    .col(GroupMembership::UserId)
                    .col(GroupMembership::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupMembership::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SupportGroup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SupportGroup {
    Table,
    Id,
    Name,
    Description,
    Indicators,
    MeetingTimes,
    Resources,
    Capacity,
    CurrentMembers,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembership {
    Table,
    Id,
    UserId,
    GroupId,
    Status,
    JoinedAt,
}
