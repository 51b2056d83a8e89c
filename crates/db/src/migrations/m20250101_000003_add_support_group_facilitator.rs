//! Add `facilitator_id` column to `support_group` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(SupportGroup::Table)
                    .add_column(ColumnDef::new(SupportGroup::FacilitatorId).string_len(64).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(SupportGroup::Table)
                    .drop_column(SupportGroup::FacilitatorId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum SupportGroup {
    Table,
    FacilitatorId,
}
