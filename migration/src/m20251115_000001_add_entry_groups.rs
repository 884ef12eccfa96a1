use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Entries {
    Table,
    GroupTag,
    IsRelative,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 分组抽奖：group_tag 为分组标识，is_relative = false 表示明确的"非亲属"参赛者
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("entries", "group_tag").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Entries::Table)
                        .add_column(ColumnDef::new(Entries::GroupTag).string_len(255).null())
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_column("entries", "is_relative").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Entries::Table)
                        .add_column(ColumnDef::new(Entries::IsRelative).boolean().null())
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Entries::Table)
                    .drop_column(Entries::GroupTag)
                    .drop_column(Entries::IsRelative)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
