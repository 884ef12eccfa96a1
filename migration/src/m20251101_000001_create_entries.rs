use sea_orm_migration::prelude::*;

/// Contest entries (参赛记录)
#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    FirstName,
    LastName,
    Phone,
    City,
    Code,
    ImageUrl,
    ImageHash,
    DeviceId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 三个唯一索引（phone / device_id / image_hash）是防重复参赛的最终保证，
/// 服务层的预检查只用于返回友好提示。
/// 索引名被 `EntryService` 用来识别冲突类型，修改时需同步。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::FirstName).string_len(255).not_null())
                    .col(ColumnDef::new(Entries::LastName).string_len(255).not_null())
                    .col(ColumnDef::new(Entries::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Entries::City).string_len(255).not_null())
                    .col(ColumnDef::new(Entries::Code).string_len(64).not_null())
                    .col(ColumnDef::new(Entries::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Entries::ImageHash).string_len(32).not_null())
                    .col(ColumnDef::new(Entries::DeviceId).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Entries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_phone_unique")
                    .table(Entries::Table)
                    .col(Entries::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_device_id_unique")
                    .table(Entries::Table)
                    .col(Entries::DeviceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_image_hash_unique")
                    .table(Entries::Table)
                    .col(Entries::ImageHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 导出 / 管理列表按时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entries_created_at")
                    .table(Entries::Table)
                    .col(Entries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Entries::Table).to_owned())
            .await?;
        Ok(())
    }
}
