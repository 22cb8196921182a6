//! 短链接与点击事件表迁移
//!
//! - short_links: short_code 唯一，clicks 只通过原子自增修改
//! - click_events: 追加写入，随所属短链接级联删除

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_identity_tables::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShortLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLinks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortLinks::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(ShortLinks::ShortCode)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ShortLinks::Password).string().null())
                    .col(ColumnDef::new(ShortLinks::UserId).string_len(64).null())
                    .col(ColumnDef::new(ShortLinks::QrCodeUrl).text().null())
                    .col(
                        ColumnDef::new(ShortLinks::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_short_links_user")
                            .from(ShortLinks::Table, ShortLinks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_short_code")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::ShortCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_user_id")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::ShortLinkId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ClickEvents::UserAgent).text().null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().null())
                    .col(ColumnDef::new(ClickEvents::Country).string_len(2).null())
                    .col(ColumnDef::new(ClickEvents::City).string_len(100).null())
                    .col(ColumnDef::new(ClickEvents::Device).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Browser).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Os).string_len(64).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_click_events_short_link")
                            .from(ClickEvents::Table, ClickEvents::ShortLinkId)
                            .to(ShortLinks::Table, ShortLinks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_link_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::ShortLinkId)
                    .col(ClickEvents::ClickedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ShortLinks {
    Table,
    Id,
    OriginalUrl,
    ShortCode,
    CreatedAt,
    ExpiresAt,
    Password,
    UserId,
    QrCodeUrl,
    Clicks,
}

#[derive(DeriveIden)]
enum ClickEvents {
    Table,
    Id,
    ShortLinkId,
    ClickedAt,
    IpAddress,
    UserAgent,
    Referrer,
    Country,
    City,
    Device,
    Browser,
    Os,
}
