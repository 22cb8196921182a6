//! 标签表迁移
//!
//! 标签按用户隔离：(user_id, name) 唯一。
//! link_tags 为纯关联表，(link_id, tag_id) 复合主键保证关联幂等。

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_identity_tables::Users;
use crate::m20260301_000002_short_links::ShortLinks;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tags::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tags::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Tags::UserId).string_len(64).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_user")
                            .from(Tags::Table, Tags::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tags_user_name")
                    .table(Tags::Table)
                    .col(Tags::UserId)
                    .col(Tags::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LinkTags::LinkId).big_integer().not_null())
                    .col(ColumnDef::new(LinkTags::TagId).big_integer().not_null())
                    .primary_key(Index::create().col(LinkTags::LinkId).col(LinkTags::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_link_tags_link")
                            .from(LinkTags::Table, LinkTags::LinkId)
                            .to(ShortLinks::Table, ShortLinks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_link_tags_tag")
                            .from(LinkTags::Table, LinkTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkTags::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    UserId,
}

#[derive(DeriveIden)]
enum LinkTags {
    Table,
    LinkId,
    TagId,
}
