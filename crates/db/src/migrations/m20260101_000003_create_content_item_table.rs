//! Create `content_item` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentItem::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentItem::CourseId).string_len(32).not_null())
                    .col(ColumnDef::new(ContentItem::SubGroupCode).string_len(64).null())
                    .col(ColumnDef::new(ContentItem::Section).string_len(20).not_null())
                    .col(ColumnDef::new(ContentItem::Kind).string_len(20).not_null())
                    .col(ColumnDef::new(ContentItem::ParentId).string_len(32).null())
                    .col(ColumnDef::new(ContentItem::SortOrder).integer().null())
                    .col(ColumnDef::new(ContentItem::Title).string_len(512).not_null())
                    .col(ColumnDef::new(ContentItem::Body).text().null())
                    .col(ColumnDef::new(ContentItem::PrimaryUrl).text().null())
                    .col(
                        ColumnDef::new(ContentItem::Attachments)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(ContentItem::TopicIndex).integer().null())
                    .col(ColumnDef::new(ContentItem::TopicLabel).string_len(256).null())
                    .col(ColumnDef::new(ContentItem::AuthorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ContentItem::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ContentItem::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_item_course")
                            .from(ContentItem::Table, ContentItem::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_item_author")
                            .from(ContentItem::Table, ContentItem::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_item_parent")
                            .from(ContentItem::Table, ContentItem::ParentId)
                            .to(ContentItem::Table, ContentItem::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing loads a whole course at once
        manager
            .create_index(
                Index::create()
                    .name("idx_content_item_course_id")
                    .table(ContentItem::Table)
                    .col(ContentItem::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_item_parent_id")
                    .table(ContentItem::Table)
                    .col(ContentItem::ParentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContentItem::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ContentItem {
    Table,
    Id,
    CourseId,
    SubGroupCode,
    Section,
    Kind,
    ParentId,
    SortOrder,
    Title,
    Body,
    PrimaryUrl,
    Attachments,
    TopicIndex,
    TopicLabel,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
