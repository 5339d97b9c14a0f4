//! Create question table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Question::Content).text().not_null())
                    .col(
                        ColumnDef::new(Question::Tags)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Question::Category).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Question::Difficulty)
                            .string_len(16)
                            .not_null()
                            .default("beginner"),
                    )
                    .col(
                        ColumnDef::new(Question::CodeSnippet)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Question::Language)
                            .string_len(32)
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Question::Views).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Question::AnswersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::UpvotesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::DownvotesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Question::AcceptedAnswerId).string_len(32))
                    .col(
                        ColumnDef::new(Question::IsClosed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::ClosedBy).string_len(32))
                    .col(ColumnDef::new(Question::ClosedReason).string_len(16))
                    .col(
                        ColumnDef::new(Question::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::Version).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Question::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_user_id")
                            .from(Question::Table, Question::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for author listings and reputation recompute
        manager
            .create_index(
                Index::create()
                    .name("idx_question_user_id_created_at")
                    .table(Question::Table)
                    .col(Question::UserId)
                    .col(Question::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (category, difficulty)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_category_difficulty")
                    .table(Question::Table)
                    .col(Question::Category)
                    .col(Question::Difficulty)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_question_created_at")
                    .table(Question::Table)
                    .col(Question::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // GIN index for tag containment filters
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_question_tags ON question USING GIN (tags)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    UserId,
    Title,
    Content,
    Tags,
    Category,
    Difficulty,
    CodeSnippet,
    Language,
    Views,
    AnswersCount,
    UpvotesCount,
    DownvotesCount,
    AcceptedAnswerId,
    IsClosed,
    ClosedBy,
    ClosedReason,
    IsDeleted,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
