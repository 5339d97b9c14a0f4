//! Create answer comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnswerComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnswerComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnswerComment::AnswerId).string_len(32).not_null())
                    .col(ColumnDef::new(AnswerComment::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(AnswerComment::Content).string_len(500).not_null())
                    .col(
                        ColumnDef::new(AnswerComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_comment_answer_id")
                            .from(AnswerComment::Table, AnswerComment::AnswerId)
                            .to(Answer::Table, Answer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_comment_user_id")
                            .from(AnswerComment::Table, AnswerComment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answer_comment_answer_id")
                    .table(AnswerComment::Table)
                    .col(AnswerComment::AnswerId)
                    .col(AnswerComment::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnswerComment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AnswerComment {
    Table,
    Id,
    AnswerId,
    UserId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
