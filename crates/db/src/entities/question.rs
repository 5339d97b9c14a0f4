//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Question difficulty level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[sea_orm(string_value = "beginner")]
    #[default]
    Beginner,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "advanced")]
    Advanced,
}

/// Why a question was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "kebab-case")]
pub enum CloseReason {
    #[sea_orm(string_value = "duplicate")]
    Duplicate,
    #[sea_orm(string_value = "off-topic")]
    OffTopic,
    #[sea_orm(string_value = "too-broad")]
    TooBroad,
    #[sea_orm(string_value = "unclear")]
    Unclear,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author. Never changes after creation.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Lowercased tag names (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(indexed)]
    pub category: String,

    pub difficulty: Difficulty,

    #[sea_orm(column_type = "Text")]
    pub code_snippet: String,

    pub language: String,

    #[sea_orm(default_value = 0)]
    pub views: i32,

    /// Answers count (denormalized)
    #[sea_orm(default_value = 0)]
    pub answers_count: i32,

    /// Upvote count (cache of the vote table)
    #[sea_orm(default_value = 0)]
    pub upvotes_count: i32,

    /// Downvote count (cache of the vote table)
    #[sea_orm(default_value = 0)]
    pub downvotes_count: i32,

    #[sea_orm(nullable)]
    pub accepted_answer_id: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_closed: bool,

    #[sea_orm(nullable)]
    pub closed_by: Option<String>,

    #[sea_orm(nullable)]
    pub closed_reason: Option<CloseReason>,

    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    /// Bumped on every acceptance change; used for compare-and-set.
    #[sea_orm(default_value = 0)]
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Upvotes minus downvotes.
    #[must_use]
    pub const fn vote_score(&self) -> i32 {
        self.upvotes_count - self.downvotes_count
    }

    /// Tag list decoded from the JSON column.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
