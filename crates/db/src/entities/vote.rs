//! Vote entity.
//!
//! One row per `(user_id, target_type, target_id)`. The unique key is what
//! guarantees a voter sits in at most one of the upvote/downvote sets.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of content a vote targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[sea_orm(string_value = "question")]
    Question,
    #[sea_orm(string_value = "answer")]
    Answer,
}

/// Direction of a vote.
///
/// Serialized the way clients send it: `"upvote"` or `"downvote"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum VoteDirection {
    #[sea_orm(string_value = "up")]
    #[serde(rename = "upvote")]
    Up,
    #[sea_orm(string_value = "down")]
    #[serde(rename = "downvote")]
    Down,
}

impl VoteDirection {
    /// Parse the client-facing vote type.
    #[must_use]
    pub fn from_vote_type(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(Self::Up),
            "downvote" => Some(Self::Down),
            _ => None,
        }
    }

    /// Client-facing vote type.
    #[must_use]
    pub const fn as_vote_type(self) -> &'static str {
        match self {
            Self::Up => "upvote",
            Self::Down => "downvote",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Voter
    pub user_id: String,

    pub target_type: TargetKind,

    pub target_id: String,

    pub direction: VoteDirection,

    /// Time of the most recent cast; refreshed on every vote.
    pub created_at: DateTimeWithTimeZone,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_type_parsing() {
        assert_eq!(VoteDirection::from_vote_type("upvote"), Some(VoteDirection::Up));
        assert_eq!(
            VoteDirection::from_vote_type("downvote"),
            Some(VoteDirection::Down)
        );
        assert_eq!(VoteDirection::from_vote_type("sideways"), None);
        assert_eq!(VoteDirection::from_vote_type("UPVOTE"), None);
    }

    #[test]
    fn test_vote_type_matches_serde() {
        for dir in [VoteDirection::Up, VoteDirection::Down] {
            let json = serde_json::to_value(dir).unwrap_or_default();
            assert_eq!(json, serde_json::Value::from(dir.as_vote_type()));
        }
    }
}
