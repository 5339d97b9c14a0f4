//! Database entities.

pub mod answer;
pub mod answer_comment;
pub mod question;
pub mod user;
pub mod vote;

pub use answer::Entity as Answer;
pub use answer_comment::Entity as AnswerComment;
pub use question::Entity as Question;
pub use user::Entity as User;
pub use vote::Entity as Vote;
