//! Business logic services.

pub mod answer;
pub mod question;
pub mod user;
pub mod voting;

pub use answer::{AddCommentInput, AnswerService, CreateAnswerInput, UpdateAnswerInput};
pub use question::{
    AnswerView, CloseQuestionInput, CreateQuestionInput, ListQuestionsInput, QuestionDetail,
    QuestionService, QuestionView, UpdateQuestionInput,
};
pub use user::{
    AuthSession, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput, UserService,
};
pub use voting::{AcceptOutcome, VoteOutcome, VotedTarget, VotingService};

/// One page of a listing with its pagination metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Wrap a page of items; `pages` is derived from `total` and `limit`.
    #[must_use]
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(Page::<()>::new(vec![], 1, 10, 0).pages, 0);
        assert_eq!(Page::<()>::new(vec![], 1, 10, 10).pages, 1);
        assert_eq!(Page::<()>::new(vec![], 1, 10, 11).pages, 2);
    }
}
