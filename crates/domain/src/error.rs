use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommentError {
    #[error("You must be logged in to do that")]
    Unauthenticated,
    #[error("You don't have access to do that")]
    Forbidden,
    #[error("Comment not found: {0}")]
    NotFound(String),
    #[error("Invalid parent comment: {0}")]
    InvalidParent(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CommentError {
    pub fn code(&self) -> &'static str {
        match self {
            CommentError::Unauthenticated => "UNAUTHENTICATED",
            CommentError::Forbidden => "FORBIDDEN",
            CommentError::NotFound(_) => "NOT_FOUND",
            CommentError::InvalidParent(_) | CommentError::Invalid(_) => "BAD_USER_INPUT",
            CommentError::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}
