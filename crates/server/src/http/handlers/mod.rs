pub mod admin;
pub mod graphql;
pub mod sse;
pub mod threads;

use axum::http::StatusCode;
use domain::CommentError;

pub fn status_for(err: &CommentError) -> StatusCode {
    match err {
        CommentError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CommentError::Forbidden => StatusCode::FORBIDDEN,
        CommentError::NotFound(_) => StatusCode::NOT_FOUND,
        CommentError::InvalidParent(_) | CommentError::Invalid(_) => StatusCode::BAD_REQUEST,
        CommentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn reject(err: CommentError) -> (StatusCode, String) {
    (status_for(&err), err.to_string())
}
