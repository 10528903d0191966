use chrono::{DateTime, Utc};
use domain::{Comment, CommentSubscription, Like, Post, Role, UpgradeGuide, User};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub author_id: String,
    pub upgrade_guide: String,
    pub comment: String,
    pub parent_comment_id: Option<String>,
    pub visible: bool,
    pub flagged: bool,
    pub bookmarked: bool,
    pub edit_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            author_id: sql.author_id,
            upgrade_guide: UpgradeGuide::new_unchecked(sql.upgrade_guide),
            comment: sql.comment,
            parent_comment_id: sql.parent_comment_id,
            visible: sql.visible,
            flagged: sql.flagged,
            bookmarked: sql.bookmarked,
            edit_count: sql.edit_count,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        }
    }
}

// Join 字段 (来自 roles 表)
#[derive(FromRow)]
pub struct SqlUser {
    pub id: String,
    pub name: String,
    pub role_id: i64,
    pub role_name: String,
}

impl From<SqlUser> for User {
    fn from(sql: SqlUser) -> Self {
        User {
            id: sql.id,
            name: sql.name,
            role: Role {
                id: sql.role_id,
                name: sql.role_name,
            },
        }
    }
}

#[derive(FromRow)]
pub struct SqlUserLink {
    pub id: String,
    pub user_id: String,
    pub comment_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<SqlUserLink> for Like {
    fn from(sql: SqlUserLink) -> Self {
        Like {
            id: sql.id,
            user_id: sql.user_id,
            comment_id: sql.comment_id,
            created_at: sql.created_at,
        }
    }
}

impl From<SqlUserLink> for CommentSubscription {
    fn from(sql: SqlUserLink) -> Self {
        CommentSubscription {
            id: sql.id,
            user_id: sql.user_id,
            comment_id: sql.comment_id,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlPost {
    pub slug: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<SqlPost> for Post {
    fn from(sql: SqlPost) -> Self {
        Post {
            slug: sql.slug,
            title: sql.title,
            published_at: sql.published_at,
        }
    }
}
