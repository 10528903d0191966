use async_graphql::{
    ComplexObject, Context, Enum, InputObject, MaybeUndefined, Result, SimpleObject,
};
use chrono::{DateTime, Utc};
use domain::{
    Comment, CommentError, CommentEvent, CommentEventKind, CommentPatch, CommentSubscription,
    Like, NewComment, Role, UpgradeGuide, User,
};

use super::{current_viewer, GqlResultExt};
use crate::service::CommentService;

#[derive(SimpleObject, Clone)]
#[graphql(complex, name = "Comment")]
pub struct CommentNode {
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

impl From<Comment> for CommentNode {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            upgrade_guide: c.upgrade_guide.as_str().to_string(),
            comment: c.comment,
            parent_comment_id: c.parent_comment_id,
            visible: c.visible,
            flagged: c.flagged,
            bookmarked: c.bookmarked,
            edit_count: c.edit_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl CommentNode {
    async fn load_author(&self, ctx: &Context<'_>) -> Result<User> {
        let service = ctx.data::<CommentService>()?;
        service
            .db()
            .get_user(&self.author_id)
            .await
            .gql()?
            .ok_or_else(|| CommentError::NotFound(self.author_id.clone()))
            .gql()
    }
}

/// 隐藏的评论只对管理员可见，嵌套关系也一样
fn sees_hidden(ctx: &Context<'_>) -> bool {
    current_viewer(ctx).is_some_and(|v| v.is_admin())
}

#[ComplexObject]
impl CommentNode {
    async fn author(&self, ctx: &Context<'_>) -> Result<UserNode> {
        self.load_author(ctx).await.map(Into::into)
    }

    async fn author_name(&self, ctx: &Context<'_>) -> Result<String> {
        Ok(self.load_author(ctx).await?.name)
    }

    /// 作者的角色 ID，1 为管理员
    async fn author_role(&self, ctx: &Context<'_>) -> Result<i64> {
        Ok(self.load_author(ctx).await?.role.id)
    }

    async fn parent_comment(&self, ctx: &Context<'_>) -> Result<Option<CommentNode>> {
        let Some(parent_id) = &self.parent_comment_id else {
            return Ok(None);
        };
        let service = ctx.data::<CommentService>()?;
        let parent = service.db().get_comment(parent_id).await.gql()?;
        Ok(parent
            .filter(|p| p.visible || sees_hidden(ctx))
            .map(Into::into))
    }

    #[graphql(name = "Comments")]
    async fn replies(&self, ctx: &Context<'_>) -> Result<Vec<CommentNode>> {
        let service = ctx.data::<CommentService>()?;
        let replies = service
            .db()
            .list_replies(&self.id, sees_hidden(ctx))
            .await
            .gql()?;
        Ok(replies.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "Like")]
    async fn likes(&self, ctx: &Context<'_>) -> Result<Vec<LikeNode>> {
        let service = ctx.data::<CommentService>()?;
        let likes = service.db().list_likes(&self.id).await.gql()?;
        Ok(likes.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "SubscribeUserToComment")]
    async fn subscriptions(&self, ctx: &Context<'_>) -> Result<Vec<SubscriptionNode>> {
        let service = ctx.data::<CommentService>()?;
        let subs = service.db().list_subscriptions(&self.id).await.gql()?;
        Ok(subs.into_iter().map(Into::into).collect())
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Role")]
pub struct RoleNode {
    pub id: i64,
    pub name: String,
}

impl From<Role> for RoleNode {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "User")]
pub struct UserNode {
    pub id: String,
    pub name: String,
    pub role: RoleNode,
}

impl From<User> for UserNode {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            role: u.role.into(),
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "Like")]
pub struct LikeNode {
    pub id: String,
    pub user_id: String,
    pub comment_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Like> for LikeNode {
    fn from(l: Like) -> Self {
        Self {
            id: l.id,
            user_id: l.user_id,
            comment_id: l.comment_id,
            created_at: l.created_at,
        }
    }
}

#[derive(SimpleObject)]
#[graphql(name = "SubscribeUserToComment")]
pub struct SubscriptionNode {
    pub id: String,
    pub user_id: String,
    pub comment_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentSubscription> for SubscriptionNode {
    fn from(s: CommentSubscription) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            comment_id: s.comment_id,
            created_at: s.created_at,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
#[graphql(name = "CommentEventKind")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

#[derive(SimpleObject)]
#[graphql(name = "CommentEvent")]
pub struct CommentEventNode {
    pub kind: EventKind,
    pub upgrade_guide: String,
    pub comment_id: String,
}

impl From<CommentEvent> for CommentEventNode {
    fn from(e: CommentEvent) -> Self {
        let kind = match e.kind {
            CommentEventKind::Created => EventKind::Created,
            CommentEventKind::Updated => EventKind::Updated,
            CommentEventKind::Deleted => EventKind::Deleted,
        };
        Self {
            kind,
            upgrade_guide: e.upgrade_guide.as_str().to_string(),
            comment_id: e.comment_id,
        }
    }
}

#[derive(InputObject)]
pub struct CreateCommentInput {
    pub author_id: String,
    pub upgrade_guide: String,
    pub comment: String,
    pub parent_comment_id: Option<String>,
    pub visible: bool,
    pub flagged: bool,
    pub bookmarked: bool,
    pub edit_count: i32,
}

impl TryFrom<CreateCommentInput> for NewComment {
    type Error = CommentError;

    fn try_from(input: CreateCommentInput) -> Result<Self, Self::Error> {
        Ok(NewComment {
            author_id: input.author_id,
            upgrade_guide: UpgradeGuide::new(input.upgrade_guide).map_err(CommentError::Invalid)?,
            comment: input.comment,
            parent_comment_id: input.parent_comment_id,
            visible: input.visible,
            flagged: input.flagged,
            bookmarked: input.bookmarked,
            edit_count: input.edit_count,
        })
    }
}

#[derive(InputObject, Default)]
pub struct UpdateCommentInput {
    pub author_id: Option<String>,
    pub upgrade_guide: Option<String>,
    pub comment: Option<String>,
    /// `null` 移到顶层，省略则不变
    pub parent_comment_id: MaybeUndefined<String>,
    pub visible: Option<bool>,
    pub flagged: Option<bool>,
    pub bookmarked: Option<bool>,
    pub edit_count: Option<i32>,
}

impl TryFrom<UpdateCommentInput> for CommentPatch {
    type Error = CommentError;

    fn try_from(input: UpdateCommentInput) -> Result<Self, Self::Error> {
        let upgrade_guide = input
            .upgrade_guide
            .map(UpgradeGuide::new)
            .transpose()
            .map_err(CommentError::Invalid)?;
        let parent_comment_id = match input.parent_comment_id {
            MaybeUndefined::Undefined => None,
            MaybeUndefined::Null => Some(None),
            MaybeUndefined::Value(id) => Some(Some(id)),
        };
        Ok(CommentPatch {
            author_id: input.author_id,
            upgrade_guide,
            comment: input.comment,
            parent_comment_id,
            visible: input.visible,
            flagged: input.flagged,
            bookmarked: input.bookmarked,
            edit_count: input.edit_count,
        })
    }
}
