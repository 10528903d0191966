use async_graphql::{Context, Object, Result};

use super::types::{CommentNode, UserNode};
use super::{current_user, current_viewer, GqlResultExt};
use crate::service::CommentService;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// 全部评论，需要登录
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<CommentNode>> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let comments = service.list_all(viewer.as_ref()).await.gql()?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    /// 某篇升级指南下可见的评论，公开
    async fn comments_by_upgrade(
        &self,
        ctx: &Context<'_>,
        upgrade_guide: String,
    ) -> Result<Vec<CommentNode>> {
        let service = ctx.data::<CommentService>()?;
        let comments = service.list_by_upgrade(&upgrade_guide).await.gql()?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn comment(&self, ctx: &Context<'_>, id: String) -> Result<Option<CommentNode>> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let comment = service.get(viewer.as_ref(), &id).await.gql()?;
        Ok(comment.map(Into::into))
    }

    async fn me(&self, ctx: &Context<'_>) -> Option<UserNode> {
        current_user(ctx).cloned().map(Into::into)
    }
}
