use async_graphql::{Context, Object, Result};
use domain::{CommentPatch, NewComment};

use super::types::{CommentNode, CreateCommentInput, SubscriptionNode, UpdateCommentInput};
use super::{current_viewer, GqlResultExt};
use crate::service::CommentService;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_comment(
        &self,
        ctx: &Context<'_>,
        input: CreateCommentInput,
        subscribe_to_updates: Option<bool>,
    ) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let input = NewComment::try_from(input).gql()?;
        let comment = service
            .create(viewer.as_ref(), input, subscribe_to_updates)
            .await
            .gql()?;
        Ok(comment.into())
    }

    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateCommentInput,
        subscribe_to_updates: Option<bool>,
    ) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let patch = CommentPatch::try_from(input).gql()?;
        let comment = service
            .update(viewer.as_ref(), &id, patch, subscribe_to_updates)
            .await
            .gql()?;
        Ok(comment.into())
    }

    /// 评论页内联编辑使用的窄接口，只修改正文
    async fn update_comment_content(
        &self,
        ctx: &Context<'_>,
        id: String,
        content: String,
    ) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let comment = service
            .update_content(viewer.as_ref(), &id, &content)
            .await
            .gql()?;
        Ok(comment.into())
    }

    async fn delete_comment(&self, ctx: &Context<'_>, id: String) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        let comment = service.delete(viewer.as_ref(), &id).await.gql()?;
        Ok(comment.into())
    }

    async fn like_comment(&self, ctx: &Context<'_>, id: String) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        Ok(service.like(viewer.as_ref(), &id).await.gql()?.into())
    }

    async fn unlike_comment(&self, ctx: &Context<'_>, id: String) -> Result<CommentNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        Ok(service.unlike(viewer.as_ref(), &id).await.gql()?.into())
    }

    async fn subscribe_to_comment(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<SubscriptionNode> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        Ok(service.subscribe_to(viewer.as_ref(), &id).await.gql()?.into())
    }

    async fn unsubscribe_from_comment(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let service = ctx.data::<CommentService>()?;
        let viewer = current_viewer(ctx);
        service.unsubscribe_from(viewer.as_ref(), &id).await.gql()
    }
}
