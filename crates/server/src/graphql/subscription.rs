use async_graphql::{Context, Result, Subscription};
use futures::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use super::types::CommentEventNode;
use crate::service::CommentService;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// 某篇升级指南下的评论变更
    async fn comment_events(
        &self,
        ctx: &Context<'_>,
        upgrade_guide: String,
    ) -> Result<impl Stream<Item = CommentEventNode>> {
        let rx = ctx.data::<CommentService>()?.subscribe();

        let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
            Ok(event) if event.upgrade_guide.as_str() == upgrade_guide => Some(CommentEventNode::from(event)),
            Ok(_) => None,
            Err(_lagged) => {
                tracing::warn!("GraphQL subscriber lagged for {}", upgrade_guide);
                None
            }
        });
        Ok(stream)
    }
}
