use domain::{
    access::{ensure_can_edit, require_viewer},
    Comment, CommentError, CommentEvent, CommentEventKind, CommentPatch, CommentSubscription,
    NewComment, SubscribeToUpdates, UpgradeGuide, Viewer,
};
use storage::Db;
use tokio::sync::broadcast;

type Result<T> = std::result::Result<T, CommentError>;

fn storage_failure(e: anyhow::Error) -> CommentError {
    tracing::error!("Storage failure: {:#}", e);
    CommentError::Storage(e.to_string())
}

/// GraphQL 和 HTML 页面共用的评论读写入口，所有权限检查都在这里
#[derive(Clone)]
pub struct CommentService {
    db: Db,
    events: broadcast::Sender<CommentEvent>,
}

impl CommentService {
    pub fn new(db: Db, events: broadcast::Sender<CommentEvent>) -> Self {
        Self { db, events }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    fn publish(&self, kind: CommentEventKind, comment: &Comment) {
        let event = CommentEvent::new(kind, &comment.upgrade_guide, &comment.id);
        if self.events.send(event).is_err() {
            tracing::debug!("No live subscribers for comment {}", comment.id);
        }
    }

    async fn load(&self, id: &str) -> Result<Comment> {
        self.db
            .get_comment(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| CommentError::NotFound(id.to_string()))
    }

    pub async fn list_all(&self, viewer: Option<&Viewer>) -> Result<Vec<Comment>> {
        require_viewer(viewer)?;
        self.db.list_comments().await.map_err(storage_failure)
    }

    pub async fn list_by_upgrade(&self, upgrade_guide: &str) -> Result<Vec<Comment>> {
        let guide = UpgradeGuide::new(upgrade_guide).map_err(CommentError::Invalid)?;
        self.db
            .list_comments_by_upgrade(guide.as_str(), false)
            .await
            .map_err(storage_failure)
    }

    pub async fn get(&self, viewer: Option<&Viewer>, id: &str) -> Result<Option<Comment>> {
        require_viewer(viewer)?;
        self.db.get_comment(id).await.map_err(storage_failure)
    }

    pub async fn create(
        &self,
        viewer: Option<&Viewer>,
        input: NewComment,
        subscribe_to_updates: SubscribeToUpdates,
    ) -> Result<Comment> {
        let viewer = require_viewer(viewer)?;
        if !viewer.is_admin() {
            if input.author_id != viewer.user_id {
                return Err(CommentError::Forbidden);
            }
            if input.flagged || input.bookmarked || input.edit_count != 0 {
                return Err(CommentError::Forbidden);
            }
        }
        ensure_body(&input.comment)?;
        if let Some(parent_id) = &input.parent_comment_id {
            self.check_parent(None, parent_id, &input.upgrade_guide)
                .await?;
        }

        let comment = self
            .db
            .insert_comment(&input)
            .await
            .map_err(storage_failure)?;

        if subscribe_to_updates == Some(true) {
            self.db
                .subscribe_to_comment(&comment.author_id, &comment.id)
                .await
                .map_err(storage_failure)?;
        }

        tracing::info!(
            "Comment {} created on {} by {}",
            comment.id,
            comment.upgrade_guide,
            comment.author_id
        );
        self.publish(CommentEventKind::Created, &comment);
        Ok(comment)
    }

    pub async fn update(
        &self,
        viewer: Option<&Viewer>,
        id: &str,
        patch: CommentPatch,
        subscribe_to_updates: SubscribeToUpdates,
    ) -> Result<Comment> {
        let viewer = require_viewer(viewer)?;
        let existing = self.load(id).await?;
        ensure_can_edit(Some(viewer), &existing)?;

        if patch.touches_moderation() && !viewer.is_admin() {
            return Err(CommentError::Forbidden);
        }
        if let Some(body) = &patch.comment {
            ensure_body(body)?;
        }

        let guide = patch
            .upgrade_guide
            .clone()
            .unwrap_or_else(|| existing.upgrade_guide.clone());
        let moves_guide = guide != existing.upgrade_guide;
        if moves_guide {
            // 回复必须和父评论在同一篇文章里，有回复的评论不能单独搬走
            let replies = self
                .db
                .list_replies(id, true)
                .await
                .map_err(storage_failure)?;
            if !replies.is_empty() {
                return Err(CommentError::Invalid(format!(
                    "Comment {} has replies and cannot move to another upgrade guide",
                    id
                )));
            }
        }
        let parent = match &patch.parent_comment_id {
            Some(parent) => parent.as_deref(),
            None if moves_guide => existing.parent_comment_id.as_deref(),
            None => None,
        };
        if let Some(parent_id) = parent {
            self.check_parent(Some(id), parent_id, &guide).await?;
        }

        let comment = self
            .db
            .update_comment(id, &patch)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| CommentError::NotFound(id.to_string()))?;

        match subscribe_to_updates {
            Some(true) => {
                self.db
                    .subscribe_to_comment(&viewer.user_id, id)
                    .await
                    .map_err(storage_failure)?;
            }
            Some(false) => {
                self.db
                    .unsubscribe_from_comment(&viewer.user_id, id)
                    .await
                    .map_err(storage_failure)?;
            }
            None => {}
        }

        tracing::info!("Comment {} updated by {}", id, viewer.user_id);
        self.publish(CommentEventKind::Updated, &comment);
        Ok(comment)
    }

    /// 只改正文
    pub async fn update_content(
        &self,
        viewer: Option<&Viewer>,
        id: &str,
        content: &str,
    ) -> Result<Comment> {
        self.update(viewer, id, CommentPatch::content(content), None)
            .await
    }

    pub async fn delete(&self, viewer: Option<&Viewer>, id: &str) -> Result<Comment> {
        let viewer = require_viewer(viewer)?;
        let existing = self.load(id).await?;
        ensure_can_edit(Some(viewer), &existing)?;

        let comment = self
            .db
            .delete_comment(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| CommentError::NotFound(id.to_string()))?;

        tracing::info!("Comment {} deleted", id);
        self.publish(CommentEventKind::Deleted, &comment);
        Ok(comment)
    }

    pub async fn like(&self, viewer: Option<&Viewer>, id: &str) -> Result<Comment> {
        let viewer = require_viewer(viewer)?;
        let comment = self.load(id).await?;
        self.db
            .like_comment(&viewer.user_id, id)
            .await
            .map_err(storage_failure)?;
        Ok(comment)
    }

    pub async fn unlike(&self, viewer: Option<&Viewer>, id: &str) -> Result<Comment> {
        let viewer = require_viewer(viewer)?;
        let comment = self.load(id).await?;
        self.db
            .unlike_comment(&viewer.user_id, id)
            .await
            .map_err(storage_failure)?;
        Ok(comment)
    }

    pub async fn subscribe_to(
        &self,
        viewer: Option<&Viewer>,
        id: &str,
    ) -> Result<CommentSubscription> {
        let viewer = require_viewer(viewer)?;
        self.load(id).await?;
        self.db
            .subscribe_to_comment(&viewer.user_id, id)
            .await
            .map_err(storage_failure)
    }

    pub async fn unsubscribe_from(&self, viewer: Option<&Viewer>, id: &str) -> Result<bool> {
        let viewer = require_viewer(viewer)?;
        self.load(id).await?;
        self.db
            .unsubscribe_from_comment(&viewer.user_id, id)
            .await
            .map_err(storage_failure)
    }

    /// 父评论必须存在、属于同一篇文章，且不能形成环
    async fn check_parent(
        &self,
        child_id: Option<&str>,
        parent_id: &str,
        guide: &UpgradeGuide,
    ) -> Result<()> {
        let parent = self
            .db
            .get_comment(parent_id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| CommentError::InvalidParent(format!("{} does not exist", parent_id)))?;

        if &parent.upgrade_guide != guide {
            return Err(CommentError::InvalidParent(format!(
                "{} belongs to a different upgrade guide",
                parent_id
            )));
        }

        if let Some(child_id) = child_id {
            let lineage = self
                .db
                .comment_lineage(parent_id)
                .await
                .map_err(storage_failure)?;
            if lineage.iter().any(|id| id == child_id) {
                return Err(CommentError::InvalidParent(
                    "a comment cannot reply to itself or its replies".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn ensure_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(CommentError::Invalid("Comment cannot be empty".to_string()));
    }
    Ok(())
}
