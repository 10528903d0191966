use crate::models::UpgradeGuide;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentEventKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub kind: CommentEventKind,
    pub upgrade_guide: UpgradeGuide,
    pub comment_id: String,
}

impl CommentEvent {
    pub fn new(kind: CommentEventKind, upgrade_guide: &UpgradeGuide, comment_id: &str) -> Self {
        Self {
            kind,
            upgrade_guide: upgrade_guide.clone(),
            comment_id: comment_id.to_string(),
        }
    }

    pub fn sse_name(&self) -> &'static str {
        match self.kind {
            CommentEventKind::Created => "new_comment",
            CommentEventKind::Updated => "update_comment",
            CommentEventKind::Deleted => "delete_comment",
        }
    }
}
