use crate::models::UpgradeGuide;

/// 新建评论的输入 (对应 GraphQL `CreateCommentInput`)
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: String,
    pub upgrade_guide: UpgradeGuide,
    pub comment: String,
    pub parent_comment_id: Option<String>,
    pub visible: bool,
    pub flagged: bool,
    pub bookmarked: bool,
    pub edit_count: i32,
}

/// 部分更新，`None` 表示保持不变。
///
/// `parent_comment_id` 是三态的：`Some(None)` 把评论移到顶层。
#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub author_id: Option<String>,
    pub upgrade_guide: Option<UpgradeGuide>,
    pub comment: Option<String>,
    pub parent_comment_id: Option<Option<String>>,
    pub visible: Option<bool>,
    pub flagged: Option<bool>,
    pub bookmarked: Option<bool>,
    pub edit_count: Option<i32>,
}

impl CommentPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            comment: Some(content.into()),
            ..Default::default()
        }
    }

    /// 只有管理员才能改的字段
    pub fn touches_moderation(&self) -> bool {
        self.author_id.is_some()
            || self.visible.is_some()
            || self.flagged.is_some()
            || self.bookmarked.is_some()
            || self.edit_count.is_some()
    }
}

/// 订阅开关: Some(true) 订阅, Some(false) 取消, None 不变
pub type SubscribeToUpdates = Option<bool>;
