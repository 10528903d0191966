//! 单条评论的 查看/编辑 状态机。
//!
//! 提交时只携带 `{id, content}`；成功回到查看模式，失败保留表单和草稿。

use std::fmt::Display;

pub const UPDATED_NOTICE: &str = "Comment updated";
pub const UPDATE_FAILED_NOTICE: &str = "Error updating comment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Viewing,
    Editing { draft: String },
    Submitting { draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(&'static str),
    Error(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CommentEditor {
    comment_id: String,
    state: EditorState,
    notice: Option<Notice>,
}

impl CommentEditor {
    pub fn new(comment_id: impl Into<String>) -> Self {
        Self {
            comment_id: comment_id.into(),
            state: EditorState::Viewing,
            notice: None,
        }
    }

    pub fn comment_id(&self) -> &str {
        &self.comment_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        !matches!(self.state, EditorState::Viewing)
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditorState::Viewing => None,
            EditorState::Editing { draft } | EditorState::Submitting { draft } => Some(draft),
        }
    }

    pub fn begin_edit(&mut self, current_body: &str) {
        self.state = EditorState::Editing {
            draft: current_body.to_string(),
        };
        self.notice = None;
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Viewing;
    }

    /// 提交中或查看模式下重复提交返回 None
    pub fn submit(&mut self, content: impl Into<String>) -> Option<UpdateRequest> {
        if !matches!(self.state, EditorState::Editing { .. }) {
            return None;
        }
        let content = content.into();
        self.state = EditorState::Submitting {
            draft: content.clone(),
        };
        Some(UpdateRequest {
            id: self.comment_id.clone(),
            content,
        })
    }

    pub fn complete<T, E: Display>(&mut self, result: &Result<T, E>) -> &Notice {
        let draft = self.draft().unwrap_or_default().to_string();
        let notice = match result {
            Ok(_) => {
                self.state = EditorState::Viewing;
                Notice::Success(UPDATED_NOTICE)
            }
            Err(_) => {
                self.state = EditorState::Editing { draft };
                Notice::Error(UPDATE_FAILED_NOTICE)
            }
        };
        self.notice.insert(notice)
    }
}
