use crate::{error::CommentError, models::Comment, models::Viewer};

/// 作者本人或管理员可以编辑/删除
pub fn can_edit(viewer: Option<&Viewer>, comment: &Comment) -> bool {
    match viewer {
        Some(v) => v.user_id == comment.author_id || v.is_admin(),
        None => false,
    }
}

pub fn require_viewer(viewer: Option<&Viewer>) -> Result<&Viewer, CommentError> {
    viewer.ok_or(CommentError::Unauthenticated)
}

pub fn ensure_can_edit(viewer: Option<&Viewer>, comment: &Comment) -> Result<(), CommentError> {
    require_viewer(viewer)?;
    if can_edit(viewer, comment) {
        Ok(())
    } else {
        Err(CommentError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UpgradeGuide, ADMIN_ROLE_ID};
    use chrono::Utc;

    fn comment_by(author: &str) -> Comment {
        Comment {
            id: "42".into(),
            author_id: author.into(),
            upgrade_guide: UpgradeGuide::new_unchecked("v7".into()),
            comment: "hi".into(),
            parent_comment_id: None,
            visible: true,
            flagged: false,
            bookmarked: false,
            edit_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn author_and_admin_can_edit() {
        let c = comment_by("alice");
        let alice = Viewer { user_id: "alice".into(), role_id: 2 };
        let bob = Viewer { user_id: "bob".into(), role_id: 2 };
        let admin = Viewer { user_id: "root".into(), role_id: ADMIN_ROLE_ID };

        assert!(can_edit(Some(&alice), &c));
        assert!(can_edit(Some(&admin), &c));
        assert!(!can_edit(Some(&bob), &c));
        assert!(!can_edit(None, &c));
    }

    #[test]
    fn ensure_distinguishes_anonymous_from_forbidden() {
        let c = comment_by("alice");
        let bob = Viewer { user_id: "bob".into(), role_id: 2 };
        assert_eq!(ensure_can_edit(None, &c), Err(CommentError::Unauthenticated));
        assert_eq!(ensure_can_edit(Some(&bob), &c), Err(CommentError::Forbidden));
    }
}
