use crate::{models::SqlComment, new_id, Db};
use chrono::Utc;
use domain::{Comment, CommentPatch, NewComment};

const COMMENT_COLUMNS: &str = r#"
    id, author_id, upgrade_guide, comment, parent_comment_id,
    visible, flagged, bookmarked, edit_count, created_at, updated_at
"#;

impl Db {
    pub async fn insert_comment(&self, input: &NewComment) -> anyhow::Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: new_id(),
            author_id: input.author_id.clone(),
            upgrade_guide: input.upgrade_guide.clone(),
            comment: input.comment.clone(),
            parent_comment_id: input.parent_comment_id.clone(),
            visible: input.visible,
            flagged: input.flagged,
            bookmarked: input.bookmarked,
            edit_count: input.edit_count,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, author_id, upgrade_guide, comment, parent_comment_id,
                visible, flagged, bookmarked, edit_count, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.author_id)
        .bind(comment.upgrade_guide.as_str())
        .bind(&comment.comment)
        .bind(&comment.parent_comment_id)
        .bind(comment.visible)
        .bind(comment.flagged)
        .bind(comment.bookmarked)
        .bind(comment.edit_count)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list_comments(&self) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// `include_hidden = false` 时只返回 visible 的评论
    pub async fn list_comments_by_upgrade(
        &self,
        upgrade_guide: &str,
        include_hidden: bool,
    ) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE upgrade_guide = ? AND (visible = TRUE OR ?)
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(upgrade_guide)
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 直接回复；`include_hidden = false` 时只返回 visible 的
    pub async fn list_replies(
        &self,
        parent_id: &str,
        include_hidden: bool,
    ) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE parent_comment_id = ? AND (visible = TRUE OR ?)
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(parent_id)
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 从 `comment_id` 开始向上的祖先链 (包含自身)
    pub async fn comment_lineage(&self, comment_id: &str) -> anyhow::Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            WITH RECURSIVE lineage(id, parent_comment_id, depth) AS (
                SELECT id, parent_comment_id, 0 FROM comments WHERE id = ?
                UNION ALL
                SELECT c.id, c.parent_comment_id, l.depth + 1
                FROM comments c
                JOIN lineage l ON c.id = l.parent_comment_id
                WHERE l.depth < 1000
            )
            SELECT id FROM lineage ORDER BY depth ASC
            "#,
        )
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// 部分更新。正文变化时 edit_count + 1，除非显式指定了 edit_count
    pub async fn update_comment(
        &self,
        comment_id: &str,
        patch: &CommentPatch,
    ) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing.map(Comment::from) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        if let Some(author_id) = &patch.author_id {
            updated.author_id = author_id.clone();
        }
        if let Some(guide) = &patch.upgrade_guide {
            updated.upgrade_guide = guide.clone();
        }
        if let Some(body) = &patch.comment {
            updated.comment = body.clone();
        }
        if let Some(parent) = &patch.parent_comment_id {
            updated.parent_comment_id = parent.clone();
        }
        if let Some(visible) = patch.visible {
            updated.visible = visible;
        }
        if let Some(flagged) = patch.flagged {
            updated.flagged = flagged;
        }
        if let Some(bookmarked) = patch.bookmarked {
            updated.bookmarked = bookmarked;
        }
        updated.edit_count = match patch.edit_count {
            Some(count) => count,
            None if updated.comment != existing.comment => existing.edit_count + 1,
            None => existing.edit_count,
        };
        updated.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE comments SET
                author_id = ?, upgrade_guide = ?, comment = ?, parent_comment_id = ?,
                visible = ?, flagged = ?, bookmarked = ?, edit_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.author_id)
        .bind(updated.upgrade_guide.as_str())
        .bind(&updated.comment)
        .bind(&updated.parent_comment_id)
        .bind(updated.visible)
        .bind(updated.flagged)
        .bind(updated.bookmarked)
        .bind(updated.edit_count)
        .bind(updated.updated_at)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// 硬删除，返回被删除的评论；回复不级联删除
    pub async fn delete_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, SqlComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(comment_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        Ok(existing.map(Into::into))
    }
}
