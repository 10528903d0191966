use crate::{models::SqlUserLink, new_id, Db};
use chrono::Utc;
use domain::Like;

impl Db {
    /// 重复点赞是幂等的，返回已有记录
    pub async fn like_comment(&self, user_id: &str, comment_id: &str) -> anyhow::Result<Like> {
        sqlx::query(
            r#"
            INSERT INTO likes (id, user_id, comment_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, comment_id) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(comment_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, SqlUserLink>(
            "SELECT id, user_id, comment_id, created_at FROM likes WHERE user_id = ? AND comment_id = ?",
        )
        .bind(user_id)
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn unlike_comment(&self, user_id: &str, comment_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND comment_id = ?")
            .bind(user_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_likes(&self, comment_id: &str) -> anyhow::Result<Vec<Like>> {
        let rows = sqlx::query_as::<_, SqlUserLink>(
            r#"
            SELECT id, user_id, comment_id, created_at FROM likes
            WHERE comment_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_db;
    use domain::{NewComment, UpgradeGuide};

    #[tokio::test]
    async fn likes_are_unique_per_user() {
        let db = test_db().await;
        db.upsert_user("alice", "Alice", 2).await.unwrap();
        db.upsert_user("bob", "Bob", 2).await.unwrap();
        let c = db
            .insert_comment(&NewComment {
                author_id: "alice".into(),
                upgrade_guide: UpgradeGuide::new_unchecked("v7".into()),
                comment: "hi".into(),
                parent_comment_id: None,
                visible: true,
                flagged: false,
                bookmarked: false,
                edit_count: 0,
            })
            .await
            .unwrap();

        let first = db.like_comment("bob", &c.id).await.unwrap();
        let again = db.like_comment("bob", &c.id).await.unwrap();
        assert_eq!(first.id, again.id);
        db.like_comment("alice", &c.id).await.unwrap();
        assert_eq!(db.list_likes(&c.id).await.unwrap().len(), 2);

        assert!(db.unlike_comment("bob", &c.id).await.unwrap());
        assert!(!db.unlike_comment("bob", &c.id).await.unwrap());
        assert_eq!(db.list_likes(&c.id).await.unwrap().len(), 1);

        db.delete_comment(&c.id).await.unwrap();
        assert!(db.list_likes(&c.id).await.unwrap().is_empty());
    }
}
