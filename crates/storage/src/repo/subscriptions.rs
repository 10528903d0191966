use crate::{models::SqlUserLink, new_id, Db};
use chrono::Utc;
use domain::CommentSubscription;

impl Db {
    pub async fn subscribe_to_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> anyhow::Result<CommentSubscription> {
        sqlx::query(
            r#"
            INSERT INTO comment_subscriptions (id, user_id, comment_id, created_at)
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
            r#"
            SELECT id, user_id, comment_id, created_at FROM comment_subscriptions
            WHERE user_id = ? AND comment_id = ?
            "#,
        )
        .bind(user_id)
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn unsubscribe_from_comment(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> anyhow::Result<bool> {
        let result =
            sqlx::query("DELETE FROM comment_subscriptions WHERE user_id = ? AND comment_id = ?")
                .bind(user_id)
                .bind(comment_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_subscriptions(
        &self,
        comment_id: &str,
    ) -> anyhow::Result<Vec<CommentSubscription>> {
        let rows = sqlx::query_as::<_, SqlUserLink>(
            r#"
            SELECT id, user_id, comment_id, created_at FROM comment_subscriptions
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
