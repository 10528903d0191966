use crate::{models::SqlPost, Db};
use domain::Post;

impl Db {
    pub async fn upsert_post(&self, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (slug, title, published_at)
            VALUES (?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                published_at = excluded.published_at
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(post.published_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, SqlPost>(
            "SELECT slug, title, published_at FROM posts ORDER BY published_at DESC, slug ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_db;
    use domain::Post;

    #[tokio::test]
    async fn upsert_replaces_title() {
        let db = test_db().await;
        let mut post = Post {
            slug: "a".into(),
            title: "A".into(),
            published_at: None,
        };
        db.upsert_post(&post).await.unwrap();
        post.title = "A again".into();
        db.upsert_post(&post).await.unwrap();

        let posts = db.list_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "A again");
    }
}
