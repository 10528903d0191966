use crate::{models::SqlUser, Db};
use chrono::Utc;
use domain::User;
use sha2::{Digest, Sha256};

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl Db {
    pub async fn upsert_user(&self, id: &str, name: &str, role_id: i64) -> anyhow::Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, role_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role_id = excluded.role_id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_user(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User vanished after upsert: {}", id))
    }

    pub async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(
            r#"
            SELECT u.id, u.name, r.id AS role_id, r.name AS role_name
            FROM users u
            JOIN roles r ON u.role_id = r.id
            WHERE u.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// 生成新的会话令牌，只有调用方能看到明文
    pub async fn issue_session(&self, user_id: &str) -> anyhow::Result<String> {
        let token = format!(
            "{:032x}{:032x}",
            rand::random::<u128>(),
            rand::random::<u128>()
        );

        sqlx::query("INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(hash_token(&token))
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    pub async fn find_session_user(&self, token: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(
            r#"
            SELECT u.id, u.name, r.id AS role_id, r.name AS role_name
            FROM sessions s
            JOIN users u ON s.user_id = u.id
            JOIN roles r ON u.role_id = r.id
            WHERE s.token_hash = ?
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
