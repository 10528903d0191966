use axum::extract::FromRef;
use storage::Db;

use crate::graphql::CommentSchema;
use crate::service::CommentService;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub service: CommentService,
    pub schema: CommentSchema,
    pub admin_token: String,
}

impl AppState {
    pub fn new(db: Db, service: CommentService, admin_token: String) -> Self {
        let schema = crate::graphql::build_schema(service.clone());
        Self {
            db,
            service,
            schema,
            admin_token,
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tokio::sync::broadcast;

    pub const ADMIN_TOKEN: &str = "test-admin-token";

    pub async fn test_state() -> AppState {
        let db = Db::new("sqlite::memory:").await.expect("in-memory db");
        let (tx_events, _) = broadcast::channel(16);
        let service = CommentService::new(db.clone(), tx_events);
        AppState::new(db, service, ADMIN_TOKEN.to_string())
    }
}
