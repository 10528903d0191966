use super::handlers::{admin, graphql, sse, threads};
use crate::sitemap::{self, SitemapState};
use crate::state::AppState;
use async_graphql_axum::GraphQLSubscription;
use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(
    state: AppState,
    sitemap_state: SitemapState,
    allowed_origins: &str,
) -> Router {
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    let subscriptions = GraphQLSubscription::new(state.schema.clone());

    Router::new()
        .route("/graphql", get(graphql::graphiql).post(graphql::graphql_handler))
        .route_service("/graphql/ws", subscriptions)
        .route("/threads/:upgrade_guide", get(threads::show_thread))
        .route(
            "/threads/:upgrade_guide/comments/:comment_id",
            post(threads::submit_edit),
        )
        .route("/api/comments/:upgrade_guide/events", get(sse::sse_handler))
        .route("/api/admin/users", post(admin::create_user))
        .route("/api/admin/sessions", post(admin::issue_session))
        .route("/api/admin/posts", post(admin::upsert_post))
        // 显式 fallback，保证 /sitemap.xml 也经过下面的中间件
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .layer(middleware::from_fn_with_state(
            sitemap_state,
            sitemap::middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
