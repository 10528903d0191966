use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use domain::{
    access::can_edit,
    editor::{CommentEditor, Notice, UPDATED_NOTICE},
    CommentError, User, Viewer,
};
use serde::Deserialize;
use std::collections::HashMap;

use super::{reject, status_for};
use crate::auth::CurrentUser;
use crate::render::ThreadPage;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ThreadQuery {
    pub edit: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct EditForm {
    pub comment: String,
}

async fn render_thread(
    state: &AppState,
    upgrade_guide: &str,
    user: Option<&User>,
    editor: Option<&CommentEditor>,
    notice: Option<&Notice>,
) -> Result<String, (StatusCode, String)> {
    let comments = state
        .service
        .list_by_upgrade(upgrade_guide)
        .await
        .map_err(reject)?;

    let mut authors: HashMap<String, User> = HashMap::new();
    for c in &comments {
        if authors.contains_key(&c.author_id) {
            continue;
        }
        match state.db.get_user(&c.author_id).await {
            Ok(Some(author)) => {
                authors.insert(author.id.clone(), author);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load author {}: {:#}", c.author_id, e),
        }
    }

    let viewer = user.map(Viewer::from);
    Ok(ThreadPage {
        upgrade_guide,
        comments: &comments,
        authors: &authors,
        viewer: viewer.as_ref(),
        editor,
        notice,
        now: Utc::now(),
    }
    .render())
}

pub async fn show_thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(upgrade_guide): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let viewer = user.as_ref().map(Viewer::from);

    // ?edit=<id> 打开编辑表单，仅作者或管理员
    let mut editor = None;
    if let Some(edit_id) = &query.edit {
        let target = state
            .db
            .get_comment(edit_id)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        if let Some(c) = target.filter(|c| can_edit(viewer.as_ref(), c)) {
            let mut e = CommentEditor::new(&c.id);
            e.begin_edit(&c.comment);
            editor = Some(e);
        }
    }

    let notice = (query.notice.as_deref() == Some("updated")).then_some(Notice::Success(UPDATED_NOTICE));

    let html = render_thread(
        &state,
        &upgrade_guide,
        user.as_ref(),
        editor.as_ref(),
        notice.as_ref(),
    )
    .await?;
    Ok(Html(html))
}

/// 编辑表单提交：成功后重定向回评论串，失败则保留表单并提示
pub async fn submit_edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((upgrade_guide, comment_id)): Path<(String, String)>,
    Form(form): Form<EditForm>,
) -> Response {
    let viewer = user.as_ref().map(Viewer::from);
    if viewer.is_none() {
        return reject(CommentError::Unauthenticated).into_response();
    }

    // 路径里的 upgrade_guide 必须是评论所在的那篇
    let in_thread = match state.db.get_comment(&comment_id).await {
        Ok(found) => found.is_some_and(|c| c.upgrade_guide.as_str() == upgrade_guide),
        Err(e) => {
            tracing::error!("Failed to load comment {}: {:#}", comment_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    if !in_thread {
        return reject(CommentError::NotFound(comment_id)).into_response();
    }

    let mut editor = CommentEditor::new(&comment_id);
    editor.begin_edit(&form.comment);
    let Some(request) = editor.submit(form.comment) else {
        return (StatusCode::CONFLICT, "Edit already in progress").into_response();
    };

    let result = state
        .service
        .update_content(viewer.as_ref(), &request.id, &request.content)
        .await;
    if let Err(e) = &result {
        tracing::error!("Error updating comment {}: {}", request.id, e);
    }
    let status = result
        .as_ref()
        .err()
        .map(status_for)
        .unwrap_or(StatusCode::OK);
    let notice = editor.complete(&result).clone();

    if !editor.is_editing() {
        return Redirect::to(&format!(
            "/threads/{}?notice=updated#comment-{}",
            upgrade_guide, comment_id
        ))
        .into_response();
    }

    match render_thread(
        &state,
        &upgrade_guide,
        user.as_ref(),
        Some(&editor),
        Some(&notice),
    )
    .await
    {
        Ok(html) => (status, Html(html)).into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::http::router::build_router;
    use crate::service::tests::new_comment;
    use crate::sitemap::SitemapState;
    use crate::state::test_support::test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn setup() -> (axum::Router, storage::Db, String, String, String) {
        let state = test_state().await;
        let db = state.db.clone();
        db.upsert_user("alice", "Alice", 2).await.unwrap();
        db.upsert_user("bob", "Bob", 2).await.unwrap();
        let comment = db
            .insert_comment(&new_comment("alice", "original", None))
            .await
            .unwrap();
        let alice_token = db.issue_session("alice").await.unwrap();
        let bob_token = db.issue_session("bob").await.unwrap();

        let sitemap = SitemapState::new("https://example.com", Arc::new(db.clone()));
        let app = build_router(state, sitemap, "*");
        (app, db, comment.id, alice_token, bob_token)
    }

    fn edit_request(comment_id: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/threads/v7/comments/{}", comment_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("comment={}", body)))
            .unwrap()
    }

    #[tokio::test]
    async fn author_edit_redirects_back_to_view() {
        let (app, db, id, alice, _) = setup().await;

        let resp = app
            .clone()
            .oneshot(edit_request(&id, &alice, "Hello"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, format!("/threads/v7?notice=updated#comment-{}", id));

        let stored = db.get_comment(&id).await.unwrap().unwrap();
        assert_eq!(stored.comment, "Hello");
        assert_eq!(stored.edit_count, 1);

        let page = app
            .oneshot(
                Request::builder()
                    .uri("/threads/v7?notice=updated")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(page).await;
        assert!(html.contains("Comment updated"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(!html.contains("<textarea"));
    }

    #[tokio::test]
    async fn forbidden_edit_keeps_form_open() {
        let (app, db, id, _, bob) = setup().await;

        let resp = app.oneshot(edit_request(&id, &bob, "Hijacked")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let html = body_text(resp).await;
        assert!(html.contains("Error updating comment"));
        assert!(html.contains("<textarea name=\"comment\">Hijacked</textarea>"));

        assert_eq!(db.get_comment(&id).await.unwrap().unwrap().comment, "original");
    }

    #[tokio::test]
    async fn edit_through_another_thread_is_not_found() {
        let (app, db, id, alice, _) = setup().await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/threads/v8/comments/{}", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", alice))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("comment=moved"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(db.get_comment(&id).await.unwrap().unwrap().comment, "original");

        let anonymous = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/threads/v7/comments/{}", id))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("comment=anon"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn edit_query_opens_form_only_for_author() {
        let (app, _, id, alice, bob) = setup().await;
        let page_as = |token: String| {
            Request::builder()
                .uri(format!("/threads/v7?edit={}", id))
                .header(header::COOKIE, format!("session={}", token))
                .body(Body::empty())
                .unwrap()
        };

        let html = body_text(app.clone().oneshot(page_as(alice)).await.unwrap()).await;
        assert!(html.contains("<textarea name=\"comment\">original</textarea>"));
        assert!(html.contains("class=\"edit\""));

        let html = body_text(app.oneshot(page_as(bob)).await.unwrap()).await;
        assert!(!html.contains("<textarea"));
        assert!(!html.contains("class=\"edit\""));
    }
}
