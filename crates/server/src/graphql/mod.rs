//! GraphQL 接口。
//!
//! 字段命名沿用博客前端的 schema (`Comments`, `Like`, `SubscribeUserToComment` 等)。

mod mutation;
mod query;
mod subscription;
mod types;

use async_graphql::{Context, ErrorExtensions, Schema};
use domain::{CommentError, User, Viewer};

use crate::service::CommentService;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use subscription::SubscriptionRoot;

pub type CommentSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// 每个请求注入的调用者
pub struct RequestUser(pub Option<User>);

pub fn build_schema(service: CommentService) -> CommentSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(service)
        .finish()
}

pub(crate) fn current_user<'a>(ctx: &'a Context<'_>) -> Option<&'a User> {
    ctx.data_opt::<RequestUser>().and_then(|u| u.0.as_ref())
}

pub(crate) fn current_viewer(ctx: &Context<'_>) -> Option<Viewer> {
    current_user(ctx).map(Viewer::from)
}

pub(crate) trait GqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResultExt<T> for Result<T, CommentError> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| {
            let code = e.code();
            async_graphql::Error::new(e.to_string()).extend_with(|_, ext| ext.set("code", code))
        })
    }
}

impl<T> GqlResultExt<T> for anyhow::Result<T> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| {
            tracing::error!("GraphQL resolver failed: {:#}", e);
            async_graphql::Error::new("Internal server error")
                .extend_with(|_, ext| ext.set("code", "INTERNAL_SERVER_ERROR"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use async_graphql::{Request, Variables};
    use domain::ADMIN_ROLE_ID;
    use serde_json::json;

    async fn setup() -> (CommentSchema, storage::Db) {
        let state = test_state().await;
        state.db.upsert_user("alice", "Alice", 2).await.unwrap();
        state.db.upsert_user("bob", "Bob", 2).await.unwrap();
        state.db.upsert_user("root", "Root", ADMIN_ROLE_ID).await.unwrap();
        (state.schema, state.db)
    }

    async fn run(
        schema: &CommentSchema,
        db: &storage::Db,
        as_user: Option<&str>,
        query: &str,
        vars: serde_json::Value,
    ) -> async_graphql::Response {
        let user = match as_user {
            Some(id) => db.get_user(id).await.unwrap(),
            None => None,
        };
        let req = Request::new(query)
            .variables(Variables::from_json(vars))
            .data(RequestUser(user));
        schema.execute(req).await
    }

    const CREATE: &str = r#"
        mutation Create($input: CreateCommentInput!) {
            createComment(input: $input, subscribeToUpdates: true) {
                id comment editCount authorName authorRole
                SubscribeUserToComment { userId }
            }
        }
    "#;

    fn create_vars(author: &str, body: &str, parent: Option<&str>) -> serde_json::Value {
        json!({
            "input": {
                "authorId": author,
                "upgradeGuide": "v7",
                "comment": body,
                "parentCommentId": parent,
                "visible": true,
                "flagged": false,
                "bookmarked": false,
                "editCount": 0
            }
        })
    }

    async fn create(schema: &CommentSchema, db: &storage::Db, author: &str, body: &str, parent: Option<&str>) -> String {
        let resp = run(schema, db, Some(author), CREATE, create_vars(author, body, parent)).await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        data["createComment"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_and_fetch_thread() {
        let (schema, db) = setup().await;
        let root = create(&schema, &db, "alice", "root", None).await;
        create(&schema, &db, "bob", "reply", Some(&root)).await;

        let resp = run(
            &schema,
            &db,
            None,
            r#"query($g: String!) {
                commentsByUpgrade(upgradeGuide: $g) {
                    id comment parentCommentId
                    author { name role { id } }
                    parentComment { id }
                    Comments { comment }
                    Like { id }
                }
            }"#,
            json!({ "g": "v7" }),
        )
        .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        let list = data["commentsByUpgrade"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["author"]["name"], "Alice");
        assert_eq!(list[0]["Comments"][0]["comment"], "reply");
        assert_eq!(list[1]["parentComment"]["id"], root.as_str());
    }

    #[tokio::test]
    async fn authenticated_queries_reject_anonymous() {
        let (schema, db) = setup().await;
        let resp = run(&schema, &db, None, "{ comments { id } }", json!({})).await;
        assert_eq!(resp.errors.len(), 1);
        let ext = resp.errors[0].extensions.as_ref().unwrap();
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("UNAUTHENTICATED")));
    }

    #[tokio::test]
    async fn update_comment_content_by_author() {
        let (schema, db) = setup().await;
        let id = create(&schema, &db, "alice", "first", None).await;
        let mutation = r#"mutation($id: String!, $content: String!) {
            updateCommentContent(id: $id, content: $content) { id comment editCount }
        }"#;

        let denied = run(&schema, &db, Some("bob"), mutation, json!({ "id": id, "content": "x" })).await;
        let ext = denied.errors[0].extensions.as_ref().unwrap();
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("FORBIDDEN")));

        let ok = run(&schema, &db, Some("alice"), mutation, json!({ "id": id, "content": "Hello" })).await;
        assert!(ok.errors.is_empty(), "{:?}", ok.errors);
        let data = ok.data.into_json().unwrap();
        assert_eq!(data["updateCommentContent"]["id"], id.as_str());
        assert_eq!(data["updateCommentContent"]["comment"], "Hello");
        assert_eq!(data["updateCommentContent"]["editCount"], 1);
    }

    #[tokio::test]
    async fn likes_and_delete() {
        let (schema, db) = setup().await;
        let id = create(&schema, &db, "alice", "first", None).await;

        let liked = run(
            &schema,
            &db,
            Some("bob"),
            r#"mutation($id: String!) { likeComment(id: $id) { Like { userId } } }"#,
            json!({ "id": id }),
        )
        .await;
        let data = liked.data.into_json().unwrap();
        assert_eq!(data["likeComment"]["Like"][0]["userId"], "bob");

        let deleted = run(
            &schema,
            &db,
            Some("root"),
            r#"mutation($id: String!) { deleteComment(id: $id) { id } }"#,
            json!({ "id": id }),
        )
        .await;
        assert!(deleted.errors.is_empty(), "{:?}", deleted.errors);

        let fetched = run(
            &schema,
            &db,
            Some("alice"),
            r#"query($id: String!) { comment(id: $id) { id } }"#,
            json!({ "id": id }),
        )
        .await;
        assert_eq!(fetched.data.into_json().unwrap()["comment"], serde_json::Value::Null);
    }

    const UPDATE: &str = r#"mutation($id: String!, $input: UpdateCommentInput!) {
        updateComment(id: $id, input: $input) { id parentCommentId upgradeGuide visible }
    }"#;

    #[tokio::test]
    async fn hidden_replies_stay_hidden_in_nested_fields() {
        let (schema, db) = setup().await;
        let root = create(&schema, &db, "alice", "root", None).await;
        let spam = create(&schema, &db, "bob", "HIDDEN-SPAM", Some(&root)).await;

        let hidden = run(
            &schema,
            &db,
            Some("root"),
            UPDATE,
            json!({ "id": spam, "input": { "visible": false } }),
        )
        .await;
        assert!(hidden.errors.is_empty(), "{:?}", hidden.errors);

        let thread = r#"query($g: String!) {
            commentsByUpgrade(upgradeGuide: $g) { comment Comments { comment visible } }
        }"#;
        for as_user in [None, Some("alice")] {
            let resp = run(&schema, &db, as_user, thread, json!({ "g": "v7" })).await;
            assert!(resp.errors.is_empty(), "{:?}", resp.errors);
            let data = resp.data.into_json().unwrap();
            assert_eq!(data["commentsByUpgrade"], json!([{ "comment": "root", "Comments": [] }]));
        }

        let resp = run(&schema, &db, Some("root"), thread, json!({ "g": "v7" })).await;
        let data = resp.data.into_json().unwrap();
        assert_eq!(
            data["commentsByUpgrade"][0]["Comments"],
            json!([{ "comment": "HIDDEN-SPAM", "visible": false }])
        );

        // 隐藏的父评论也不能从回复那边拿到
        let reply = create(&schema, &db, "bob", "visible reply", Some(&spam)).await;
        let parent_of = r#"query($id: String!) { comment(id: $id) { parentComment { id } } }"#;
        let resp = run(&schema, &db, Some("alice"), parent_of, json!({ "id": reply })).await;
        let data = resp.data.into_json().unwrap();
        assert_eq!(data["comment"]["parentComment"], serde_json::Value::Null);
        let resp = run(&schema, &db, Some("root"), parent_of, json!({ "id": reply })).await;
        let data = resp.data.into_json().unwrap();
        assert_eq!(data["comment"]["parentComment"]["id"], spam.as_str());
    }

    #[tokio::test]
    async fn update_comment_guide_and_parent() {
        let (schema, db) = setup().await;
        let root = create(&schema, &db, "alice", "root", None).await;
        let reply = create(&schema, &db, "alice", "reply", Some(&root)).await;

        let moved = run(
            &schema,
            &db,
            Some("alice"),
            UPDATE,
            json!({ "id": reply, "input": { "upgradeGuide": "v8" } }),
        )
        .await;
        let ext = moved.errors[0].extensions.as_ref().unwrap();
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("BAD_USER_INPUT")));

        // 省略 parentCommentId 不改父评论
        let kept = run(
            &schema,
            &db,
            Some("alice"),
            UPDATE,
            json!({ "id": reply, "input": { "comment": "edited" } }),
        )
        .await;
        assert!(kept.errors.is_empty(), "{:?}", kept.errors);
        assert_eq!(kept.data.into_json().unwrap()["updateComment"]["parentCommentId"], root.as_str());

        let detached = run(
            &schema,
            &db,
            Some("alice"),
            UPDATE,
            json!({ "id": reply, "input": { "parentCommentId": null, "upgradeGuide": "v8" } }),
        )
        .await;
        assert!(detached.errors.is_empty(), "{:?}", detached.errors);
        let data = detached.data.into_json().unwrap();
        assert_eq!(data["updateComment"]["parentCommentId"], serde_json::Value::Null);
        assert_eq!(data["updateComment"]["upgradeGuide"], "v8");
    }
}
