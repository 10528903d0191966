//! `/sitemap.xml` 中间件：固定页面 + 每篇博客文章一条。
//!
//! 每次请求都重新枚举全部文章，不做缓存或分页。

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::Post;
use std::sync::Arc;
use storage::Db;

use crate::render::escape_markup;

pub const SITEMAP_PATH: &str = "/sitemap.xml";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[async_trait]
pub trait PostCatalog: Send + Sync {
    async fn posts(&self) -> anyhow::Result<Vec<Post>>;
}

#[async_trait]
impl PostCatalog for Db {
    async fn posts(&self) -> anyhow::Result<Vec<Post>> {
        self.list_posts().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub changefreq: &'static str,
    pub priority: f32,
}

impl SitemapEntry {
    fn weekly(loc: String, priority: f32) -> Self {
        Self {
            loc,
            changefreq: "weekly",
            priority,
        }
    }
}

#[derive(Clone)]
pub struct SitemapState {
    root_url: String,
    posts: Arc<dyn PostCatalog>,
}

impl SitemapState {
    pub fn new(deploy_url: &str, posts: Arc<dyn PostCatalog>) -> Self {
        Self {
            root_url: deploy_url.trim_end_matches('/').to_string(),
            posts,
        }
    }
}

pub fn build_entries(root_url: &str, posts: &[Post]) -> Vec<SitemapEntry> {
    let mut entries = vec![
        SitemapEntry::weekly(format!("{}/", root_url), 0.5),
        SitemapEntry::weekly(format!("{}/blog", root_url), 0.7),
        SitemapEntry::weekly(format!("{}/brand", root_url), 0.5),
    ];
    entries.extend(
        posts
            .iter()
            .map(|post| SitemapEntry::weekly(format!("{}/blog/{}", root_url, post.slug), 0.7)),
    );
    entries
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));
    for entry in entries {
        xml.push_str(&format!(
            "<url><loc>{}</loc><changefreq>{}</changefreq><priority>{:.1}</priority></url>\n",
            escape_markup(&entry.loc),
            entry.changefreq,
            entry.priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn middleware(State(state): State<SitemapState>, req: Request, next: Next) -> Response {
    if req.uri().path() != SITEMAP_PATH {
        return next.run(req).await;
    }
    tracing::info!("Sitemap request is being handled by middleware");

    let posts = match state.posts.posts().await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!("Failed to enumerate posts for sitemap: {:#}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Sitemap unavailable").into_response();
        }
    };

    let xml = render_sitemap(&build_entries(&state.root_url, &posts));
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    struct FixedPosts(Vec<&'static str>);

    #[async_trait]
    impl PostCatalog for FixedPosts {
        async fn posts(&self) -> anyhow::Result<Vec<Post>> {
            Ok(self
                .0
                .iter()
                .map(|slug| Post {
                    slug: slug.to_string(),
                    title: slug.to_uppercase(),
                    published_at: None,
                })
                .collect())
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl PostCatalog for BrokenCatalog {
        async fn posts(&self) -> anyhow::Result<Vec<Post>> {
            anyhow::bail!("content directory missing")
        }
    }

    fn app(catalog: Arc<dyn PostCatalog>) -> Router {
        let state = SitemapState::new("https://example.com/", catalog);
        Router::new()
            .route("/blog", get(|| async { "blog index" }))
            .fallback(|| async { (StatusCode::NOT_FOUND, "nothing here") })
            .layer(axum::middleware::from_fn_with_state(state, middleware))
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn locs(xml: &str) -> Vec<String> {
        xml.split("<loc>")
            .skip(1)
            .filter_map(|part| part.split_once("</loc>"))
            .map(|(loc, _)| loc.to_string())
            .collect()
    }

    #[tokio::test]
    async fn sitemap_lists_static_pages_and_posts() {
        let resp = app(Arc::new(FixedPosts(vec!["a", "b"])))
            .oneshot(
                HttpRequest::builder()
                    .uri("/sitemap.xml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/xml"
        );
        let xml = body_text(resp).await;
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(
            locs(&xml),
            vec![
                "https://example.com/",
                "https://example.com/blog",
                "https://example.com/brand",
                "https://example.com/blog/a",
                "https://example.com/blog/b",
            ]
        );
        assert!(xml.contains("<changefreq>weekly</changefreq><priority>0.7</priority>"));
    }

    #[tokio::test]
    async fn other_paths_pass_through_untouched() {
        let app = app(Arc::new(FixedPosts(vec!["a"])));

        let resp = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/blog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::CONTENT_TYPE).unwrap() != "application/xml");
        assert_eq!(body_text(resp).await, "blog index");

        let resp = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/sitemap.xml.bak")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_failure_is_a_server_error() {
        let resp = app(Arc::new(BrokenCatalog))
            .oneshot(
                HttpRequest::builder()
                    .uri("/sitemap.xml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn loc_text_is_escaped() {
        let posts = vec![Post {
            slug: "q&a".into(),
            title: "Q&A".into(),
            published_at: None,
        }];
        let xml = render_sitemap(&build_entries("https://example.com", &posts));
        assert!(xml.contains("<loc>https://example.com/blog/q&amp;a</loc>"));
    }
}
