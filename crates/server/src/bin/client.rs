use serde_json::{json, Value};
use std::time::Instant;

const BASE_URL: &str = "http://127.0.0.1:3000";
const UPGRADE_GUIDE: &str = "v7";

const COMMENTS_QUERY: &str = r#"
    query CommentsByUpgrade($upgradeGuide: String!) {
        commentsByUpgrade(upgradeGuide: $upgradeGuide) {
            id
            comment
            authorName
            editCount
            updatedAt
        }
    }
"#;

const CREATE_MUTATION: &str = r#"
    mutation CreateComment($input: CreateCommentInput!) {
        createComment(input: $input, subscribeToUpdates: true) { id }
    }
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("COMMENTARY_URL").unwrap_or_else(|_| BASE_URL.to_string());
    let client = reqwest::Client::new();
    println!("Starting Commentary smoke client against {}...", base_url);

    println!("\n[1/3] Fetching sitemap...");
    let start = Instant::now();
    let resp = client.get(format!("{}/sitemap.xml", base_url)).send().await?;
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let xml = resp.text().await?;
    println!("   -> Content-Type: {}", content_type);
    println!("   -> {} URL(s) in {:.2?}", xml.matches("<loc>").count(), start.elapsed());

    println!("\n[2/3] Posting a comment...");
    // 需要先通过 /api/admin/sessions 拿到令牌
    match (std::env::var("COMMENTARY_TOKEN"), std::env::var("COMMENTARY_USER")) {
        (Ok(token), Ok(user)) => {
            let body = json!({
                "query": CREATE_MUTATION,
                "variables": {
                    "input": {
                        "authorId": user,
                        "upgradeGuide": UPGRADE_GUIDE,
                        "comment": "This is a message from the Commentary smoke client!",
                        "visible": true,
                        "flagged": false,
                        "bookmarked": false,
                        "editCount": 0
                    }
                }
            });
            let resp: Value = client
                .post(format!("{}/graphql", base_url))
                .bearer_auth(token)
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            if resp["errors"].is_array() {
                println!("   -> ❌ Failed: {}", resp["errors"]);
            } else {
                println!("   -> ✅ Created {}", resp["data"]["createComment"]["id"]);
            }
        }
        _ => println!("   -> Skipped (set COMMENTARY_TOKEN and COMMENTARY_USER)"),
    }

    println!("\n[3/3] Fetching thread for {}...", UPGRADE_GUIDE);
    let body = json!({
        "query": COMMENTS_QUERY,
        "variables": { "upgradeGuide": UPGRADE_GUIDE }
    });
    let resp: Value = client
        .post(format!("{}/graphql", base_url))
        .json(&body)
        .send()
        .await?
        .json()
        .await?;

    let empty = Vec::new();
    let comments = resp["data"]["commentsByUpgrade"].as_array().unwrap_or(&empty);
    println!("   -> Retrieved {} comment(s):", comments.len());
    for c in comments {
        println!(
            "      - [{}] {}: {}",
            c["updatedAt"].as_str().unwrap_or("?"),
            c["authorName"].as_str().unwrap_or("?"),
            c["comment"].as_str().unwrap_or("")
        );
    }

    Ok(())
}
