//! Basic example: configuration, verb helpers, batched GETs and caching.
//!
//! Run with: `cargo run --example basic_usage`

use biblio_http::{BatchConfig, BatchRequest, Client, ConfigUpdate, Error, Params};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("biblio_http=debug,basic_usage=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .timeout(Duration::from_secs(10))
        .build()?;

    client.setup(ConfigUpdate::new().header("X-Client", "biblio-demo"))?;

    println!("=== GET with query parameters ===");
    let mut params = Params::new();
    params.insert("userId".to_string(), json!(1));
    let response = client.get("/posts", &params).await?;
    let posts: Vec<Post> = response.decode()?;
    println!("{} posts for user 1 in {:?}", posts.len(), response.latency);
    println!();

    println!("=== POST ===");
    let response = client
        .post("/posts", json!({"title": "Memórias Póstumas", "body": "...", "userId": 1}))
        .await?;
    println!("Created: {:?}", response.json());
    println!();

    println!("=== Batched GETs ===");
    let urls: Vec<BatchRequest> = (1..=5).map(|id| format!("/posts/{id}").into()).collect();
    let results = client
        .get_many(
            urls,
            BatchConfig::new()
                .concurrency(2)
                .on_progress(|done, total, index, _| println!("  {done}/{total} (request #{index})")),
        )
        .await?;
    for result in results.into_iter().flatten() {
        let post: Post = result.decode()?;
        println!("  #{}: {}", post.id, post.title);
    }
    println!();

    println!("=== Cached GET ===");
    let no_params = Params::new();
    let first = client.get_cached("/users/1", &no_params, Duration::from_secs(60)).await?;
    let second = client.get_cached("/users/1", &no_params, Duration::from_secs(60)).await?;
    println!("Same payload from cache: {}", first.data == second.data);

    println!();
    println!("=== Error classification ===");
    match client.get("/does-not-exist", &no_params).await {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!(
            "status={:?} auth={} server={} message={}",
            e.status(),
            e.is_auth_error(),
            e.is_server_error(),
            e.user_message()
        ),
    }

    Ok(())
}
