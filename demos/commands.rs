//! Command helpers: non-query execution, confirmation and batches.
//!
//! Run with: `cargo run --example commands`

use biblio_http::hooks::Confirmer;
use biblio_http::retry::retry;
use biblio_http::{Client, CommandOptions, Error, NonQueryBatchConfig, NonQueryCommand};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, message: &str) -> bool {
        println!("  [confirm] {message} -> yes");
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("biblio_http=info,commands=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .confirmer(Arc::new(AutoConfirm))
        .build()?;

    println!("=== Non-query command ===");
    let result = client
        .execute_non_query(
            "/posts",
            json!({"title": "Esaú e Jacó", "userId": 2}),
            &CommandOptions::new().show_notification(true),
        )
        .await?;
    println!(
        "success={} insert_id={:?} message={}",
        result.success, result.insert_id, result.message
    );
    println!();

    println!("=== Confirmed command ===");
    let result = client
        .execute_non_query(
            "/posts",
            json!({"title": "Memorial de Aires"}),
            &CommandOptions::new().confirm("Publish this post?"),
        )
        .await?;
    println!("cancelled={} success={}", result.cancelled, result.success);
    println!();

    println!("=== Command batch ===");
    let commands = ["Ressurreição", "A Mão e a Luva", "Helena"]
        .into_iter()
        .map(|title| NonQueryCommand::new("/posts", json!({"title": title})))
        .collect();
    let batch = client
        .execute_non_query_batch(
            commands,
            NonQueryBatchConfig::new()
                .parallel(true)
                .on_progress(|done, total, index, _, error| {
                    println!("  {done}/{total} (command #{index}, failed: {})", error.is_some());
                }),
        )
        .await;
    println!(
        "success={} executed={}/{} errors={:?}",
        batch.success, batch.executed, batch.total, batch.errors
    );
    println!();

    println!("=== Retry with fixed delay ===");
    let options = CommandOptions::new();
    let outcome = retry(
        || client.execute_non_query("/posts", json!({}), &options),
        3,
        Duration::from_millis(250),
    )
    .await;
    println!("retry outcome ok: {}", outcome.is_ok());

    Ok(())
}
