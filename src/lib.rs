//! # biblio-http - HTTP utility client for library management backends
//!
//! `biblio-http` wraps `reqwest` with the conventions a JSON data service
//! expects: shared defaults (base URL, headers, timeout, cookies), uniform
//! response decoding and classified errors. On top of the transport it adds
//! batched GETs, a command layer for insert/update/delete endpoints and
//! prepared queries, and resilience helpers (retry, debounce, polling and a
//! TTL cache).
//!
//! ## Quick Start
//!
//! ```no_run
//! use biblio_http::{Client, CommandOptions, Params};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), biblio_http::Error> {
//!     let client = Client::builder()
//!         .base_url("https://library.example.com")?
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     // GET with query parameters
//!     let mut params = Params::new();
//!     params.insert("author".into(), json!("Machado de Assis"));
//!     let books = client.get("/api/books", &params).await?;
//!     println!("Books: {:?} ({:?})", books.data, books.latency);
//!
//!     // A command endpoint returning an affected-rows envelope
//!     let result = client
//!         .execute_non_query(
//!             "/api/books/insert",
//!             json!({"title": "Quincas Borba"}),
//!             &CommandOptions::new(),
//!         )
//!         .await?;
//!     println!("Inserted {:?}, {} row(s)", result.insert_id, result.affected_rows);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Shared configuration** - Builder defaults plus [`Client::setup`] to merge updates at runtime
//! - **Content-type aware decoding** - JSON, text, binary or raw payloads in a [`Response`]
//! - **Classified errors** - Network, auth and server failures, with raw bodies preserved
//! - **Batched GETs** - [`Client::get_many`] with bounded concurrency and progress callbacks
//! - **Commands and prepared queries** - Envelope normalization across backend dialects
//! - **Resilience** - [`retry::retry`], [`Client::debounce_get`], [`Client::poll`], [`Client::get_cached`]
//! - **Hooks** - Loading indicators, confirmations, notifications and interceptors
//! - **Structured logging** - Every request is traced with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use biblio_http::{Client, Error, Params};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://library.example.com")?.build()?;
//! match client.get("/api/loans", &Params::new()).await {
//!     Ok(response) => println!("Loans: {:?}", response.data),
//!     Err(e) if e.is_auth_error() => eprintln!("Please sign in again"),
//!     Err(Error::HttpError { status, raw_response, .. }) => {
//!         eprintln!("HTTP error {}: {}", status, raw_response);
//!     }
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries
//!
//! ```no_run
//! use biblio_http::retry::{retry_with, OrPredicate, RetryOn5xx, RetryOnTimeout};
//! use biblio_http::{Client, Params, RetryStrategy};
//! use std::time::Duration;
//!
//! # async fn example(client: Client) -> Result<(), biblio_http::Error> {
//! let strategy = RetryStrategy::ExponentialBackoff {
//!     initial_delay: Duration::from_millis(100),
//!     max_delay: Duration::from_secs(30),
//!     max_retries: 5,
//!     jitter: true,
//! };
//! let predicate = OrPredicate::new(vec![Box::new(RetryOn5xx), Box::new(RetryOnTimeout)]);
//! let params = Params::new();
//! let response = retry_with(|| client.get("/api/books", &params), &strategy, &predicate).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
mod client;
pub mod command;
pub mod config;
mod error;
pub mod hooks;
pub mod interceptor;
pub mod poll;
pub mod request;
mod response;
pub mod retry;
pub mod transaction;

pub use batch::{BatchConfig, BatchRequest, BatchRequestSpec};
pub use client::{Client, ClientBuilder, Download, UploadFile, DEFAULT_DEBOUNCE};
pub use command::{
    CommandOptions, CommandResult, InsertId, PreparedParams, PreparedStatement, TransactionResult,
};
pub use config::{ClientConfig, ConfigUpdate, CredentialsPolicy};
pub use error::{Error, Result};
pub use poll::{PollHandle, PollOptions};
pub use request::{Params, RequestBody, RequestDescriptor, RequestOptions};
pub use response::{Payload, Response};
pub use retry::{RetryPredicate, RetryStrategy};
pub use transaction::{NonQueryBatchConfig, NonQueryBatchResult, NonQueryCommand};
