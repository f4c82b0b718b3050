//! Batched GET requests with optional bounded concurrency.
//!
//! [`Client::get_many`] runs a list of GET requests and returns their outcomes
//! in input order, whatever order they complete in.

use crate::request::{Params, RequestOptions};
use crate::response::Response;
use crate::{Client, Error, Result};
use futures_util::stream::{FuturesUnordered, StreamExt};

/// One entry of a batch: a bare URL or a URL with parameters and options.
#[derive(Debug, Clone)]
pub enum BatchRequest {
    /// A bare URL, fetched without parameters.
    Url(String),
    /// A fully specified request.
    Spec(BatchRequestSpec),
}

/// A normalized batch entry.
#[derive(Debug, Clone, Default)]
pub struct BatchRequestSpec {
    /// Request URL, relative to the client base URL.
    pub url: String,
    /// Query parameters.
    pub params: Params,
    /// Per-call options.
    pub options: RequestOptions,
}

impl BatchRequestSpec {
    /// Creates an entry for `url` with no parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the query parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the per-call options.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl BatchRequest {
    /// Converts into the normalized form.
    pub fn normalize(self) -> BatchRequestSpec {
        match self {
            BatchRequest::Url(url) => BatchRequestSpec::new(url),
            BatchRequest::Spec(spec) => spec,
        }
    }
}

impl From<&str> for BatchRequest {
    fn from(url: &str) -> Self {
        BatchRequest::Url(url.to_string())
    }
}

impl From<String> for BatchRequest {
    fn from(url: String) -> Self {
        BatchRequest::Url(url)
    }
}

impl From<BatchRequestSpec> for BatchRequest {
    fn from(spec: BatchRequestSpec) -> Self {
        BatchRequest::Spec(spec)
    }
}

/// Progress callback: `(completed, total, index, error)`.
pub type ProgressFn = Box<dyn FnMut(usize, usize, usize, Option<&Error>) + Send>;

/// Settings for [`Client::get_many`].
#[derive(Default)]
pub struct BatchConfig {
    /// Maximum requests in flight; `0` means unbounded.
    pub concurrency: usize,
    /// Stop admitting new requests once one has failed (bounded mode only).
    pub stop_on_error: bool,
    /// Called after every individual completion.
    pub on_progress: Option<ProgressFn>,
    /// Return failures in place instead of failing the whole batch.
    pub return_errors: bool,
}

impl BatchConfig {
    /// Unbounded concurrency, first error returned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits how many requests are in flight at once.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Stops admitting requests after the first failure.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Keeps failures in the result list.
    pub fn return_errors(mut self, keep: bool) -> Self {
        self.return_errors = keep;
        self
    }

    /// Sets the progress callback.
    pub fn on_progress(
        mut self,
        callback: impl FnMut(usize, usize, usize, Option<&Error>) + Send + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConfig")
            .field("concurrency", &self.concurrency)
            .field("stop_on_error", &self.stop_on_error)
            .field("on_progress", &self.on_progress.is_some())
            .field("return_errors", &self.return_errors)
            .finish()
    }
}

impl Client {
    /// Runs many GET requests and returns their outcomes in input order.
    ///
    /// With `concurrency == 0` (or at least the number of requests) every
    /// request is issued at once. Otherwise at most `concurrency` are in
    /// flight and the next queued request is admitted as soon as one settles.
    ///
    /// The returned list always has one entry per input. With
    /// `return_errors == false` every entry is `Ok`, and the failure with the
    /// lowest index is returned as `Err` once every admitted request has
    /// settled. With `return_errors == true` failures stay in place, and
    /// entries never admitted because of `stop_on_error` are
    /// [`Error::Skipped`].
    ///
    /// In-flight requests are never abandoned: `stop_on_error` only stops
    /// admission.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::{BatchConfig, BatchRequestSpec, Client};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    ///
    /// let page_two = json!({"page": 2}).as_object().cloned().unwrap_or_default();
    /// let results = client
    ///     .get_many(
    ///         vec![
    ///             "/api/books/1".into(),
    ///             BatchRequestSpec::new("/api/books").params(page_two).into(),
    ///         ],
    ///         BatchConfig::new()
    ///             .concurrency(2)
    ///             .on_progress(|done, total, _, _| println!("{done}/{total}")),
    ///     )
    ///     .await?;
    /// assert_eq!(results.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_many(
        &self,
        requests: Vec<BatchRequest>,
        mut config: BatchConfig,
    ) -> Result<Vec<Result<Response>>> {
        let specs: Vec<BatchRequestSpec> = requests.into_iter().map(BatchRequest::normalize).collect();
        let total = specs.len();
        let limit = if config.concurrency == 0 || config.concurrency >= total {
            total
        } else {
            config.concurrency
        };

        tracing::debug!(total = total, concurrency = limit, "Starting batch");

        let mut slots: Vec<Option<Result<Response>>> = (0..total).map(|_| None).collect();
        let mut queue = specs.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0;
        let mut halted = false;

        loop {
            while !halted && in_flight.len() < limit {
                let Some((index, spec)) = queue.next() else {
                    break;
                };
                in_flight.push(async move {
                    let outcome = self.get_with(&spec.url, &spec.params, &spec.options).await;
                    (index, outcome)
                });
            }

            let Some((index, outcome)) = in_flight.next().await else {
                break;
            };

            completed += 1;
            if let Some(on_progress) = config.on_progress.as_mut() {
                on_progress(completed, total, index, outcome.as_ref().err());
            }

            if let Err(e) = &outcome {
                tracing::warn!(index = index, error = %e, "Batch request failed");
                if config.stop_on_error && limit < total {
                    halted = true;
                }
            }

            slots[index] = Some(outcome);
        }

        if halted {
            tracing::warn!(
                completed = completed,
                total = total,
                "Batch stopped admitting requests after a failure"
            );
        }

        if !config.return_errors {
            if let Some(position) = slots.iter().position(|slot| matches!(slot, Some(Err(_)))) {
                if let Some(Err(e)) = slots.swap_remove(position) {
                    return Err(e);
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(Error::Skipped)))
            .collect())
    }
}
