//! Repeated GET requests on an interval.

use crate::request::{Params, RequestOptions};
use crate::response::Response;
use crate::Client;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Default delay between polling requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Request settings for [`Client::poll`].
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// Query parameters sent on every request.
    pub params: Params,
    /// Per-call request options.
    pub request: RequestOptions,
}

#[derive(Default)]
struct PollState {
    stopped: AtomicBool,
    wake: Notify,
}

/// Controls a running polling loop.
///
/// Dropping the handle does not stop the loop; call [`PollHandle::stop`].
pub struct PollHandle {
    state: Arc<PollState>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the loop.
    ///
    /// No new request is issued after this, and a response still in flight
    /// is discarded without invoking the callback.
    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
        self.state.wake.notify_one();
    }

    /// Returns `true` once the loop was stopped or ended on its own.
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst) || self.task.is_finished()
    }

    /// Waits for the loop to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Polling task failed");
        }
    }
}

impl Client {
    /// Polls `url`, calling `callback` with every successful response.
    ///
    /// The first request fires immediately; each following one fires
    /// `interval` after the previous one completed, so slow responses push
    /// later requests back. The loop ends when `callback` returns
    /// [`ControlFlow::Break`] or the handle is stopped. Failed requests are
    /// logged and retried on the same interval.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::{Client, PollOptions};
    /// use std::ops::ControlFlow;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    ///
    /// let handle = client.poll(
    ///     "/api/import/status",
    ///     |response| match response.json().and_then(|s| s["done"].as_bool()) {
    ///         Some(true) => ControlFlow::Break(()),
    ///         _ => ControlFlow::Continue(()),
    ///     },
    ///     Duration::from_secs(2),
    ///     PollOptions::default(),
    /// );
    /// handle.join().await;
    /// # Ok(())
    /// # }
    /// ```
    pub fn poll<F>(
        &self,
        url: impl Into<String>,
        mut callback: F,
        interval: Duration,
        options: PollOptions,
    ) -> PollHandle
    where
        F: FnMut(Response) -> ControlFlow<()> + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        let state = Arc::new(PollState::default());
        let loop_state = state.clone();

        let task = tokio::spawn(async move {
            while !loop_state.stopped.load(Ordering::SeqCst) {
                match client.get_with(&url, &options.params, &options.request).await {
                    Ok(response) => {
                        if loop_state.stopped.load(Ordering::SeqCst) {
                            break;
                        }
                        if callback(response).is_break() {
                            tracing::debug!(url = %url, "Polling ended by callback");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(url = %url, error = %e, "Polling request failed");
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = loop_state.wake.notified() => {}
                }
            }
            loop_state.stopped.store(true, Ordering::SeqCst);
        });

        PollHandle { state, task }
    }
}
