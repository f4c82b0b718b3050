//! Batches of independent commands.
//!
//! [`Client::execute_non_query_batch`] runs several commands one after the
//! other or all at once and adds up the affected rows. This is not a
//! transaction: nothing is rolled back when a later command fails.

use crate::command::{CommandOptions, CommandResult};
use crate::{Client, Error, Result};
use futures_util::stream::{FuturesUnordered, StreamExt};
use http::StatusCode;
use serde_json::Value;

const EXECUTION_STOPPED: &str = "Execution stopped by error";

/// One command of a batch.
#[derive(Debug, Clone)]
pub struct NonQueryCommand {
    /// Endpoint URL.
    pub url: String,
    /// JSON body.
    pub data: Value,
    /// Options; `throw_error` and `show_notification` are overridden inside a batch.
    pub options: CommandOptions,
}

impl NonQueryCommand {
    /// Creates a command with default options.
    pub fn new(url: impl Into<String>, data: Value) -> Self {
        Self {
            url: url.into(),
            data,
            options: CommandOptions::default(),
        }
    }

    /// Sets the command options.
    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

/// Progress callback: `(completed, total, index, result, error)`.
pub type CommandProgressFn =
    Box<dyn FnMut(usize, usize, usize, Option<&CommandResult>, Option<&Error>) + Send>;

/// Settings for [`Client::execute_non_query_batch`].
pub struct NonQueryBatchConfig {
    /// Run every command at once instead of one after the other.
    pub parallel: bool,
    /// Stop after the first failure (sequential mode). Defaults to `true`.
    pub stop_on_error: bool,
    /// Log an advisory when a failure follows successful commands.
    pub transaction: bool,
    /// Called after each command settles.
    pub on_progress: Option<CommandProgressFn>,
}

impl Default for NonQueryBatchConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            stop_on_error: true,
            transaction: false,
            on_progress: None,
        }
    }
}

impl NonQueryBatchConfig {
    /// Sequential, stopping on the first error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the commands concurrently.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets `stop_on_error`.
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Marks the batch as a logical transaction.
    pub fn transaction(mut self, transaction: bool) -> Self {
        self.transaction = transaction;
        self
    }

    /// Sets the progress callback.
    pub fn on_progress(
        mut self,
        callback: impl FnMut(usize, usize, usize, Option<&CommandResult>, Option<&Error>) + Send + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// A command of the batch that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCommand {
    /// Position in the input.
    pub index: usize,
    /// Endpoint URL.
    pub url: String,
    /// User-facing failure message.
    pub message: String,
    /// HTTP status, if the server answered.
    pub status: Option<StatusCode>,
}

/// Aggregate outcome of [`Client::execute_non_query_batch`].
#[derive(Debug)]
pub struct NonQueryBatchResult {
    /// `true` if no command failed.
    pub success: bool,
    /// Outcomes of the executed commands, in input order.
    pub results: Vec<Result<CommandResult>>,
    /// Sum of `affected_rows` over successful commands.
    pub total_affected: u64,
    /// Number of commands that settled.
    pub executed: usize,
    /// Number of commands submitted.
    pub total: usize,
    /// Failed commands, `None` if there were none.
    pub errors: Option<Vec<FailedCommand>>,
    /// Set when execution stopped early.
    pub message: Option<String>,
}

struct Tally {
    total: usize,
    completed: usize,
    total_affected: u64,
    results: Vec<(usize, Result<CommandResult>)>,
    errors: Vec<FailedCommand>,
    on_progress: Option<CommandProgressFn>,
}

impl Tally {
    /// Records one settled command. Returns `true` if it failed.
    fn record(&mut self, index: usize, command: &NonQueryCommand, outcome: Result<CommandResult>) -> bool {
        self.completed += 1;

        let failed = match &outcome {
            Ok(result) => {
                self.total_affected += result.affected_rows;
                if let Some(on_progress) = self.on_progress.as_mut() {
                    on_progress(self.completed, self.total, index, Some(result), None);
                }
                false
            }
            Err(e) => {
                tracing::warn!(index = index, url = %command.url, error = %e, "Batch command failed");
                self.errors.push(FailedCommand {
                    index,
                    url: command.url.clone(),
                    message: e.user_message(),
                    status: e.status(),
                });
                if let Some(on_progress) = self.on_progress.as_mut() {
                    on_progress(self.completed, self.total, index, None, Some(e));
                }
                true
            }
        };

        self.results.push((index, outcome));
        failed
    }
}

impl Client {
    /// Executes several commands and aggregates their outcomes.
    ///
    /// Sequential mode (the default) stops at the first failure when
    /// `stop_on_error` is set. Parallel mode issues every command at once and
    /// always waits for all of them; `stop_on_error` then only marks the
    /// result as stopped.
    ///
    /// Each command runs with `throw_error` forced on and notifications off.
    /// With `transaction` set, a failure after successful commands logs that
    /// no rollback happens.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::{Client, NonQueryBatchConfig, NonQueryCommand};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    ///
    /// let result = client
    ///     .execute_non_query_batch(
    ///         vec![
    ///             NonQueryCommand::new("/api/books/insert", json!({"title": "Helena"})),
    ///             NonQueryCommand::new("/api/books/insert", json!({"title": "Iaiá Garcia"})),
    ///         ],
    ///         NonQueryBatchConfig::new(),
    ///     )
    ///     .await;
    /// println!("{} of {} executed, {} rows", result.executed, result.total, result.total_affected);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_non_query_batch(
        &self,
        commands: Vec<NonQueryCommand>,
        config: NonQueryBatchConfig,
    ) -> NonQueryBatchResult {
        let total = commands.len();
        let mut tally = Tally {
            total,
            completed: 0,
            total_affected: 0,
            results: Vec::with_capacity(total),
            errors: Vec::new(),
            on_progress: config.on_progress,
        };
        let mut stopped = false;

        if config.parallel {
            let mut in_flight: FuturesUnordered<_> = commands
                .iter()
                .enumerate()
                .map(|(index, command)| async move { (index, self.run_command(command).await) })
                .collect();

            while let Some((index, outcome)) = in_flight.next().await {
                let failed = tally.record(index, &commands[index], outcome);
                stopped |= failed && config.stop_on_error;
            }
            tally.results.sort_by_key(|(index, _)| *index);
        } else {
            for (index, command) in commands.iter().enumerate() {
                let outcome = self.run_command(command).await;
                if tally.record(index, command, outcome) && config.stop_on_error {
                    stopped = true;
                    break;
                }
            }
        }

        let success = tally.errors.is_empty();
        if !success && config.transaction && tally.results.iter().any(|(_, r)| r.is_ok()) {
            tracing::warn!(
                failed = tally.errors.len(),
                executed = tally.completed,
                "Transaction failed after some commands succeeded; rollback is not implemented client-side"
            );
        }

        NonQueryBatchResult {
            success,
            results: tally.results.into_iter().map(|(_, outcome)| outcome).collect(),
            total_affected: tally.total_affected,
            executed: tally.completed,
            total,
            errors: if tally.errors.is_empty() {
                None
            } else {
                Some(tally.errors)
            },
            message: stopped.then(|| EXECUTION_STOPPED.to_string()),
        }
    }

    async fn run_command(&self, command: &NonQueryCommand) -> Result<CommandResult> {
        let options = CommandOptions {
            throw_error: true,
            show_notification: false,
            ..command.options.clone()
        };
        self.execute_non_query(&command.url, command.data.clone(), &options)
            .await
    }
}
