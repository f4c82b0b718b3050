//! Commands (insert/update/delete) and prepared queries.
//!
//! Command endpoints answer with loosely shaped JSON envelopes. The known
//! field-name dialects are listed in the `*_FIELDS` constants and coalesced
//! into one [`CommandResult`]: the first field holding a truthy value wins,
//! and missing numeric fields default to zero.

use crate::hooks::NotificationKind;
use crate::request::{Params, RequestBody, RequestOptions};
use crate::response::Response;
use crate::{Client, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Field names carrying the affected-row count.
pub const AFFECTED_ROWS_FIELDS: &[&str] = &["affectedRows", "rowsAffected", "affected"];

/// Field names carrying the generated identifier.
pub const INSERT_ID_FIELDS: &[&str] = &["insertId", "id", "lastInsertId"];

/// Field names carrying returned rows.
pub const DATA_FIELDS: &[&str] = &["data", "rows", "results"];

/// Field names carrying the returned row count.
pub const ROW_COUNT_FIELDS: &[&str] = &["rowCount", "count"];

const COMMAND_OK: &str = "Operation executed successfully";
const QUERY_OK: &str = "Query executed successfully";
const TRANSACTION_OK: &str = "Transaction executed successfully";
const OPERATION_CANCELLED: &str = "Operation cancelled by user";
const TRANSACTION_CANCELLED: &str = "Transaction cancelled by user";

/// An identifier generated by the server for an inserted row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertId {
    /// Integer key.
    Number(i64),
    /// Anything else (GUIDs, big numbers, composite keys), as text.
    Text(String),
}

impl From<i64> for InsertId {
    fn from(id: i64) -> Self {
        InsertId::Number(id)
    }
}

/// The normalized outcome of a command or prepared query.
#[derive(Debug)]
pub struct CommandResult {
    /// `false` if the server said so, the call failed, or the user declined.
    pub success: bool,
    /// The user declined the confirmation prompt; nothing was sent.
    pub cancelled: bool,
    /// Rows affected, `0` when not reported.
    pub affected_rows: u64,
    /// Generated identifier, if reported.
    pub insert_id: Option<InsertId>,
    /// Rows returned, falling back to the length of `data`.
    pub row_count: u64,
    /// Server message or a default text.
    pub message: String,
    /// Returned rows or payload.
    pub data: Option<Value>,
    /// The failure, when `throw_error` was disabled.
    pub error: Option<Error>,
    /// The failing query text, with `debug_mode`.
    pub query: Option<String>,
}

impl CommandResult {
    /// Normalizes a server envelope.
    ///
    /// # Examples
    ///
    /// ```
    /// use biblio_http::command::{CommandResult, InsertId};
    /// use serde_json::json;
    ///
    /// let a = CommandResult::from_envelope(&json!({"rowsAffected": 2, "id": 55}));
    /// let b = CommandResult::from_envelope(&json!({"affected": 2, "insertId": 55}));
    ///
    /// for result in [a, b] {
    ///     assert!(result.success);
    ///     assert_eq!(result.affected_rows, 2);
    ///     assert_eq!(result.insert_id, Some(InsertId::Number(55)));
    /// }
    /// ```
    pub fn from_envelope(envelope: &Value) -> Self {
        Self::normalize(envelope, COMMAND_OK)
    }

    fn normalize(envelope: &Value, default_message: &str) -> Self {
        let empty = Map::new();
        let fields = envelope.as_object().unwrap_or(&empty);

        let data = first_truthy(fields, DATA_FIELDS).cloned();
        let row_count = first_truthy(fields, ROW_COUNT_FIELDS)
            .and_then(as_count)
            .or_else(|| data.as_ref().and_then(Value::as_array).map(|rows| rows.len() as u64))
            .unwrap_or(0);

        Self {
            success: fields.get("success") != Some(&Value::Bool(false)),
            cancelled: false,
            affected_rows: first_truthy(fields, AFFECTED_ROWS_FIELDS)
                .and_then(as_count)
                .unwrap_or(0),
            insert_id: first_truthy(fields, INSERT_ID_FIELDS).map(as_insert_id),
            row_count,
            message: message_or(fields, default_message),
            data,
            error: None,
            query: None,
        }
    }

    fn from_response(response: &Response, default_message: &str) -> Self {
        Self::normalize(response.json().unwrap_or(&Value::Null), default_message)
    }

    fn cancelled() -> Self {
        Self {
            success: false,
            cancelled: true,
            affected_rows: 0,
            insert_id: None,
            row_count: 0,
            message: OPERATION_CANCELLED.to_string(),
            data: None,
            error: None,
            query: None,
        }
    }

    fn failure(message: String, error: Error) -> Self {
        Self {
            success: false,
            cancelled: false,
            affected_rows: 0,
            insert_id: None,
            row_count: 0,
            message,
            data: None,
            error: Some(error),
            query: None,
        }
    }
}

/// JavaScript-style truthiness, which is what the server dialects rely on.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| truthy(value))
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_insert_id(value: &Value) -> InsertId {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(InsertId::Number)
            .unwrap_or_else(|| InsertId::Text(n.to_string())),
        Value::String(s) => InsertId::Text(s.clone()),
        other => InsertId::Text(other.to_string()),
    }
}

fn message_or(fields: &Map<String, Value>, default_message: &str) -> String {
    fields
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(default_message)
        .to_string()
}

/// Options shared by the command helpers.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Ask the configured [`Confirmer`](crate::hooks::Confirmer) first.
    pub confirm_message: Option<String>,
    /// Report the outcome through the configured [`Notifier`](crate::hooks::Notifier).
    pub show_notification: bool,
    /// Return failures as `Err` (default) instead of a failed result.
    pub throw_error: bool,
    /// Include the query text in failed prepared-query results.
    pub debug_mode: bool,
    /// Per-call request options.
    pub request: RequestOptions,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            confirm_message: None,
            show_notification: false,
            throw_error: true,
            debug_mode: false,
            request: RequestOptions::default(),
        }
    }
}

impl CommandOptions {
    /// Default options: no prompt, no notification, failures returned as `Err`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires confirmation with `message`.
    pub fn confirm(mut self, message: impl Into<String>) -> Self {
        self.confirm_message = Some(message.into());
        self
    }

    /// Enables notifications.
    pub fn show_notification(mut self, show: bool) -> Self {
        self.show_notification = show;
        self
    }

    /// Chooses between `Err` and a failed result on failure.
    pub fn throw_error(mut self, throw: bool) -> Self {
        self.throw_error = throw;
        self
    }

    /// Enables `debug_mode`.
    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Sets per-call request options.
    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}

/// Placeholder style of a prepared query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `:name`
    Named,
    /// `?`
    Positional,
}

impl PlaceholderStyle {
    /// Classifies `query` by substring presence only: any `:` means named.
    pub fn detect(query: &str) -> Self {
        if query.contains(':') {
            PlaceholderStyle::Named
        } else {
            PlaceholderStyle::Positional
        }
    }
}

/// Parameters of a prepared query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreparedParams {
    /// Values for `?` placeholders, in order.
    Positional(Vec<Value>),
    /// Values for `:name` placeholders.
    Named(Params),
}

impl Default for PreparedParams {
    fn default() -> Self {
        PreparedParams::Positional(Vec::new())
    }
}

impl From<Vec<Value>> for PreparedParams {
    fn from(values: Vec<Value>) -> Self {
        PreparedParams::Positional(values)
    }
}

impl From<Params> for PreparedParams {
    fn from(params: Params) -> Self {
        PreparedParams::Named(params)
    }
}

/// Returns advisories for placeholder/parameter mismatches. Never blocks.
pub fn placeholder_advisories(query: &str, params: &PreparedParams) -> Vec<&'static str> {
    let mut advisories = Vec::new();
    if query.contains(':') && matches!(params, PreparedParams::Positional(_)) {
        advisories.push("Query uses named placeholders but parameters are positional; consider a keyed map.");
    }
    if query.contains('?') && matches!(params, PreparedParams::Named(_)) {
        advisories.push("Query uses positional placeholders but parameters are keyed; consider a list.");
    }
    advisories
}

/// One statement of a prepared-query transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    /// SQL text with placeholders.
    pub query: String,
    /// Parameter values.
    pub params: PreparedParams,
}

impl PreparedStatement {
    /// Creates a statement.
    pub fn new(query: impl Into<String>, params: impl Into<PreparedParams>) -> Self {
        Self {
            query: query.into(),
            params: params.into(),
        }
    }
}

/// Outcome of [`Client::prepared_query_transaction`].
#[derive(Debug)]
pub struct TransactionResult {
    /// `false` if the server said so, the call failed, or the user declined.
    pub success: bool,
    /// The user declined the confirmation prompt; nothing was sent.
    pub cancelled: bool,
    /// Per-statement results as reported by the server.
    pub results: Vec<Value>,
    /// Total rows affected, as reported by the server.
    pub total_affected: u64,
    /// Server message or a default text.
    pub message: String,
    /// The failure, when `throw_error` was disabled.
    pub error: Option<Error>,
}

impl TransactionResult {
    fn empty(success: bool, cancelled: bool, message: String, error: Option<Error>) -> Self {
        Self {
            success,
            cancelled,
            results: Vec::new(),
            total_affected: 0,
            message,
            error,
        }
    }
}

impl Client {
    /// Executes a command that reports affected rows instead of data.
    ///
    /// POSTs `data` to `url` and normalizes the reply into a
    /// [`CommandResult`]. If `confirm_message` is set and the user declines,
    /// nothing is sent and a cancelled result is returned.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure unless `throw_error` is disabled, in
    /// which case a failed `CommandResult` carrying the error is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::{Client, CommandOptions};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    ///
    /// let result = client
    ///     .execute_non_query("/api/books/delete", json!({"id": 123}), &CommandOptions::new())
    ///     .await?;
    /// println!("{} row(s) deleted", result.affected_rows);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_non_query(
        &self,
        url: &str,
        data: impl Into<RequestBody>,
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        if !self.confirmed(options.confirm_message.as_deref()) {
            return Ok(CommandResult::cancelled());
        }

        match self.post_with(url, data, &options.request).await {
            Ok(response) => {
                let result = CommandResult::from_response(&response, COMMAND_OK);
                self.notify_success(options, result.success, &result.message);
                Ok(result)
            }
            Err(e) => self.settle_failure(e, options, CommandResult::failure),
        }
    }

    /// Sends SQL text and parameters separately for server-side binding.
    ///
    /// The placeholder style is detected from the query text and sent along;
    /// a mismatch between style and parameter shape only logs an advisory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty query before anything is
    /// sent; otherwise behaves like [`Client::execute_non_query`].
    pub async fn prepared_query(
        &self,
        url: &str,
        query: &str,
        params: impl Into<PreparedParams>,
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        if query.trim().is_empty() {
            return Err(Error::Validation("SQL query text is required".to_string()));
        }

        if !self.confirmed(options.confirm_message.as_deref()) {
            return Ok(CommandResult::cancelled());
        }

        let params = params.into();
        for advisory in placeholder_advisories(query, &params) {
            tracing::warn!(query = %query, "{}", advisory);
        }

        let body = json!({
            "query": query,
            "params": params,
            "prepared": true,
            "placeholderType": PlaceholderStyle::detect(query),
        });

        match self.post_with(url, body, &options.request).await {
            Ok(response) => {
                let result = CommandResult::from_response(&response, QUERY_OK);
                self.notify_success(options, result.success, &result.message);
                Ok(result)
            }
            Err(e) => self.settle_failure(e, options, |message, error| {
                let mut result = CommandResult::failure(message, error);
                if options.debug_mode {
                    result.query = Some(query.to_string());
                }
                result
            }),
        }
    }

    /// Sends several prepared statements in one request marked `transaction`.
    ///
    /// Atomicity is entirely up to the server; the client only forwards the
    /// marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty statement list before
    /// anything is sent; otherwise behaves like
    /// [`Client::execute_non_query`].
    pub async fn prepared_query_transaction(
        &self,
        url: &str,
        statements: &[PreparedStatement],
        options: &CommandOptions,
    ) -> Result<TransactionResult> {
        if statements.is_empty() {
            return Err(Error::Validation("At least one query is required".to_string()));
        }

        if !self.confirmed(options.confirm_message.as_deref()) {
            return Ok(TransactionResult::empty(
                false,
                true,
                TRANSACTION_CANCELLED.to_string(),
                None,
            ));
        }

        let queries: Vec<Value> = statements
            .iter()
            .map(|statement| {
                json!({
                    "query": statement.query,
                    "params": statement.params,
                    "prepared": true,
                })
            })
            .collect();
        let body = json!({ "queries": queries, "transaction": true });

        match self.post_with(url, body, &options.request).await {
            Ok(response) => {
                let empty = Map::new();
                let fields = response.json().and_then(Value::as_object).unwrap_or(&empty);
                let result = TransactionResult {
                    success: fields.get("success") != Some(&Value::Bool(false)),
                    cancelled: false,
                    results: fields
                        .get("results")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default(),
                    total_affected: fields.get("totalAffected").and_then(as_count).unwrap_or(0),
                    message: message_or(fields, TRANSACTION_OK),
                    error: None,
                };
                self.notify_success(options, result.success, &result.message);
                Ok(result)
            }
            Err(e) => self.settle_failure(e, options, |message, error| {
                TransactionResult::empty(false, false, message, Some(error))
            }),
        }
    }

    /// Returns `false` if a confirmation was required and not given.
    fn confirmed(&self, message: Option<&str>) -> bool {
        let Some(message) = message else {
            return true;
        };

        match self.confirmer() {
            Some(confirmer) => confirmer.confirm(message),
            None => {
                tracing::warn!(
                    prompt = %message,
                    "Confirmation requested but no confirmer is configured; treating as declined"
                );
                false
            }
        }
    }

    fn notify_success(&self, options: &CommandOptions, success: bool, message: &str) {
        if options.show_notification && success {
            self.notifier().notify(message, NotificationKind::Success);
        }
    }

    fn settle_failure<T>(
        &self,
        error: Error,
        options: &CommandOptions,
        into_result: impl FnOnce(String, Error) -> T,
    ) -> Result<T> {
        let message = error.user_message();
        if options.show_notification {
            self.notifier().notify(&message, NotificationKind::Error);
        }

        if options.throw_error {
            Err(error)
        } else {
            Ok(into_result(message, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_truthy_field_wins() {
        let result = CommandResult::from_envelope(&json!({"affectedRows": 0, "rowsAffected": 4}));
        assert_eq!(result.affected_rows, 4);
    }

    #[test]
    fn test_missing_fields_default() {
        let result = CommandResult::from_envelope(&json!({}));
        assert!(result.success);
        assert_eq!(result.affected_rows, 0);
        assert_eq!(result.insert_id, None);
        assert_eq!(result.row_count, 0);
        assert_eq!(result.message, COMMAND_OK);
        assert!(result.data.is_none());
    }

    #[test]
    fn test_non_object_envelope() {
        let result = CommandResult::from_envelope(&json!("ok"));
        assert!(result.success);
        assert_eq!(result.affected_rows, 0);
    }

    #[test]
    fn test_explicit_failure_flag() {
        let result = CommandResult::from_envelope(&json!({"success": false, "message": "duplicate key"}));
        assert!(!result.success);
        assert_eq!(result.message, "duplicate key");
    }

    #[test]
    fn test_insert_id_dialects() {
        let result = CommandResult::from_envelope(&json!({"lastInsertId": "a1b2"}));
        assert_eq!(result.insert_id, Some(InsertId::Text("a1b2".into())));

        let result = CommandResult::from_envelope(&json!({"insertId": 0, "id": 7}));
        assert_eq!(result.insert_id, Some(InsertId::Number(7)));
    }

    #[test]
    fn test_row_count_falls_back_to_data_length() {
        let result = CommandResult::from_envelope(&json!({"rows": [{"id": 1}, {"id": 2}]}));
        assert_eq!(result.row_count, 2);
        assert_eq!(result.data, Some(json!([{"id": 1}, {"id": 2}])));

        let result = CommandResult::from_envelope(&json!({"data": [1, 2, 3], "count": 10}));
        assert_eq!(result.row_count, 10);
    }

    #[test]
    fn test_placeholder_detection() {
        assert_eq!(
            PlaceholderStyle::detect("UPDATE books SET title = :title WHERE id = :id"),
            PlaceholderStyle::Named
        );
        assert_eq!(
            PlaceholderStyle::detect("DELETE FROM books WHERE id = ?"),
            PlaceholderStyle::Positional
        );
        assert_eq!(serde_json::to_value(PlaceholderStyle::Named).unwrap(), json!("named"));
    }

    #[test]
    fn test_placeholder_advisories() {
        let positional = PreparedParams::from(vec![json!(1)]);
        let named = PreparedParams::from(json!({"id": 1}).as_object().cloned().unwrap());

        assert_eq!(placeholder_advisories("WHERE id = :id", &positional).len(), 1);
        assert_eq!(placeholder_advisories("WHERE id = ?", &named).len(), 1);
        assert!(placeholder_advisories("WHERE id = ?", &positional).is_empty());
        assert!(placeholder_advisories("WHERE id = :id", &named).is_empty());
    }

    #[test]
    fn test_prepared_params_serialize_untagged() {
        assert_eq!(
            serde_json::to_value(PreparedParams::from(vec![json!("x"), json!(2)])).unwrap(),
            json!(["x", 2])
        );
        assert_eq!(serde_json::to_value(PreparedParams::default()).unwrap(), json!([]));
    }
}
