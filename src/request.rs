//! Request descriptors, bodies, per-call options and query-string building.

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Query parameters or keyed request data.
///
/// A JSON object keeps the call sites short (`json!({"page": 1})`) and gives
/// the cache a stable serialized form.
pub type Params = serde_json::Map<String, Value>;

/// The body of a request.
///
/// The encodings are mutually exclusive; the transport core picks the wire
/// format from the variant and the effective `Content-Type` header.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON value, serialized when the content type is `application/json`.
    Json(Value),
    /// A pre-encoded text body sent as-is.
    Text(String),
    /// Raw bytes sent as-is.
    Bytes(Bytes),
    /// Multipart form data. The JSON content type is dropped so the
    /// transport can set the boundary.
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    /// Returns `true` if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Params> for RequestBody {
    fn from(params: Params) -> Self {
        RequestBody::Json(Value::Object(params))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<reqwest::multipart::Form> for RequestBody {
    fn from(form: reqwest::multipart::Form) -> Self {
        RequestBody::Multipart(form)
    }
}

/// Per-call options layered over the client configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers overriding the client defaults.
    pub headers: BTreeMap<String, String>,
    /// Timeout overriding the client default.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header for this call only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Overrides the timeout for this call only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully resolved request, built fresh for every call.
///
/// Request interceptors receive this value mutably before it is sent.
#[derive(Debug)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: Method,
    /// The complete URL: base prefix, path and query string.
    pub url: String,
    /// Client defaults merged with per-call headers.
    pub headers: BTreeMap<String, String>,
    /// The request body.
    pub body: RequestBody,
    /// How long to wait for the response.
    pub timeout: Duration,
}

impl RequestDescriptor {
    /// Returns the value of `Content-Type`, matching the name case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    /// Removes every `Content-Type` header regardless of case.
    pub(crate) fn remove_content_type(&mut self) {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
    }
}

/// Appends `params` to `url` as a query string.
///
/// `null` and empty-string values are skipped. If `url` already contains a
/// `?` the pairs are joined with `&`.
///
/// # Examples
///
/// ```
/// use biblio_http::request::append_query;
/// use serde_json::json;
///
/// let params = json!({"a": 1, "b": "x", "c": ""});
/// let url = append_query("/api/books", params.as_object().unwrap());
/// assert_eq!(url, "/api/books?a=1&b=x");
///
/// let url = append_query("/api/books?sort=title", params.as_object().unwrap());
/// assert_eq!(url, "/api/books?sort=title&a=1&b=x");
/// ```
pub fn append_query(url: &str, params: &Params) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut appended = false;

    for (key, value) in params {
        if let Some(value) = query_value(value) {
            serializer.append_pair(key, &value);
            appended = true;
        }
    }

    if !appended {
        return url.to_string();
    }

    let joiner = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, joiner, serializer.finish())
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| query_value(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
