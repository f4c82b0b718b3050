//! Error types for HTTP calls and the command helpers built on top of them.
//!
//! Every failure the client can produce is a variant of [`Error`]. Transport
//! failures (no response at all), HTTP failures (non-2xx responses) and
//! client-side validation failures are kept apart so callers can classify them
//! with [`Error::is_network_error`], [`Error::is_auth_error`] and
//! [`Error::is_server_error`].

use http::{HeaderMap, StatusCode};

/// Message shown for transport-level failures.
pub const NETWORK_ERROR_MESSAGE: &str = "Connection error. Check your network.";

/// Message shown for 401/403 responses without a server message.
pub const AUTH_ERROR_MESSAGE: &str = "You do not have permission to access this resource.";

/// Message shown for 5xx responses without a server message.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// The main error type for HTTP calls.
///
/// # Examples
///
/// ```no_run
/// use biblio_http::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://library.example.com")?
///     .build()?;
///
/// match client.get("/api/books", &Default::default()).await {
///     Ok(response) => println!("Books: {:?}", response.data),
///     Err(Error::HttpError { status, message, .. }) => {
///         eprintln!("HTTP error {}: {}", status, message);
///     }
///     Err(e) if e.is_network_error() => eprintln!("Offline: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No response was obtained (DNS failure, connection refused, aborted connection).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The client-side timer fired before a response arrived.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-2xx status code.
    ///
    /// `message` is the server-supplied `message` field when the body was a
    /// JSON object carrying one, otherwise `HTTP Error <status>`.
    #[error("{message}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// Human-readable message
        message: String,
        /// The response body parsed as JSON, if it parsed
        payload: Option<serde_json::Value>,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// A body declared as JSON could not be decoded.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A client-side precondition failed before any network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration was provided (bad header name, bad header value, ...).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The target URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A debounced call was replaced by a newer one before it fired.
    #[error("Request superseded by a newer debounced call")]
    Debounced,

    /// A batch entry was never sent because the batch stopped on an earlier error.
    #[error("Request skipped after an earlier failure in the batch")]
    Skipped,

    /// A [`RetryStrategy`](crate::RetryStrategy) ran out of attempts.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },
}

impl Error {
    /// Builds an [`Error::HttpError`] from a non-2xx response body.
    ///
    /// The body is parsed as JSON when possible; a string `message` field in
    /// it replaces the generic `HTTP Error <status>` text.
    pub fn from_http_failure(status: StatusCode, headers: HeaderMap, raw_response: String) -> Self {
        let payload = serde_json::from_str::<serde_json::Value>(&raw_response).ok();
        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP Error {}", status.as_u16()));

        Error::HttpError {
            status,
            message,
            payload,
            raw_response,
            headers,
        }
    }

    /// Returns `true` if no response was obtained from the server.
    ///
    /// Transport failures and client-side timeouts both count.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Network(e) => !e.is_status(),
            Error::Timeout => true,
            Error::MaxRetriesExceeded { last_error, .. } => last_error.is_network_error(),
            _ => false,
        }
    }

    /// Returns `true` for 401 Unauthorized and 403 Forbidden.
    ///
    /// ```
    /// use biblio_http::Error;
    /// use http::{HeaderMap, StatusCode};
    ///
    /// let err = Error::from_http_failure(StatusCode::UNAUTHORIZED, HeaderMap::new(), String::new());
    /// assert!(err.is_auth_error());
    /// assert!(!err.is_server_error());
    /// ```
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    /// Returns `true` for any 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s.is_server_error())
    }

    /// Returns `true` if this error is potentially retryable.
    ///
    /// Network errors, timeouts, 429 and 5xx HTTP errors are considered
    /// retryable. Other 4xx errors, validation and deserialization failures
    /// are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::HttpError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Error::DeserializationFailed { .. }
            | Error::Validation(_)
            | Error::ConfigurationError(_)
            | Error::SerializationFailed(_)
            | Error::InvalidUrl(_)
            | Error::Debounced
            | Error::Skipped
            | Error::MaxRetriesExceeded { .. } => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the parsed server payload of an HTTP failure.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Error::HttpError { payload, .. } => payload.as_ref(),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.payload(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns a message suitable for showing to a user.
    ///
    /// Prefers the server-supplied `message` field, then a classified text
    /// for network, auth and server failures, then the error's own
    /// `Display` output.
    pub fn user_message(&self) -> String {
        if let Some(message) = self
            .payload()
            .and_then(|p| p.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
        {
            return message.to_owned();
        }

        if self.is_network_error() {
            NETWORK_ERROR_MESSAGE.to_owned()
        } else if self.is_auth_error() {
            AUTH_ERROR_MESSAGE.to_owned()
        } else if self.is_server_error() {
            SERVER_ERROR_MESSAGE.to_owned()
        } else {
            self.to_string()
        }
    }
}

/// A specialized `Result` type for HTTP calls.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
