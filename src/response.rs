//! Successful responses and their decoded payloads.
//!
//! The [`Response`] type carries the body decoded according to the response
//! `Content-Type`, together with the status, headers and latency of the
//! exchange.

use crate::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A response body, decoded according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/json`, parsed.
    Json(serde_json::Value),
    /// Any `text/*` type.
    Text(String),
    /// A blob or octet-stream body.
    Binary(Bytes),
    /// Any other (or missing) content type, left unprocessed.
    Raw {
        /// The declared content type, if there was one.
        content_type: Option<String>,
        /// The body bytes.
        body: Bytes,
    },
}

impl Payload {
    /// Chooses a decoding from `content_type` and decodes `body` with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] when the body is declared as
    /// JSON but does not parse.
    pub(crate) fn decode_body(
        content_type: Option<&str>,
        body: Bytes,
        status: StatusCode,
    ) -> Result<Self> {
        let Some(content_type) = content_type else {
            return Ok(Payload::Raw {
                content_type: None,
                body,
            });
        };

        if content_type.contains("application/json") {
            serde_json::from_slice(&body)
                .map(Payload::Json)
                .map_err(|e| Error::DeserializationFailed {
                    raw_response: String::from_utf8_lossy(&body).into_owned(),
                    serde_error: e.to_string(),
                    status,
                })
        } else if content_type.contains("text/") {
            Ok(Payload::Text(String::from_utf8_lossy(&body).into_owned()))
        } else if content_type.contains("blob") || content_type.contains("octet-stream") {
            Ok(Payload::Binary(body))
        } else {
            Ok(Payload::Raw {
                content_type: Some(content_type.to_string()),
                body,
            })
        }
    }

    /// Returns the JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the body bytes of binary and raw payloads.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Binary(body) | Payload::Raw { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Deserializes a JSON payload into `T`.
    ///
    /// Text payloads are parsed as JSON too, for servers that mislabel their
    /// responses.
    ///
    /// # Examples
    ///
    /// ```
    /// use biblio_http::Payload;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Book { title: String }
    ///
    /// let payload = Payload::Json(serde_json::json!({"title": "Iracema"}));
    /// let book: Book = payload.decode().unwrap();
    /// assert_eq!(book.title, "Iracema");
    /// ```
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let outcome = match self {
            Payload::Json(value) => serde_json::from_value(value.clone()),
            Payload::Text(text) => serde_json::from_str(text),
            Payload::Binary(body) | Payload::Raw { body, .. } => serde_json::from_slice(body),
        };

        outcome.map_err(|e| Error::DeserializationFailed {
            raw_response: self.to_lossy_string(),
            serde_error: e.to_string(),
            status: StatusCode::OK,
        })
    }

    fn to_lossy_string(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text.clone(),
            Payload::Binary(body) | Payload::Raw { body, .. } => {
                String::from_utf8_lossy(body).into_owned()
            }
        }
    }
}

/// A successful (2xx) HTTP response.
///
/// # Examples
///
/// ```no_run
/// use biblio_http::{Client, Params};
///
/// # async fn example() -> Result<(), biblio_http::Error> {
/// let client = Client::builder()
///     .base_url("https://library.example.com")?
///     .build()?;
///
/// let response = client.get("/api/books/7", &Params::new()).await?;
///
/// println!("Status: {}", response.status);
/// println!("Request took {:?}", response.latency);
/// if let Some(book) = response.data.as_json() {
///     println!("Title: {}", book["title"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The decoded body.
    pub data: Payload,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from issuing the request until the body was read.
    pub latency: Duration,
}

impl Response {
    /// Creates a new `Response`.
    pub fn new(data: Payload, status: StatusCode, headers: HeaderMap, latency: Duration) -> Self {
        Self {
            data,
            status,
            headers,
            latency,
        }
    }

    /// Returns a reference to a header value by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use biblio_http::{Payload, Response};
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("text/plain"));
    ///
    /// let response = Response::new(
    ///     Payload::Text("ok".into()),
    ///     StatusCode::OK,
    ///     headers,
    ///     Duration::from_millis(12),
    /// );
    ///
    /// assert_eq!(response.header("content-type"), Some("text/plain"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the JSON body, if any.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.data.as_json()
    }

    /// Deserializes the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.data.decode()
    }
}

impl AsRef<Payload> for Response {
    fn as_ref(&self) -> &Payload {
        &self.data
    }
}
