//! HTTP client: transport core, verb helpers and configuration.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients, and
//! [`Client::setup`] to merge new defaults into a running client.

use crate::{
    cache::ResponseCache,
    config::{ClientConfig, ConfigUpdate, CredentialsPolicy, ErrorCallback},
    hooks::{Confirmer, LoaderGuard, LoadingIndicator, Notifier},
    interceptor::{Interceptors, RequestInterceptor, ResponseInterceptor},
    request::{append_query, Params, RequestBody, RequestDescriptor, RequestOptions},
    response::{Payload, Response},
    Error, Result,
};
use bytes::Bytes;
use futures_util::StreamExt;
use http::{header::CONTENT_DISPOSITION, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default quiet period for [`Client::debounce_get`].
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// An HTTP client holding the process-wide request defaults.
///
/// The client is a cheap handle: clones share configuration, connection pool,
/// interceptors, response cache and debounce timer.
///
/// # Examples
///
/// ```no_run
/// use biblio_http::{Client, Params};
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), biblio_http::Error> {
/// let client = Client::builder()
///     .base_url("https://library.example.com")?
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// // GET with query string
/// let params = json!({"author": "Machado de Assis"});
/// let books = client.get("/api/books", params.as_object().unwrap()).await?;
/// println!("Books: {:?}", books.data);
///
/// // POST with a JSON body
/// let created = client
///     .post("/api/books", json!({"title": "Quincas Borba"}))
///     .await?;
/// println!("Created: {:?}", created.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: RwLock<reqwest::Client>,
    config: RwLock<ClientConfig>,
    interceptors: Interceptors,
    cache: ResponseCache,
    debounce_generation: AtomicU64,
}

/// A downloaded file.
#[derive(Debug, Clone)]
pub struct Download {
    /// The body bytes.
    pub bytes: Bytes,
    /// File name from `Content-Disposition`, if the server sent one.
    pub filename: Option<String>,
    /// The declared content type.
    pub content_type: Option<String>,
}

/// A file to send with [`Client::upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name reported to the server.
    pub file_name: String,
    /// File contents.
    pub bytes: Bytes,
    /// MIME type, if known.
    pub mime_type: Option<String>,
}

impl UploadFile {
    /// Creates an upload from a name and contents.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    /// Sets the MIME type.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::Client;
    ///
    /// # fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Merges `update` into the client configuration.
    ///
    /// Affects every clone of this client. Changing the credentials policy
    /// rebuilds the connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if a header is invalid or the
    /// connection pool cannot be rebuilt. The configuration is left untouched
    /// in that case.
    pub fn setup(&self, update: ConfigUpdate) -> Result<()> {
        for (name, value) in &update.headers {
            validate_header(name, value)?;
        }

        let rebuilt = match update.credentials {
            Some(credentials) if credentials != self.inner.config.read().credentials => {
                Some(build_http_client(credentials)?)
            }
            _ => None,
        };

        self.inner.config.write().merge(update);
        if let Some(http_client) = rebuilt {
            *self.inner.http_client.write() = http_client;
        }

        tracing::debug!(config = ?*self.inner.config.read(), "Client configuration updated");
        Ok(())
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.inner.config.read().clone()
    }

    pub(crate) fn confirmer(&self) -> Option<Arc<dyn Confirmer>> {
        self.inner.config.read().confirmer.clone()
    }

    pub(crate) fn notifier(&self) -> Arc<dyn Notifier> {
        self.inner.config.read().notifier.clone()
    }

    /// Registers a request interceptor.
    pub fn add_request_interceptor(
        &self,
        interceptor: impl Fn(&mut RequestDescriptor) + Send + Sync + 'static,
    ) {
        let interceptor: RequestInterceptor = Arc::new(interceptor);
        self.inner.interceptors.add_request(interceptor);
    }

    /// Registers a response interceptor.
    pub fn add_response_interceptor(&self, interceptor: impl Fn(&mut Response) + Send + Sync + 'static) {
        let interceptor: ResponseInterceptor = Arc::new(interceptor);
        self.inner.interceptors.add_response(interceptor);
    }

    /// Number of registered (request, response) interceptors.
    pub fn interceptor_count(&self) -> (usize, usize) {
        self.inner.interceptors.len()
    }

    /// Resolves a call into a [`RequestDescriptor`].
    ///
    /// The URL is the configured base prefix followed by `url`; headers are the
    /// client defaults overridden by `options.headers`.
    pub fn descriptor(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> RequestDescriptor {
        let config = self.inner.config.read();
        let mut headers = config.headers.clone();
        headers.extend(options.headers.clone());

        RequestDescriptor {
            method,
            url: format!("{}{}", config.base_url, url),
            headers,
            body,
            timeout: options.timeout.unwrap_or(config.timeout),
        }
    }

    /// Sends one request and decodes the response. Never retries.
    ///
    /// The loading indicator is shown for the duration of the call. On
    /// failure the global error callback sees the error before it is
    /// returned.
    pub async fn send(&self, mut descriptor: RequestDescriptor) -> Result<Response> {
        let (loader, target, on_error) = self.request_hooks();

        self.inner.interceptors.apply_request(&mut descriptor);

        let loader_guard = LoaderGuard::show(loader, target);
        let result = self.exchange(descriptor).await.and_then(|(status, headers, body, latency)| {
            let content_type = headers
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let data = Payload::decode_body(content_type.as_deref(), body, status)?;
            Ok(Response::new(data, status, headers, latency))
        });
        drop(loader_guard);

        match result {
            Ok(mut response) => {
                self.inner.interceptors.apply_response(&mut response);
                Ok(response)
            }
            Err(e) => {
                if let Some(on_error) = on_error {
                    on_error(&e);
                }
                Err(e)
            }
        }
    }

    fn request_hooks(&self) -> (Option<Arc<dyn LoadingIndicator>>, Option<String>, Option<ErrorCallback>) {
        let config = self.inner.config.read();
        (
            config.active_loader(),
            config.loader_element.clone(),
            config.on_error.clone(),
        )
    }

    /// Performs the network exchange and rejects non-2xx statuses.
    async fn exchange(
        &self,
        mut descriptor: RequestDescriptor,
    ) -> Result<(StatusCode, HeaderMap, Bytes, Duration)> {
        let url = Url::parse(&descriptor.url)?;
        let sends_json = descriptor
            .content_type()
            .is_some_and(|ct| ct.contains("application/json"));
        if matches!(descriptor.body, RequestBody::Multipart(_)) {
            descriptor.remove_content_type();
        }
        let headers = header_map(&descriptor.headers)?;

        tracing::debug!(
            method = %descriptor.method,
            url = %url,
            timeout_ms = descriptor.timeout.as_millis(),
            "Executing HTTP request"
        );

        let http_client = self.inner.http_client.read().clone();
        let mut request = http_client
            .request(descriptor.method.clone(), url)
            .headers(headers);

        request = match descriptor.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => {
                let text = match value {
                    serde_json::Value::String(text) if !sends_json => text,
                    value => serde_json::to_string(&value)
                        .map_err(|e| Error::SerializationFailed(e.to_string()))?,
                };
                request.body(text)
            }
            RequestBody::Text(text) => request.body(text),
            RequestBody::Bytes(bytes) => request.body(bytes),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let start_time = Instant::now();
        let attempt = async {
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(transport_error)?;
            Ok::<_, Error>((status, headers, body))
        };

        // Dropping the attempt on timeout closes the connection on our side only.
        let (status, headers, body) = match tokio::time::timeout(descriptor.timeout, attempt).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                tracing::warn!(
                    method = %descriptor.method,
                    timeout_ms = descriptor.timeout.as_millis(),
                    "Request timed out"
                );
                return Err(Error::Timeout);
            }
        };
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = String::from_utf8_lossy(&body).into_owned();

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error (5xx)"
                );
            }

            return Err(Error::from_http_failure(status, headers, raw_response));
        }

        Ok((status, headers, body, latency))
    }

    /// Sends a request with the given method, body and options.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> Result<Response> {
        let descriptor = self.descriptor(method, url, body, options);
        self.send(descriptor).await
    }

    /// Makes a GET request, appending `params` as a query string.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use biblio_http::Client;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), biblio_http::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://library.example.com")?
    ///     .build()?;
    ///
    /// let params = json!({"page": 1, "genre": "romance"});
    /// let response = client.get("/api/books", params.as_object().unwrap()).await?;
    /// println!("Books: {:?}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get(&self, url: &str, params: &Params) -> Result<Response> {
        self.get_with(url, params, &RequestOptions::default()).await
    }

    /// Makes a GET request with per-call options.
    pub async fn get_with(&self, url: &str, params: &Params, options: &RequestOptions) -> Result<Response> {
        let url = append_query(url, params);
        self.request(Method::GET, &url, RequestBody::Empty, options)
            .await
    }

    /// Makes a POST request with the given body.
    pub async fn post(&self, url: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.post_with(url, body, &RequestOptions::default()).await
    }

    /// Makes a POST request with per-call options.
    pub async fn post_with(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(Method::POST, url, body.into(), options).await
    }

    /// Makes a PUT request with the given body.
    pub async fn put(&self, url: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.put_with(url, body, &RequestOptions::default()).await
    }

    /// Makes a PUT request with per-call options.
    pub async fn put_with(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(Method::PUT, url, body.into(), options).await
    }

    /// Makes a PATCH request with the given body.
    pub async fn patch(&self, url: &str, body: impl Into<RequestBody>) -> Result<Response> {
        self.patch_with(url, body, &RequestOptions::default()).await
    }

    /// Makes a PATCH request with per-call options.
    pub async fn patch_with(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(Method::PATCH, url, body.into(), options).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.delete_with(url, &RequestOptions::default()).await
    }

    /// Makes a DELETE request with per-call options.
    pub async fn delete_with(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, url, RequestBody::Empty, options)
            .await
    }

    /// GET that only fires after `delay` without another debounced call.
    ///
    /// One timer is shared by the whole client, across all URLs: a newer
    /// call makes every pending one resolve with [`Error::Debounced`].
    pub async fn debounce_get(&self, url: &str, params: &Params, delay: Duration) -> Result<Response> {
        let generation = self.inner.debounce_generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(delay).await;

        if self.inner.debounce_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(url = %url, "Debounced call superseded");
            return Err(Error::Debounced);
        }

        self.get(url, params).await
    }

    /// GET served from the response cache while the entry is younger than `ttl`.
    ///
    /// Only successful responses are stored.
    pub async fn get_cached(&self, url: &str, params: &Params, ttl: Duration) -> Result<Response> {
        let key = ResponseCache::key(url, params);

        if let Some(response) = self.inner.cache.get(&key) {
            tracing::debug!(key = %key, "Serving response from cache");
            return Ok(response);
        }

        let response = self.get(url, params).await?;
        self.inner.cache.insert(key, response.clone(), ttl);
        Ok(response)
    }

    /// Clears cached responses whose key starts with `url`, or all of them.
    pub fn clear_cache(&self, url: Option<&str>) {
        match url {
            Some(prefix) => self.inner.cache.clear_prefix(prefix),
            None => self.inner.cache.clear(),
        }
    }

    /// The response cache backing [`Client::get_cached`].
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// POSTs files and extra fields as multipart form data.
    ///
    /// A single file is sent in the part `file`; several files are sent as
    /// `file0`, `file1`, ...
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for an invalid MIME type, and any
    /// transport or HTTP failure of the POST.
    pub async fn upload(&self, url: &str, files: Vec<UploadFile>, fields: &Params) -> Result<Response> {
        self.upload_inner(url, files, fields, None).await
    }

    /// Like [`Client::upload`], reporting `(sent, total)` file bytes as the
    /// body is written to the connection.
    ///
    /// ```no_run
    /// use biblio_http::{Client, Params, UploadFile};
    ///
    /// # async fn example(client: Client) -> Result<(), biblio_http::Error> {
    /// let cover = UploadFile::new("cover.png", vec![0u8; 512 * 1024]).mime_type("image/png");
    /// client
    ///     .upload_with_progress("/api/covers", vec![cover], &Params::new(), |sent, total| {
    ///         println!("{}%", sent * 100 / total.max(1));
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_with_progress<F>(
        &self,
        url: &str,
        files: Vec<UploadFile>,
        fields: &Params,
        on_progress: F,
    ) -> Result<Response>
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        self.upload_inner(url, files, fields, Some(Arc::new(on_progress))).await
    }

    async fn upload_inner(
        &self,
        url: &str,
        files: Vec<UploadFile>,
        fields: &Params,
        on_progress: Option<UploadProgressFn>,
    ) -> Result<Response> {
        let single = files.len() == 1;
        let total: u64 = files.iter().map(|file| file.bytes.len() as u64).sum();
        let sent = Arc::new(AtomicU64::new(0));
        let mut form = reqwest::multipart::Form::new();

        for (index, file) in files.into_iter().enumerate() {
            let name = if single {
                "file".to_string()
            } else {
                format!("file{index}")
            };
            let mut part = match &on_progress {
                Some(callback) => {
                    let length = file.bytes.len() as u64;
                    let body = progress_body(file.bytes, sent.clone(), total, callback.clone());
                    reqwest::multipart::Part::stream_with_length(body, length)
                }
                None => reqwest::multipart::Part::bytes(file.bytes.to_vec()),
            }
            .file_name(file.file_name);
            if let Some(mime) = &file.mime_type {
                part = part
                    .mime_str(mime)
                    .map_err(|e| Error::ConfigurationError(format!("Invalid MIME type '{}': {}", mime, e)))?;
            }
            form = form.part(name, part);
        }

        for (key, value) in fields {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }

        self.post(url, RequestBody::Multipart(form)).await
    }

    /// Downloads a resource as raw bytes.
    ///
    /// The body is never decoded. The loading indicator, interceptors and the
    /// global error callback are bypassed.
    pub async fn download(&self, url: &str, params: &Params) -> Result<Download> {
        let url = append_query(url, params);
        let descriptor = self.descriptor(Method::GET, &url, RequestBody::Empty, &RequestOptions::default());

        let (_, headers, bytes, _) = self.exchange(descriptor).await.inspect_err(|e| {
            tracing::error!(error = %e, url = %url, "Download failed");
        })?;

        let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

        Ok(Download {
            filename: header(CONTENT_DISPOSITION).and_then(disposition_filename),
            content_type: header(http::header::CONTENT_TYPE).map(str::to_owned),
            bytes,
        })
    }
}

type UploadProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

const UPLOAD_CHUNK: usize = 64 * 1024;

/// Streams `bytes` in chunks, adding each chunk to `sent` as reqwest pulls it.
fn progress_body(bytes: Bytes, sent: Arc<AtomicU64>, total: u64, on_progress: UploadProgressFn) -> reqwest::Body {
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK).min(bytes.len())))
        .collect();

    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        on_progress(done, total);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}

fn validate_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let (name, value) = validate_header(name, value)?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Extracts the file name from a `Content-Disposition` header value.
fn disposition_filename(value: &str) -> Option<String> {
    let start = value.find("filename=")? + "filename=".len();
    let raw = value[start..].split(';').next()?.trim();
    let name = raw.trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn build_http_client(credentials: CredentialsPolicy) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(credentials.cookie_store())
        .build()
        .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use biblio_http::{ClientBuilder, CredentialsPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), biblio_http::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://library.example.com")?
///     .timeout(Duration::from_secs(30))
///     .credentials(CredentialsPolicy::Include)
///     .default_header("User-Agent", "biblioteca/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Sets the URL prefix for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        Url::parse(url.as_ref())?;
        self.config.base_url = url.as_ref().to_string();
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        validate_header(name.as_ref(), value.as_ref())?;
        self.config
            .headers
            .insert(name.as_ref().to_string(), value.as_ref().to_string());
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the cookie policy.
    pub fn credentials(mut self, credentials: CredentialsPolicy) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Enables or disables the loading indicator.
    pub fn show_loader(mut self, show: bool) -> Self {
        self.config.show_loader = show;
        self
    }

    /// Sets the loader target passed to the loading indicator.
    pub fn loader_element(mut self, selector: impl Into<String>) -> Self {
        self.config.loader_element = Some(selector.into());
        self
    }

    /// Sets the loading indicator.
    pub fn loader(mut self, loader: Arc<dyn LoadingIndicator>) -> Self {
        self.config.loader = Some(loader);
        self
    }

    /// Sets the global error callback.
    pub fn on_error(mut self, callback: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.config.on_error = Some(Arc::new(callback));
        self
    }

    /// Sets the confirmation prompt used by the command helpers.
    pub fn confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.config.confirmer = Some(confirmer);
        self
    }

    /// Sets the notification sink used by the command helpers.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.config.notifier = notifier;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let http_client = build_http_client(self.config.credentials)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client: RwLock::new(http_client),
                config: RwLock::new(self.config),
                interceptors: Interceptors::default(),
                cache: ResponseCache::new(),
                debounce_generation: AtomicU64::new(0),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
