//! Client configuration and the runtime merge operation.

use crate::hooks::{Confirmer, LoadingIndicator, Notifier, TracingNotifier};
use crate::Error;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Callback invoked with every failure before it is returned to the caller.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Whether cookies are stored and sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsPolicy {
    /// Never store or send cookies.
    Omit,
    /// Send cookies back to the domain that set them.
    #[default]
    SameOrigin,
    /// Same as `SameOrigin` for a native client, which has no document origin.
    Include,
}

impl CredentialsPolicy {
    pub(crate) fn cookie_store(self) -> bool {
        !matches!(self, CredentialsPolicy::Omit)
    }
}

/// Process-wide defaults applied to every request of a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix prepended verbatim to every request URL.
    pub base_url: String,
    /// How long to wait for a response.
    pub timeout: Duration,
    /// Default headers. Keys are case-sensitive; per-call headers win.
    pub headers: BTreeMap<String, String>,
    /// Cookie handling.
    pub credentials: CredentialsPolicy,
    /// Whether the loading indicator is toggled around requests.
    pub show_loader: bool,
    /// Loader target passed to the [`LoadingIndicator`].
    pub loader_element: Option<String>,
    /// Invoked with every failure before it propagates.
    pub on_error: Option<ErrorCallback>,
    /// Loading indicator, if any.
    pub loader: Option<Arc<dyn LoadingIndicator>>,
    /// Confirmation prompt used by the command helpers.
    pub confirmer: Option<Arc<dyn Confirmer>>,
    /// Sink for command notifications.
    pub notifier: Arc<dyn Notifier>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-Requested-With".to_string(), "XMLHttpRequest".to_string());

        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            headers,
            credentials: CredentialsPolicy::default(),
            show_loader: true,
            loader_element: None,
            on_error: None,
            loader: None,
            confirmer: None,
            notifier: Arc::new(TracingNotifier),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("show_loader", &self.show_loader)
            .field("loader_element", &self.loader_element)
            .field("on_error", &self.on_error.is_some())
            .field("loader", &self.loader.is_some())
            .field("confirmer", &self.confirmer.is_some())
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Merges `update` into this configuration.
    ///
    /// Only the fields set on the update are touched. Headers are merged
    /// key by key, the update winning on collisions.
    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(timeout) = update.timeout {
            self.timeout = timeout;
        }
        self.headers.extend(update.headers);
        if let Some(credentials) = update.credentials {
            self.credentials = credentials;
        }
        if let Some(show_loader) = update.show_loader {
            self.show_loader = show_loader;
        }
        if let Some(loader_element) = update.loader_element {
            self.loader_element = Some(loader_element);
        }
        if let Some(on_error) = update.on_error {
            self.on_error = Some(on_error);
        }
        if let Some(loader) = update.loader {
            self.loader = Some(loader);
        }
        if let Some(confirmer) = update.confirmer {
            self.confirmer = Some(confirmer);
        }
        if let Some(notifier) = update.notifier {
            self.notifier = notifier;
        }
    }

    /// The loader to toggle for a request, honoring `show_loader`.
    pub(crate) fn active_loader(&self) -> Option<Arc<dyn LoadingIndicator>> {
        if self.show_loader {
            self.loader.clone()
        } else {
            None
        }
    }
}

/// A partial configuration merged with [`Client::setup`](crate::Client::setup).
///
/// # Examples
///
/// ```no_run
/// use biblio_http::{Client, ConfigUpdate};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), biblio_http::Error> {
/// let client = Client::builder().build()?;
/// client.setup(
///     ConfigUpdate::new()
///         .base_url("https://library.example.com")
///         .timeout(Duration::from_secs(10))
///         .header("Authorization", "Bearer abc"),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConfigUpdate {
    pub(crate) base_url: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) credentials: Option<CredentialsPolicy>,
    pub(crate) show_loader: Option<bool>,
    pub(crate) loader_element: Option<String>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) loader: Option<Arc<dyn LoadingIndicator>>,
    pub(crate) confirmer: Option<Arc<dyn Confirmer>>,
    pub(crate) notifier: Option<Arc<dyn Notifier>>,
}

impl ConfigUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL prefix.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the default timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds or replaces a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the cookie policy.
    pub fn credentials(mut self, credentials: CredentialsPolicy) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enables or disables the loading indicator.
    pub fn show_loader(mut self, show: bool) -> Self {
        self.show_loader = Some(show);
        self
    }

    /// Sets the loader target.
    pub fn loader_element(mut self, selector: impl Into<String>) -> Self {
        self.loader_element = Some(selector.into());
        self
    }

    /// Sets the global error callback.
    pub fn on_error(mut self, callback: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Sets the loading indicator.
    pub fn loader(mut self, loader: Arc<dyn LoadingIndicator>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Sets the confirmation prompt.
    pub fn confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Sets the notification sink.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}
