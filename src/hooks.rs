//! Integration points for user-facing side effects.
//!
//! The client never renders anything itself. A loading indicator, a
//! confirmation prompt and a notification sink are plugged in through the
//! traits below.

use std::sync::Arc;

/// A process-wide "loading" flag toggled around every request.
///
/// `target` is the configured loader element, if any.
pub trait LoadingIndicator: Send + Sync {
    /// Called right before a request is issued.
    fn show(&self, target: Option<&str>);

    /// Called once the request has finished, successfully or not.
    fn hide(&self, target: Option<&str>);
}

/// Asks the user to confirm a destructive command.
///
/// # Examples
///
/// ```
/// use biblio_http::hooks::Confirmer;
///
/// struct AlwaysYes;
///
/// impl Confirmer for AlwaysYes {
///     fn confirm(&self, _message: &str) -> bool {
///         true
///     }
/// }
/// ```
pub trait Confirmer: Send + Sync {
    /// Returns `true` if the user accepted.
    fn confirm(&self, message: &str) -> bool;
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The command succeeded.
    Success,
    /// The command failed.
    Error,
    /// Anything else.
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Error => write!(f, "ERROR"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// Receives the notifications requested with `show_notification`.
pub trait Notifier: Send + Sync {
    /// Surfaces `message` to the user.
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Default notifier: writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Error => tracing::warn!(kind = %kind, "{}", message),
            _ => tracing::info!(kind = %kind, "{}", message),
        }
    }
}

/// Shows the loader on creation and hides it on drop.
///
/// Holding one of these for the duration of a request keeps show/hide
/// balanced on every exit path.
pub(crate) struct LoaderGuard {
    indicator: Option<Arc<dyn LoadingIndicator>>,
    target: Option<String>,
}

impl LoaderGuard {
    pub(crate) fn show(indicator: Option<Arc<dyn LoadingIndicator>>, target: Option<String>) -> Self {
        if let Some(indicator) = &indicator {
            indicator.show(target.as_deref());
        }
        Self { indicator, target }
    }
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        if let Some(indicator) = &self.indicator {
            indicator.hide(self.target.as_deref());
        }
    }
}
