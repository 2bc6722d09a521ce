//! Crash/log reporting collaborator.
//!
//! Stores report recovered faults and user activity here. Every call is
//! fire-and-forget: nothing a sink does can fail the calling operation.

use serde_json::Value;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use taskdeck_core::Session;
use tracing::{debug, error, info, warn};

/// Receiver of error reports, warnings, user context and breadcrumbs.
pub trait TelemetrySink: Send + Sync {
    /// Report a recovered error with structured context.
    fn log_error(&self, error: &(dyn StdError + 'static), context: &Value);

    /// Report a non-fatal condition.
    fn log_warning(&self, message: &str, context: &Value);

    /// Attach (or clear) the current user.
    fn set_user(&self, user: Option<&Session>);

    /// Record a breadcrumb for later debugging.
    fn add_breadcrumb(&self, message: &str, category: &str, data: &Value);
}

/// Sink that forwards everything to `tracing`.
///
/// While disabled, errors and warnings are still logged but user context and
/// breadcrumbs are dropped.
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    enabled: AtomicBool,
}

impl TracingTelemetry {
    /// Create a sink with forwarding switched on or off.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Toggle forwarding of user context and breadcrumbs.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether forwarding is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for TracingTelemetry {
    fn log_error(&self, error: &(dyn StdError + 'static), context: &Value) {
        error!(error = %error, %context, forwarded = self.is_enabled(), "Reported error");
    }

    fn log_warning(&self, message: &str, context: &Value) {
        warn!(%context, forwarded = self.is_enabled(), "{message}");
    }

    fn set_user(&self, user: Option<&Session>) {
        if !self.is_enabled() {
            return;
        }
        match user {
            Some(session) => info!(user = %session.id, provider = %session.provider, "Telemetry user set"),
            None => info!("Telemetry user cleared"),
        }
    }

    fn add_breadcrumb(&self, message: &str, category: &str, data: &Value) {
        if !self.is_enabled() {
            return;
        }
        debug!(%category, %data, "Breadcrumb: {message}");
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn log_error(&self, _error: &(dyn StdError + 'static), _context: &Value) {}

    fn log_warning(&self, _message: &str, _context: &Value) {}

    fn set_user(&self, _user: Option<&Session>) {}

    fn add_breadcrumb(&self, _message: &str, _category: &str, _data: &Value) {}
}

/// A call captured by [`MemoryTelemetry`].
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// `log_error` call.
    Error {
        /// Rendered error chain.
        message: String,
        /// Attached context.
        context: Value,
    },
    /// `log_warning` call.
    Warning {
        /// Warning text.
        message: String,
        /// Attached context.
        context: Value,
    },
    /// `set_user` call, carrying the session id.
    User(Option<String>),
    /// `add_breadcrumb` call.
    Breadcrumb {
        /// Breadcrumb text.
        message: String,
        /// Category tag.
        category: String,
        /// Attached data.
        data: Value,
    },
}

/// Sink that records calls in memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryTelemetry {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded calls.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded error messages.
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::Error { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: TelemetryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn log_error(&self, error: &(dyn StdError + 'static), context: &Value) {
        self.record(TelemetryEvent::Error {
            message: error_chain(error),
            context: context.clone(),
        });
    }

    fn log_warning(&self, message: &str, context: &Value) {
        self.record(TelemetryEvent::Warning {
            message: message.to_owned(),
            context: context.clone(),
        });
    }

    fn set_user(&self, user: Option<&Session>) {
        self.record(TelemetryEvent::User(user.map(|session| session.id.clone())));
    }

    fn add_breadcrumb(&self, message: &str, category: &str, data: &Value) {
        self.record(TelemetryEvent::Breadcrumb {
            message: message.to_owned(),
            category: category.to_owned(),
            data: data.clone(),
        });
    }
}

/// Render an error and its sources as `outer: inner: root`.
#[must_use]
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
