//! Testing utilities for Liaison.
//!
//! Handlers that record what reached them, so tests can assert on routing
//! and ordering without writing fixtures by hand.
//!
//! # Features
//!
//! - [`RecordingHandler`]: records every notification it receives
//! - [`CountingHandler`]: counts invocations of any notification or command
//! - [`FailingHandler`]: fails every notification or request with a fixed message
//!
//! The recorders share their state between clones, so the descriptor
//! returned by each `*_info` method constructs handlers that report back to
//! the instance it was called on.

use liaison_core::{
    BoxError, CancellationToken, Command, CommandHandler, Notification, NotificationHandler,
    Request, RequestHandler, TypeInfo,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Handler
// ============================================================================

/// A notification handler that records every notification it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<Pinged>::new();
/// config.register_services([recorder.notification_info()])?;
///
/// mediator.publish(Pinged, CancellationToken::none()).await?;
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingHandler<N: Clone> {
    received: Arc<Mutex<Vec<N>>>,
}

impl<N: Clone> RecordingHandler<N> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A clone of the recorded notifications.
    pub fn received(&self) -> Vec<N> {
        self.received.lock().unwrap().clone()
    }

    /// Number of recorded notifications.
    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Forget every recorded notification.
    pub fn clear(&self) {
        self.received.lock().unwrap().clear();
    }
}

impl<N: Notification + Clone> RecordingHandler<N> {
    /// A descriptor whose instances record into this recorder.
    pub fn notification_info(&self) -> TypeInfo {
        let recorder = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || recorder.clone())
            .notification_handler::<N>()
            .build()
    }
}

impl<N: Clone> Default for RecordingHandler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone> Clone for RecordingHandler<N> {
    fn clone(&self) -> Self {
        Self {
            received: self.received.clone(),
        }
    }
}

impl<N: Notification + Clone> NotificationHandler<N> for RecordingHandler<N> {
    async fn handle(&self, notification: &N, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.received.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts how many times it was invoked.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// A descriptor handling `N` that counts into this counter.
    pub fn notification_info<N: Notification>(&self) -> TypeInfo {
        let counter = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || counter.clone())
            .notification_handler::<N>()
            .build()
    }

    /// A descriptor handling the command `C` that counts into this counter.
    pub fn command_info<C: Command>(&self) -> TypeInfo {
        let counter = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || counter.clone())
            .command_handler::<C>()
            .build()
    }
}

impl<N: Notification> NotificationHandler<N> for CountingHandler {
    async fn handle(&self, _notification: &N, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<C: Command> CommandHandler<C> for CountingHandler {
    async fn handle(&self, _command: C, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// A handler that fails every message with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: Arc<str>,
}

impl FailingHandler {
    /// Fail with `message`.
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message every failure carries.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn error(&self) -> BoxError {
        self.message.to_string().into()
    }

    /// A descriptor failing the notification `N`.
    pub fn notification_info<N: Notification>(&self) -> TypeInfo {
        let failing = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || failing.clone())
            .notification_handler::<N>()
            .build()
    }

    /// A descriptor failing the request `R`.
    pub fn request_info<R: Request>(&self) -> TypeInfo {
        let failing = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || failing.clone())
            .request_handler::<R>()
            .build()
    }
}

impl<N: Notification> NotificationHandler<N> for FailingHandler {
    async fn handle(&self, _notification: &N, _cancel: CancellationToken) -> Result<(), BoxError> {
        Err(self.error())
    }
}

impl<R: Request> RequestHandler<R> for FailingHandler {
    async fn handle(&self, _request: R, _cancel: CancellationToken) -> Result<R::Response, BoxError> {
        Err(self.error())
    }
}
