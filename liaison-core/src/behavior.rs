//! # Pipeline behaviors
//!
//! Behaviors wrap the handling of a message. Each one receives a
//! continuation for the rest of the chain and decides when (and whether) to
//! run it: code before the call observes the message on the way in, code
//! after it observes the result on the way out. A behavior that never runs
//! its continuation short-circuits every later behavior and the handler.
//!
//! Request behaviors receive the request by value and pass it on through
//! [`Next::run`], so they may replace or modify it. Notification behaviors
//! only observe the notification; [`NotificationNext::run`] runs the whole
//! handler fan-out.

use crate::{
    cancel::CancellationToken,
    envelope::{AnyResponse, Envelope, downcast_response},
    error::BoxError,
    handler::BoxFuture,
    message::{Notification, Request},
    shape::Shape,
};
use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

/// The erased rest of a request chain.
pub type Continuation<'a> =
    Box<dyn FnOnce(Envelope, CancellationToken) -> BoxFuture<'a, Result<AnyResponse, BoxError>> + Send + 'a>;

/// The erased rest of a notification chain.
pub type NotificationContinuation<'a> =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'a, Result<(), BoxError>> + Send + 'a>;

/// The rest of a request chain, on the erased path.
pub struct DynNext<'a> {
    run: Continuation<'a>,
}

impl<'a> DynNext<'a> {
    /// Wrap a continuation.
    pub fn new(run: Continuation<'a>) -> Self {
        Self { run }
    }

    /// Run the rest of the chain with the given request.
    pub fn run(self, request: Envelope, cancel: CancellationToken) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        (self.run)(request, cancel)
    }
}

impl fmt::Debug for DynNext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynNext").finish_non_exhaustive()
    }
}

/// The rest of a request chain for request type `R`.
pub struct Next<'a, R> {
    inner: DynNext<'a>,
    shape: Arc<Shape>,
    _marker: PhantomData<fn(R)>,
}

impl<'a, R: Request> Next<'a, R> {
    /// Build a typed continuation over an erased one.
    pub fn new(inner: DynNext<'a>, shape: Arc<Shape>) -> Self {
        Self {
            inner,
            shape,
            _marker: PhantomData,
        }
    }

    /// Run the rest of the chain with `request`.
    pub async fn run(self, request: R, cancel: CancellationToken) -> Result<R::Response, BoxError> {
        let response = self
            .inner
            .run(Envelope::with_shape(request, self.shape), cancel)
            .await?;
        Ok(downcast_response::<R::Response>(response)?)
    }
}

impl<R> fmt::Debug for Next<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("request", self.shape.key())
            .finish_non_exhaustive()
    }
}

/// The rest of a notification chain: the remaining behaviors, then every handler.
pub struct NotificationNext<'a> {
    run: NotificationContinuation<'a>,
}

impl<'a> NotificationNext<'a> {
    /// Wrap a continuation.
    pub fn new(run: NotificationContinuation<'a>) -> Self {
        Self { run }
    }

    /// Run the rest of the chain.
    pub fn run(self, cancel: CancellationToken) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.run)(cancel)
    }
}

impl fmt::Debug for NotificationNext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationNext").finish_non_exhaustive()
    }
}

/// Wraps the handling of one request type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `PipelineBehavior<{R}>`",
    label = "missing `PipelineBehavior` implementation"
)]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Handle the request, calling `next` to continue the chain.
    fn handle(
        &self,
        request: R,
        next: Next<'_, R>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Wraps the fan-out of one notification type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `NotificationBehavior<{N}>`",
    label = "missing `NotificationBehavior` implementation"
)]
pub trait NotificationBehavior<N: Notification>: Send + Sync + 'static {
    /// Handle the notification, calling `next` to continue the chain.
    fn handle(
        &self,
        notification: &N,
        next: NotificationNext<'_>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// A request behavior closed over its request type at call time.
pub trait OpenPipelineBehavior: Send + Sync + 'static {
    /// Handle the request, calling `next` to continue the chain.
    fn handle(
        &self,
        request: Envelope,
        next: DynNext<'_>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<AnyResponse, BoxError>> + Send;
}

/// A notification behavior closed over its notification type at call time.
pub trait OpenNotificationBehavior: Send + Sync + 'static {
    /// Handle the notification, calling `next` to continue the chain.
    fn handle(
        &self,
        notification: &Envelope,
        next: NotificationNext<'_>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe request behavior.
pub trait DynPipelineBehavior: Send + Sync {
    /// Handle an erased request.
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        next: DynNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>>;
}

/// Object-safe notification behavior.
pub trait DynNotificationBehavior: Send + Sync {
    /// Handle an erased notification.
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        next: NotificationNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

// ============================================================================
// Adapters
// ============================================================================

pub(crate) struct TypedPipelineBehavior<B, R> {
    inner: Arc<B>,
    _marker: PhantomData<fn(R)>,
}

impl<B, R> TypedPipelineBehavior<B, R> {
    pub(crate) fn new(inner: Arc<B>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<B: PipelineBehavior<R>, R: Request> DynPipelineBehavior for TypedPipelineBehavior<B, R> {
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        next: DynNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(async move {
            let shape = request.shape_handle();
            let request = request.expect_type::<R>()?;
            let response = self
                .inner
                .handle(request, Next::new(next, shape), cancel)
                .await?;
            Ok(Box::new(response) as AnyResponse)
        })
    }
}

pub(crate) struct TypedNotificationBehavior<B, N> {
    inner: Arc<B>,
    _marker: PhantomData<fn(N)>,
}

impl<B, N> TypedNotificationBehavior<B, N> {
    pub(crate) fn new(inner: Arc<B>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<B: NotificationBehavior<N>, N: Notification> DynNotificationBehavior
    for TypedNotificationBehavior<B, N>
{
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        next: NotificationNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let notification = notification.downcast_ref::<N>().ok_or_else(|| {
                crate::error::MessageTypeMismatch {
                    expected: std::any::type_name::<N>(),
                    found: notification.type_name().to_string(),
                }
            })?;
            self.inner.handle(notification, next, cancel).await
        })
    }
}

pub(crate) struct OpenBehavior<B>(pub(crate) Arc<B>);

impl<B: OpenPipelineBehavior> DynPipelineBehavior for OpenBehavior<B> {
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        next: DynNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(self.0.handle(request, next, cancel))
    }
}

impl<B: OpenNotificationBehavior> DynNotificationBehavior for OpenBehavior<B> {
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        next: NotificationNext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.0.handle(notification, next, cancel))
    }
}
