//! # Handlers
//!
//! Handlers perform the work for a message. Requests (and commands) have
//! exactly one handler; notifications have zero or more.
//!
//! Each capability comes in two flavours:
//!
//! - **Closed** traits ([`RequestHandler`], [`CommandHandler`],
//!   [`NotificationHandler`]) are written against one concrete message type.
//! - **Open** traits ([`OpenRequestHandler`], [`OpenCommandHandler`],
//!   [`OpenNotificationHandler`]) are written against any message whose
//!   shape satisfies the generic bounds declared in the handler's
//!   [`TypeInfo`](crate::TypeInfo). They receive an [`Envelope`].
//!
//! Both flavours use native `async fn` for static dispatch. The mediator
//! stores them behind the object-safe [`DynRequestHandler`] and
//! [`DynNotificationHandler`] traits.

use crate::{
    cancel::CancellationToken,
    envelope::{AnyResponse, Envelope},
    error::BoxError,
    message::{Command, Notification, Request, Unit},
};
use std::{future::Future, marker::PhantomData, pin::Pin, sync::Arc};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handles one request type and produces its response.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `RequestHandler<{R}>`",
    label = "missing `RequestHandler` implementation",
    note = "Request handlers must implement `handle` for the specific request type `{R}`."
)]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handle the request.
    fn handle(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Handles one command type. Commands produce no value.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `CommandHandler<{C}>`",
    label = "missing `CommandHandler` implementation"
)]
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// Handle the command.
    fn handle(
        &self,
        command: C,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Reacts to one notification type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `NotificationHandler<{N}>`",
    label = "missing `NotificationHandler` implementation"
)]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Handle the notification.
    fn handle(
        &self,
        notification: &N,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// A request handler closed over its request type at call time.
pub trait OpenRequestHandler: Send + Sync + 'static {
    /// Handle the request. The response must be of the request's response type.
    fn handle(
        &self,
        request: Envelope,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<AnyResponse, BoxError>> + Send;
}

/// A command handler closed over its command type at call time.
pub trait OpenCommandHandler: Send + Sync + 'static {
    /// Handle the command.
    fn handle(
        &self,
        command: Envelope,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// A notification handler closed over its notification type at call time.
pub trait OpenNotificationHandler: Send + Sync + 'static {
    /// Handle the notification.
    fn handle(
        &self,
        notification: &Envelope,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe request handler. Commands are stored as request handlers
/// producing [`Unit`].
pub trait DynRequestHandler: Send + Sync {
    /// Handle an erased request.
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>>;
}

/// Object-safe notification handler.
pub trait DynNotificationHandler: Send + Sync {
    /// Handle an erased notification.
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

// ============================================================================
// Adapters
// ============================================================================

pub(crate) struct TypedRequestHandler<H, R> {
    inner: Arc<H>,
    _marker: PhantomData<fn(R)>,
}

impl<H, R> TypedRequestHandler<H, R> {
    pub(crate) fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<H: RequestHandler<R>, R: Request> DynRequestHandler for TypedRequestHandler<H, R> {
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(async move {
            let request = request.expect_type::<R>()?;
            let response = self.inner.handle(request, cancel).await?;
            Ok(Box::new(response) as AnyResponse)
        })
    }
}

pub(crate) struct TypedCommandHandler<H, C> {
    inner: Arc<H>,
    _marker: PhantomData<fn(C)>,
}

impl<H, C> TypedCommandHandler<H, C> {
    pub(crate) fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<H: CommandHandler<C>, C: Command> DynRequestHandler for TypedCommandHandler<H, C> {
    fn handle_dyn<'a>(
        &'a self,
        command: Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(async move {
            let command = command.expect_type::<C>()?;
            self.inner.handle(command, cancel).await?;
            Ok(Box::new(Unit) as AnyResponse)
        })
    }
}

pub(crate) struct TypedNotificationHandler<H, N> {
    inner: Arc<H>,
    _marker: PhantomData<fn(N)>,
}

impl<H, N> TypedNotificationHandler<H, N> {
    pub(crate) fn new(inner: Arc<H>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<H: NotificationHandler<N>, N: Notification> DynNotificationHandler
    for TypedNotificationHandler<H, N>
{
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let notification = notification.downcast_ref::<N>().ok_or_else(|| {
                crate::error::MessageTypeMismatch {
                    expected: std::any::type_name::<N>(),
                    found: notification.type_name().to_string(),
                }
            })?;
            self.inner.handle(notification, cancel).await
        })
    }
}

pub(crate) struct Open<H>(pub(crate) Arc<H>);

impl<H: OpenRequestHandler> DynRequestHandler for Open<H> {
    fn handle_dyn<'a>(
        &'a self,
        request: Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(self.0.handle(request, cancel))
    }
}

impl<H: OpenNotificationHandler> DynNotificationHandler for Open<H> {
    fn handle_dyn<'a>(
        &'a self,
        notification: &'a Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.0.handle(notification, cancel))
    }
}

pub(crate) struct OpenCommand<H>(pub(crate) Arc<H>);

impl<H: OpenCommandHandler> DynRequestHandler for OpenCommand<H> {
    fn handle_dyn<'a>(
        &'a self,
        command: Envelope,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, BoxError>> {
        Box::pin(async move {
            self.0.handle(command, cancel).await?;
            Ok(Box::new(Unit) as AnyResponse)
        })
    }
}
