//! # Dispatch
//!
//! [`Mediator`] resolves handlers and behaviors from a [`ServiceProvider`]
//! on every call and holds no other state, so one instance can serve any
//! number of concurrent calls.
//!
//! Behaviors are folded around the handler in reverse registration order,
//! which makes the first registered behavior the outermost one: it sees the
//! message first and the result last.

use futures::FutureExt;
use liaison_core::{
    AggregateError, AnyResponse, BoxError, CancellationToken, Capability, Command, Continuation,
    DispatchError, DynNext, DynNotificationBehavior, DynNotificationHandler, DynPipelineBehavior,
    DynRequestHandler, Envelope, HandlerPanicked, Notification, NotificationContinuation,
    NotificationNext, Request, ResolveError, Service, ServiceKey, Shape, TypeKey, Unit,
    downcast_response,
};
use liaison_std::{Resolved, ServiceProvider};
use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};
use tracing::Instrument;

/// Sends requests and commands to their single handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot send requests",
    label = "missing `Sender` implementation"
)]
pub trait Sender: Send + Sync {
    /// Send a request through its behaviors to its handler.
    ///
    /// A request whose response is [`Unit`] follows the command path of
    /// [`send_command`](Self::send_command).
    fn send<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, DispatchError>> + Send;

    /// Send a command through its behaviors to its handler.
    ///
    /// A [`CommandHandler`](liaison_core::CommandHandler) is preferred; a
    /// request handler producing [`Unit`] is used when none is bound.
    fn send_command<C: Command>(
        &self,
        command: C,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Publishes notifications to every handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot publish notifications",
    label = "missing `Publisher` implementation"
)]
pub trait Publisher: Send + Sync {
    /// Publish a notification to every handler, one after the other.
    ///
    /// Every handler runs even when an earlier one fails. Failures are
    /// returned together as [`DispatchError::Aggregate`], in handler order.
    fn publish<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// The in-process mediator.
#[derive(Debug, Clone)]
pub struct Mediator {
    provider: ServiceProvider,
}

impl Mediator {
    /// Dispatch through the bindings of `provider`.
    pub fn new(provider: ServiceProvider) -> Self {
        Self { provider }
    }

    /// The provider handlers are resolved from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    /// A mediator over a new scope of the provider.
    pub fn create_scope(&self) -> Mediator {
        Mediator::new(self.provider.create_scope())
    }

    fn resolve_all(&self, key: &ServiceKey, shape: &Shape) -> Result<Vec<Resolved>, DispatchError> {
        Ok(self.provider.resolve_all(key, shape)?)
    }

    fn single(
        &self,
        key: &ServiceKey,
        resolved: Vec<Resolved>,
    ) -> Result<Option<Arc<dyn DynRequestHandler>>, DispatchError> {
        if resolved.len() > 1 {
            return Err(DispatchError::MultipleHandlers {
                service: key.to_string(),
                handlers: resolved
                    .iter()
                    .map(|resolved| resolved.implementation.name().to_string())
                    .collect(),
            });
        }
        let handler = bind_all(key, resolved, Service::into_request)?.pop();
        Ok(handler.map(|(_, handler)| handler))
    }

    fn request_handler(&self, shape: &Shape, response: TypeKey) -> Result<Arc<dyn DynRequestHandler>, DispatchError> {
        let key = ServiceKey::closed(Capability::RequestHandler, [shape.key().clone(), response]);
        let resolved = self.resolve_all(&key, shape)?;
        self.single(&key, resolved)?
            .ok_or_else(|| DispatchError::NoHandler { service: key.to_string() })
    }

    fn command_handler(&self, shape: &Shape) -> Result<Arc<dyn DynRequestHandler>, DispatchError> {
        let key = ServiceKey::closed(Capability::CommandHandler, [shape.key().clone()]);
        let resolved = self.resolve_all(&key, shape)?;
        match self.single(&key, resolved)? {
            Some(handler) => Ok(handler),
            None => {
                tracing::trace!(service = %key, "No command handler, trying a request handler producing Unit");
                self.request_handler(shape, TypeKey::of::<Unit>())
            }
        }
    }

    async fn dispatch(
        &self,
        request: Envelope,
        handler: Arc<dyn DynRequestHandler>,
        response: TypeKey,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, DispatchError> {
        let key = ServiceKey::closed(
            Capability::PipelineBehavior,
            [request.shape().key().clone(), response],
        );
        let behaviors: Vec<Arc<dyn DynPipelineBehavior>> =
            bind_all(&key, self.resolve_all(&key, request.shape())?, Service::into_pipeline_behavior)?
                .into_iter()
                .map(|(_, behavior)| behavior)
                .collect();
        tracing::trace!(behaviors = behaviors.len(), "Resolved request pipeline");

        let chain = request_chain(&handler, &behaviors);
        chain(request, cancel).await.map_err(DispatchError::Handler)
    }

    async fn send_envelope(
        &self,
        request: Envelope,
        response: TypeKey,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, DispatchError> {
        let handler = if response == TypeKey::of::<Unit>() {
            self.command_handler(request.shape())?
        } else {
            self.request_handler(request.shape(), response.clone())?
        };
        self.dispatch(request, handler, response, cancel).await
    }

    async fn publish_envelope(&self, notification: Envelope, cancel: CancellationToken) -> Result<(), DispatchError> {
        let shape = notification.shape();
        let handler_key = ServiceKey::closed(Capability::NotificationHandler, [shape.key().clone()]);
        let handlers = bind_all(
            &handler_key,
            self.resolve_all(&handler_key, shape)?,
            Service::into_notification,
        )?;
        let behavior_key = ServiceKey::closed(Capability::NotificationBehavior, [shape.key().clone()]);
        let behaviors: Vec<Arc<dyn DynNotificationBehavior>> = bind_all(
            &behavior_key,
            self.resolve_all(&behavior_key, shape)?,
            Service::into_notification_behavior,
        )?
        .into_iter()
        .map(|(_, behavior)| behavior)
        .collect();
        tracing::trace!(
            handlers = handlers.len(),
            behaviors = behaviors.len(),
            "Resolved notification pipeline"
        );

        let chain = notification_chain(&handlers, &behaviors, &notification);
        chain(cancel).await.map_err(|error| match error.downcast::<AggregateError>() {
            Ok(aggregate) => DispatchError::Aggregate(*aggregate),
            Err(error) => DispatchError::Handler(error),
        })
    }
}

/// Convert every resolved service with `convert`, failing on a binding of another kind.
fn bind_all<T>(
    key: &ServiceKey,
    resolved: Vec<Resolved>,
    convert: fn(Service) -> Option<T>,
) -> Result<Vec<(TypeKey, T)>, DispatchError> {
    resolved
        .into_iter()
        .map(|Resolved { implementation, service }| {
            let bound = convert(service).ok_or_else(|| ResolveError::Binding {
                implementation: implementation.name().to_string(),
                service: key.to_string(),
            })?;
            Ok((implementation, bound))
        })
        .collect()
}

/// Run every handler in order, collecting failures.
async fn fan_out(
    handlers: &[(TypeKey, Arc<dyn DynNotificationHandler>)],
    notification: &Envelope,
    cancel: CancellationToken,
) -> Result<(), BoxError> {
    let mut errors: Vec<BoxError> = Vec::new();
    for (implementation, handler) in handlers {
        let outcome = AssertUnwindSafe(handler.handle_dyn(notification, cancel.clone()))
            .catch_unwind()
            .await;
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(error)) => error,
            Err(payload) => Box::new(HandlerPanicked::from_payload(payload)) as BoxError,
        };
        tracing::debug!(handler = %implementation, %error, "Notification handler failed");
        errors.push(error);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Box::new(AggregateError::new(errors)))
    }
}

/// Fold the behaviors around the handler, first registered outermost.
fn request_chain<'a>(
    handler: &'a Arc<dyn DynRequestHandler>,
    behaviors: &'a [Arc<dyn DynPipelineBehavior>],
) -> Continuation<'a> {
    let terminal: Continuation<'a> = Box::new(move |request, cancel| handler.handle_dyn(request, cancel));
    behaviors.iter().rev().fold(terminal, |next, behavior| {
        Box::new(move |request, cancel| behavior.handle_dyn(request, DynNext::new(next), cancel))
    })
}

/// Fold the behaviors around the handler fan-out, first registered outermost.
fn notification_chain<'a>(
    handlers: &'a [(TypeKey, Arc<dyn DynNotificationHandler>)],
    behaviors: &'a [Arc<dyn DynNotificationBehavior>],
    notification: &'a Envelope,
) -> NotificationContinuation<'a> {
    let terminal: NotificationContinuation<'a> =
        Box::new(move |cancel| Box::pin(fan_out(handlers, notification, cancel)));
    behaviors.iter().rev().fold(terminal, |next, behavior| {
        Box::new(move |cancel| behavior.handle_dyn(notification, NotificationNext::new(next), cancel))
    })
}

impl Sender for Mediator {
    async fn send<R: Request>(&self, request: R, cancel: CancellationToken) -> Result<R::Response, DispatchError> {
        let request = Envelope::new(request);
        let span = tracing::debug_span!("send", message = %request.shape().key());
        let response = self
            .send_envelope(request, TypeKey::of::<R::Response>(), cancel)
            .instrument(span)
            .await?;
        downcast_response::<R::Response>(response).map_err(|error| DispatchError::Handler(Box::new(error)))
    }

    async fn send_command<C: Command>(&self, command: C, cancel: CancellationToken) -> Result<(), DispatchError> {
        let command = Envelope::new(command);
        let span = tracing::debug_span!("send", message = %command.shape().key());
        self.send_envelope(command, TypeKey::of::<Unit>(), cancel)
            .instrument(span)
            .await?;
        Ok(())
    }
}

impl Publisher for Mediator {
    async fn publish<N: Notification>(&self, notification: N, cancel: CancellationToken) -> Result<(), DispatchError> {
        let notification = Envelope::new(notification);
        let span = tracing::debug_span!("publish", message = %notification.shape().key());
        self.publish_envelope(notification, cancel).instrument(span).await
    }
}
