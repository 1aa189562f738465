//! # liaison-core
//!
//! Core traits and type model for the Liaison in-process mediator.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! crates that only declare messages, handlers and behaviors, without the
//! registration engine or the service container.
//!
//! # Messages
//!
//! - [`Request`]: handled by exactly one handler, producing a response
//! - [`Command`]: a request whose response is the [`Unit`] sentinel
//! - [`Notification`]: broadcast to zero or more handlers
//!
//! # Handlers and behaviors
//!
//! Closed traits ([`RequestHandler`], [`CommandHandler`],
//! [`NotificationHandler`], [`PipelineBehavior`], [`NotificationBehavior`])
//! are written against one message type. Open traits
//! ([`OpenRequestHandler`] and friends) are matched against any message
//! whose [`Shape`] satisfies their declared generic bounds.
//!
//! # Type model
//!
//! [`TypeInfo`] describes a candidate type to the registration engine,
//! [`ServiceKey`] is the identity bindings are stored under.
//!
//! # Error Types
//!
//! - [`ConfigurationError`] - Registration-time errors
//! - [`DispatchError`] - Errors of a single dispatch
//! - [`ResolveError`] - Service provider errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod behavior;
mod cancel;
mod envelope;
mod error;
mod handler;
mod message;
mod service;
mod shape;
pub mod types;

// Re-exports
pub use behavior::{
    Continuation, DynNext, DynNotificationBehavior, DynPipelineBehavior, Next,
    NotificationBehavior, NotificationContinuation, NotificationNext, OpenNotificationBehavior,
    OpenPipelineBehavior, PipelineBehavior,
};
pub use cancel::CancellationToken;
pub use envelope::{AnyResponse, Envelope, downcast_response};
pub use error::{
    AggregateError, BoxError, Cancelled, ConfigurationError, DispatchError, HandlerPanicked,
    MessageTypeMismatch, ResolveError, TimeoutError, UnmappableHandlerError, UnmappableReason,
};
pub use handler::{
    BoxFuture, CommandHandler, DynNotificationHandler, DynRequestHandler, NotificationHandler,
    OpenCommandHandler, OpenNotificationHandler, OpenRequestHandler, RequestHandler,
};
pub use message::{Command, Message, Notification, Request, Unit};
pub use service::{Instance, Service};
pub use shape::{Shape, ShapeBuilder};
pub use types::{
    Bound, Capability, CapabilityImpl, Component, Constructor, GenericParam, Generics, ServiceKey,
    TypeArg, TypeFlags, TypeInfo, TypeInfoBuilder, TypeKey, module_of,
};
