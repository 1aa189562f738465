//! Error types for Liaison.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`ConfigurationError`] - Registration-time failures (always fatal)
//! - [`DispatchError`] - Failures of a single `send`/`publish` call
//! - [`ResolveError`] - Failures of the service provider
//! - [`AggregateError`] - The combined errors of a notification fan-out

use std::{any::Any, fmt, time::Duration};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring the mediator.
///
/// Every variant is raised synchronously by the registration call that
/// detected it. Bindings added before the failure are kept.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The same (service key, implementation) pair was added twice.
    #[error("{implementation} is already registered")]
    DuplicateImplementation {
        /// The service key the pair was bound under.
        service: String,
        /// Name of the implementation type.
        implementation: String,
    },

    /// An exactly-one service key already has an implementation.
    #[error("{service} already has a registered implementation ({existing})")]
    DuplicateService {
        /// The service key.
        service: String,
        /// Name of the implementation that is already bound.
        existing: String,
    },

    /// A closed behavior was expected but a generic type was given.
    #[error("{behavior}: implementation type cannot be a generic type")]
    GenericBehavior {
        /// Name of the behavior type.
        behavior: String,
    },

    /// The type implements neither pipeline behavior capability.
    #[error("{behavior} must implement PipelineBehavior<,> or NotificationBehavior<>")]
    NotABehavior {
        /// Name of the offending type.
        behavior: String,
    },

    /// An open behavior was expected but a closed type was given.
    #[error("{behavior}: implementation type must be a generic type")]
    OpenBehaviorNotGeneric {
        /// Name of the behavior type.
        behavior: String,
    },

    /// An open behavior was given with its type arguments already bound.
    #[error("{behavior}: implementation type must be a generic type definition")]
    OpenBehaviorNotDefinition {
        /// Name of the behavior type.
        behavior: String,
    },

    /// An open behavior implements both pipeline capabilities.
    #[error("{behavior} can only implement either PipelineBehavior<,> or NotificationBehavior<>")]
    AmbiguousOpenBehavior {
        /// Name of the behavior type.
        behavior: String,
    },

    /// The behavior's generic parameter count differs from its capability's arity.
    #[error(
        "{behavior} must take the same number of type arguments (have the same arity) as the {capability} interface implemented."
    )]
    OpenBehaviorArity {
        /// Name of the behavior type.
        behavior: String,
        /// The open capability the behavior implements.
        capability: String,
    },

    /// An open request handler declares more than two generic parameters.
    #[error("Generic request handlers with more than 2 generic type arguments are not supported: {handler}")]
    UnsupportedRequestArity {
        /// Name of the handler type.
        handler: String,
    },

    /// An open notification handler declares more than one generic parameter.
    #[error(
        "Generic notification handlers with more than 1 generic type arguments are not supported: {handler}"
    )]
    UnsupportedNotificationArity {
        /// Name of the handler type.
        handler: String,
    },

    /// An open handler needs the shape of a type other than its message.
    ///
    /// Generic families and views are only known for the message itself, so
    /// such a capability could never close at call time.
    #[error(
        "{handler}: {capability} can only use generic type patterns and view bounds on the message type, not on {argument}"
    )]
    UnmatchableCapability {
        /// Name of the handler type.
        handler: String,
        /// The open capability declared over the pattern.
        capability: String,
        /// The argument that needs an unknown shape.
        argument: String,
    },

    /// An ignore entry does not describe a handler.
    #[error("{name}: type must be a request handler or notification handler")]
    IgnoreNotHandler {
        /// Name of the ignored type.
        name: String,
    },

    /// An ignore entry is not a generic type definition.
    #[error("{name}: type must be a generic type definition")]
    IgnoreNotDefinition {
        /// Name of the ignored type.
        name: String,
    },

    /// A partially closed generic handler could not be wrapped.
    #[error(transparent)]
    Unmappable(#[from] UnmappableHandlerError),

    /// An internal invariant was violated. This signals a bug in Liaison.
    #[error("internal invariant violated: {0}")]
    Unreachable(String),
}

/// Why a one-parameter generic request handler could not be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmappableReason {
    /// The capability is not the two-argument request handler capability.
    NotRequestHandler,
    /// Neither slot of the capability is a free parameter.
    NoGenericArguments,
    /// Both slots of the capability are free parameters.
    BothArgumentsGeneric,
    /// The handler declares more than one constructor.
    MultipleConstructors,
    /// The handler implements several request handler capabilities.
    MultipleRequestCapabilities,
}

impl fmt::Display for UnmappableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotRequestHandler => "it doesn't seem to implement RequestHandler<,>",
            Self::NoGenericArguments => "its RequestHandler definition has no generic type arguments",
            Self::BothArgumentsGeneric => "it already has both generic type arguments",
            Self::MultipleConstructors => "it has multiple constructors.",
            Self::MultipleRequestCapabilities => {
                "it implements more than one request handler capability"
            }
        })
    }
}

/// A generic handler that cannot be turned into a two-parameter request handler.
#[derive(Error, Debug, Clone)]
#[error("Cannot wrap type {handler} as {reason}")]
pub struct UnmappableHandlerError {
    handler: String,
    reason: UnmappableReason,
}

impl UnmappableHandlerError {
    /// Create a new error for the named handler.
    pub fn new(handler: impl Into<String>, reason: UnmappableReason) -> Self {
        Self {
            handler: handler.into(),
            reason,
        }
    }

    /// Name of the handler that could not be wrapped.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The reason wrapping failed.
    pub fn reason(&self) -> UnmappableReason {
        self.reason
    }
}

/// Errors that can occur during a single dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is bound for the request.
    #[error("No handler found for {service}")]
    NoHandler {
        /// The service key that was resolved.
        service: String,
    },

    /// More than one handler matched the request.
    #[error(
        "Multiple handlers found for the same request, most likely you have a generic handler without generic constraints somewhere. The handlers are: {}",
        .handlers.join(", ")
    )]
    MultipleHandlers {
        /// The service key that was resolved.
        service: String,
        /// Names of every matching implementation.
        handlers: Vec<String>,
    },

    /// The service provider failed to produce a service.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A handler or behavior failed. The error is passed through untouched.
    #[error(transparent)]
    Handler(BoxError),

    /// One or more notification handlers failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl DispatchError {
    /// Returns the handler error if this is a [`DispatchError::Handler`].
    pub fn into_handler_error(self) -> Option<BoxError> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised by the service provider.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Nothing is bound under the key.
    #[error("no service registered for {service}")]
    NotFound {
        /// The service key.
        service: String,
    },

    /// Several bindings match a key that must resolve to one service.
    #[error("{service} resolves to multiple implementations: {}", .implementations.join(", "))]
    Ambiguous {
        /// The service key.
        service: String,
        /// Names of the matching implementations.
        implementations: Vec<String>,
    },

    /// The implementation declares no constructor.
    #[error("{implementation} has no constructor")]
    MissingConstructor {
        /// Name of the implementation.
        implementation: String,
    },

    /// The constructed instance could not be bound to the capability.
    #[error("{implementation} cannot be bound as {service}")]
    Binding {
        /// Name of the implementation.
        implementation: String,
        /// The service key.
        service: String,
    },
}

/// The combined errors of every failing notification handler, in the order
/// the handlers ran.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<BoxError>,
}

impl AggregateError {
    /// Create an aggregate from collected errors.
    pub fn new(errors: Vec<BoxError>) -> Self {
        Self { errors }
    }

    /// The collected errors.
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    /// Consume the aggregate and return the collected errors.
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error was collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("One or more errors occurred.")?;
        for err in &self.errors {
            write!(f, " ({err})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|err| err.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// An erased message or response did not have the expected type.
#[derive(Error, Debug, Clone)]
#[error("expected a value of type {expected}, found {found}")]
pub struct MessageTypeMismatch {
    /// The type that was expected.
    pub expected: &'static str,
    /// The type that was found.
    pub found: String,
}

/// A notification handler panicked.
#[derive(Error, Debug, Clone)]
#[error("handler panicked: {0}")]
pub struct HandlerPanicked(pub String);

impl HandlerPanicked {
    /// Build from a panic payload.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        Self(message)
    }
}

/// The operation observed a cancelled [`CancellationToken`](crate::CancellationToken).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// A stage did not complete within its allotted time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("execution timed out after {0:?}")]
pub struct TimeoutError(pub Duration);
