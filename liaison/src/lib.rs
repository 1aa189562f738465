//! # liaison - In-Process Mediator
//!
//! `liaison` decouples the code that asks for something from the code that
//! does it. Callers [`send`](Sender::send) requests and commands to exactly
//! one handler, or [`publish`](Publisher::publish) notifications to every
//! handler; pipeline behaviors wrap either kind of dispatch.
//!
//! Handlers are registered once at startup, either explicitly or by
//! scanning a module for types made visible with [`declare!`]. Generic
//! handlers are registered open and closed over each message type at call
//! time.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use liaison::prelude::*;
//!
//! struct Ping;
//! impl Message for Ping {}
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! #[derive(Default)]
//! struct PingHandler;
//!
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: Ping, _: CancellationToken) -> Result<String, BoxError> {
//!         Ok("pong".into())
//!     }
//! }
//!
//! impl Component for PingHandler {
//!     fn type_info() -> TypeInfo {
//!         TypeInfo::builder::<Self>().default_constructor().request_handler::<Ping>().build()
//!     }
//! }
//!
//! liaison::declare!(PingHandler);
//!
//! let mut services = ServiceCollection::new();
//! services.add_mediator(|config| {
//!     config.register_services_from_module(&Module::of::<PingHandler>())?;
//!     Ok(())
//! })?;
//! let mediator = services.build_provider().mediator();
//! assert_eq!(mediator.send(Ping, CancellationToken::none()).await?, "pong");
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod classify;
pub mod configuration;
pub mod mediator;
pub mod module;
pub mod registrar;
pub mod setup;

pub use liaison_core::{
    // Errors
    AggregateError,
    // Messages and envelopes
    AnyResponse,
    BoxError,
    BoxFuture,
    Bound,
    // Cancellation
    CancellationToken,
    Cancelled,
    Capability,
    Command,
    // Handlers
    CommandHandler,
    // Type model
    Component,
    ConfigurationError,
    DispatchError,
    DynNext,
    Envelope,
    GenericParam,
    HandlerPanicked,
    Message,
    MessageTypeMismatch,
    Next,
    Notification,
    // Behaviors
    NotificationBehavior,
    NotificationHandler,
    NotificationNext,
    OpenCommandHandler,
    OpenNotificationBehavior,
    OpenNotificationHandler,
    OpenPipelineBehavior,
    OpenRequestHandler,
    PipelineBehavior,
    Request,
    RequestHandler,
    ResolveError,
    ServiceKey,
    Shape,
    TimeoutError,
    TypeArg,
    TypeFlags,
    TypeInfo,
    TypeKey,
    Unit,
    UnmappableHandlerError,
    UnmappableReason,
};

pub use configuration::MediatorConfiguration;
pub use mediator::{Mediator, Publisher, Sender};
pub use module::{Declaration, Module};
pub use registrar::{DistinctRegistrar, ServiceRegistrar};
pub use setup::{ServiceCollectionExt, ServiceProviderExt};

// Service container
pub use liaison_std::{Lifetime, ServiceCollection, ServiceProvider};

/// Standard behavior implementations.
pub mod behaviors {
    #![allow(clippy::wildcard_imports)]
    pub use liaison_std::behaviors::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use liaison_std::testing::*;
}

/// Prelude module - common imports for Liaison.
///
/// # Usage
///
/// ```rust,ignore
/// use liaison::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, CancellationToken, Command, CommandHandler, Component, ConfigurationError,
        DispatchError, Lifetime, Mediator, MediatorConfiguration, Message, Module, Next,
        Notification, NotificationBehavior, NotificationHandler, NotificationNext,
        PipelineBehavior, Publisher, Request, RequestHandler, Sender, ServiceCollection,
        ServiceCollectionExt, ServiceProviderExt, TypeInfo, Unit,
    };
}

#[cfg(feature = "macros")]
pub use liaison_macros::{Notification, Request};

#[doc(hidden)]
pub use inventory;

/// Make types visible to module scans.
///
/// Every type must implement [`Component`].
///
/// # Example
///
/// ```rust,ignore
/// liaison::declare!(PingHandler, AuditHandler);
/// ```
#[macro_export]
macro_rules! declare {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::inventory::submit! {
                $crate::Declaration::new(<$ty as $crate::Component>::type_info)
            }
        )+
    };
}
