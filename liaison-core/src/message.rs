//! Message traits: requests, commands and notifications.

use crate::shape::Shape;
use std::fmt;

/// A marker trait for everything that can be dispatched.
///
/// Messages must be `Send + Sync + 'static` to be safe for async use.
///
/// # Example
///
/// ```rust,ignore
/// struct Ping { id: u64 }
///
/// impl Message for Ping {}
/// impl Request for Ping {
///     type Response = String;
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "All messages in Liaison must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {
    /// Runtime metadata used to match open handlers against this type.
    ///
    /// Override it to expose views or a generic family.
    fn shape() -> Shape
    where
        Self: Sized,
    {
        Shape::of::<Self>()
    }
}

/// A message handled by exactly one handler, producing a response.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Request",
    label = "missing `Request` implementation",
    note = "Implement `Request` (or derive it) and declare the `Response` type."
)]
pub trait Request: Message {
    /// The value the handler produces. Use [`Unit`] for no value.
    type Response: Send + 'static;
}

/// A request that produces no value.
///
/// Implemented automatically for every `Request<Response = Unit>`.
pub trait Command: Request<Response = Unit> {}

impl<T: Request<Response = Unit>> Command for T {}

/// A message broadcast to zero or more handlers.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Notification",
    label = "missing `Notification` implementation"
)]
pub trait Notification: Message {}

/// The no-value response of a [`Command`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unit;

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("()")
    }
}

impl From<()> for Unit {
    fn from(_: ()) -> Self {
        Unit
    }
}
