//! Standard pipeline behaviors.
//!
//! Every behavior here is open: it applies to any request (or
//! notification) and is registered with
//! `MediatorConfiguration::add_open_behavior`.

mod logging;
mod span;
#[cfg(feature = "timeout")]
mod timeout;

pub use self::logging::{LoggingBehavior, NotificationLoggingBehavior};
pub use self::span::TracingBehavior;
#[cfg(feature = "timeout")]
pub use self::timeout::TimeoutBehavior;
