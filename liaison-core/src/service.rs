//! Resolved services.

use crate::{
    behavior::{DynNotificationBehavior, DynPipelineBehavior},
    handler::{DynNotificationHandler, DynRequestHandler},
};
use std::{any::Any, fmt, sync::Arc};

/// A constructed implementation, before it is bound to a capability.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// An implementation bound to one capability, ready to be invoked.
#[derive(Clone)]
pub enum Service {
    /// A request or command handler.
    Request(Arc<dyn DynRequestHandler>),
    /// A notification handler.
    Notification(Arc<dyn DynNotificationHandler>),
    /// A request behavior.
    PipelineBehavior(Arc<dyn DynPipelineBehavior>),
    /// A notification behavior.
    NotificationBehavior(Arc<dyn DynNotificationBehavior>),
}

impl Service {
    /// The request handler, if this is one.
    pub fn into_request(self) -> Option<Arc<dyn DynRequestHandler>> {
        match self {
            Self::Request(handler) => Some(handler),
            _ => None,
        }
    }

    /// The notification handler, if this is one.
    pub fn into_notification(self) -> Option<Arc<dyn DynNotificationHandler>> {
        match self {
            Self::Notification(handler) => Some(handler),
            _ => None,
        }
    }

    /// The request behavior, if this is one.
    pub fn into_pipeline_behavior(self) -> Option<Arc<dyn DynPipelineBehavior>> {
        match self {
            Self::PipelineBehavior(behavior) => Some(behavior),
            _ => None,
        }
    }

    /// The notification behavior, if this is one.
    pub fn into_notification_behavior(self) -> Option<Arc<dyn DynNotificationBehavior>> {
        match self {
            Self::NotificationBehavior(behavior) => Some(behavior),
            _ => None,
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request(_) => "Service::Request",
            Self::Notification(_) => "Service::Notification",
            Self::PipelineBehavior(_) => "Service::PipelineBehavior",
            Self::NotificationBehavior(_) => "Service::NotificationBehavior",
        })
    }
}
