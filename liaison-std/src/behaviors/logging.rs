//! Logging behaviors for dispatch observation.

use liaison_core::{
    AnyResponse, BoxError, CancellationToken, Component, DynNext, Envelope, GenericParam,
    NotificationNext, OpenNotificationBehavior, OpenPipelineBehavior, TypeArg, TypeInfo,
};
use std::time::Instant;

/// Logs every request on the way in and its outcome on the way out.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl OpenPipelineBehavior for LoggingBehavior {
    async fn handle(
        &self,
        request: Envelope,
        next: DynNext<'_>,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, BoxError> {
        let name = request.type_name().to_string();
        tracing::debug!(request = %name, "Handling request");
        let started = Instant::now();
        let result = next.run(request, cancel).await;
        match &result {
            Ok(_) => tracing::debug!(request = %name, elapsed = ?started.elapsed(), "Handled request"),
            Err(error) => tracing::warn!(request = %name, %error, "Request failed"),
        }
        result
    }
}

impl Component for LoggingBehavior {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TRequest"))
            .generic_param(GenericParam::new("TResponse"))
            .default_constructor()
            .open_pipeline_behavior(TypeArg::param(0), TypeArg::param(1))
            .build()
    }
}

/// Logs every notification before and after its handlers ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationLoggingBehavior;

impl OpenNotificationBehavior for NotificationLoggingBehavior {
    async fn handle(
        &self,
        notification: &Envelope,
        next: NotificationNext<'_>,
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        let name = notification.type_name();
        tracing::debug!(notification = %name, "Publishing notification");
        let started = Instant::now();
        let result = next.run(cancel).await;
        match &result {
            Ok(()) => tracing::debug!(notification = %name, elapsed = ?started.elapsed(), "Published notification"),
            Err(error) => tracing::warn!(notification = %name, %error, "Notification failed"),
        }
        result
    }
}

impl Component for NotificationLoggingBehavior {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TNotification"))
            .default_constructor()
            .open_notification_behavior(TypeArg::param(0))
            .build()
    }
}
