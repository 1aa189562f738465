//! Timeout behavior for time-limited handling.

use liaison_core::{
    AnyResponse, BoxError, CancellationToken, Component, DynNext, Envelope, GenericParam,
    OpenPipelineBehavior, TimeoutError, TypeArg, TypeInfo,
};
use std::time::Duration;
use tokio::time::timeout;

/// Fails a request with [`TimeoutError`] when the rest of the chain takes too long.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    duration: Duration,
}

impl TimeoutBehavior {
    /// The limit used by the [`Component`] descriptor.
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

    /// Create a timeout behavior.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The limit.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// A descriptor constructing the behavior with `duration`.
    pub fn with_duration(duration: Duration) -> TypeInfo {
        Self::describe(move || Self::new(duration))
    }

    fn describe(constructor: impl Fn() -> Self + Send + Sync + 'static) -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TRequest"))
            .generic_param(GenericParam::new("TResponse"))
            .constructor(constructor)
            .open_pipeline_behavior(TypeArg::param(0), TypeArg::param(1))
            .build()
    }
}

impl Default for TimeoutBehavior {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

impl OpenPipelineBehavior for TimeoutBehavior {
    async fn handle(
        &self,
        request: Envelope,
        next: DynNext<'_>,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, BoxError> {
        match timeout(self.duration, next.run(request, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(TimeoutError(self.duration))),
        }
    }
}

impl Component for TimeoutBehavior {
    fn type_info() -> TypeInfo {
        Self::describe(Self::default)
    }
}
