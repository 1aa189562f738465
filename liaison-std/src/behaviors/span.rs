//! Span-per-request behavior.

use liaison_core::{
    AnyResponse, BoxError, CancellationToken, Component, DynNext, Envelope, GenericParam,
    OpenPipelineBehavior, TypeArg, TypeInfo,
};
use tracing::Instrument;

/// Runs the rest of the chain inside an `info` span named after the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

impl OpenPipelineBehavior for TracingBehavior {
    async fn handle(
        &self,
        request: Envelope,
        next: DynNext<'_>,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, BoxError> {
        let span = tracing::info_span!("request", name = %request.type_name());
        next.run(request, cancel).instrument(span).await
    }
}

impl Component for TracingBehavior {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TRequest"))
            .generic_param(GenericParam::new("TResponse"))
            .default_constructor()
            .open_pipeline_behavior(TypeArg::param(0), TypeArg::param(1))
            .build()
    }
}
