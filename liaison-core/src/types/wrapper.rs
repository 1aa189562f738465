//! Wrapping one-parameter generic request handlers.
//!
//! A generic handler with a single parameter can implement the
//! two-argument request handler capability with either slot open:
//!
//! - `Lookup<TKey>: RequestHandler<TKey, String>` (request open)
//! - `Unwrap<TValue>: RequestHandler<Wrapped<TValue>, TValue>` (response open)
//!
//! The registrar only deals with `RequestHandler<TRequest, TResponse>`
//! families, so such a handler is registered through a synthesized wrapper
//! descriptor with exactly two parameters. The slot that was already closed
//! is fixed through a `Matches` bound on its parameter. Instances are still
//! the original handler: the binder and constructor are forwarded.

use super::{
    info::{Bound, CapabilityImpl, GenericParam, Generics, TypeArg, TypeInfo},
    key::Capability,
};
use crate::error::{UnmappableHandlerError, UnmappableReason};

/// Synthesize the two-parameter wrapper of `handler` for `capability`.
pub fn synthesize_wrapper(
    handler: &TypeInfo,
    capability: &CapabilityImpl,
) -> Result<TypeInfo, UnmappableHandlerError> {
    let unmappable = |reason| UnmappableHandlerError::new(handler.name(), reason);

    if capability.capability() != Capability::RequestHandler || capability.args().len() != 2 {
        return Err(unmappable(UnmappableReason::NotRequestHandler));
    }
    let (request, response) = (&capability.args()[0], &capability.args()[1]);

    let free_slot = match (request.is_param(), response.is_param()) {
        (false, false) => return Err(unmappable(UnmappableReason::NoGenericArguments)),
        (true, true) => return Err(unmappable(UnmappableReason::BothArgumentsGeneric)),
        (true, false) => 0,
        (false, true) => 1,
    };
    if handler.constructors().len() > 1 {
        return Err(unmappable(UnmappableReason::MultipleConstructors));
    }

    // Every parameter of the original handler maps onto the free slot's parameter.
    let to_free_slot = |_: usize| TypeArg::param(free_slot);
    let original = handler.generic_params().first();
    let carried: Vec<Bound> = original
        .map(|param| {
            param
                .bounds()
                .iter()
                .map(|bound| match bound {
                    Bound::Implements(view) => Bound::Implements(view.clone()),
                    Bound::Matches(pattern) => Bound::Matches(pattern.substitute(&to_free_slot)),
                })
                .collect()
        })
        .unwrap_or_default();
    let fixed = if free_slot == 0 { response } else { request };
    let fixed = Bound::Matches(fixed.substitute(&to_free_slot));

    let (request_bounds, response_bounds) = if free_slot == 0 {
        (carried, vec![fixed])
    } else {
        (vec![fixed], carried)
    };
    let request_param = request_bounds
        .into_iter()
        .fold(GenericParam::new("TRequest"), GenericParam::bound);
    let response_param = response_bounds
        .into_iter()
        .fold(GenericParam::new("TResponse"), GenericParam::bound);

    Ok(TypeInfo {
        key: handler.key().wrapper(format!("{}Wrapper", handler.name())),
        module: handler.module(),
        flags: handler.flags(),
        generics: Generics::Definition(vec![request_param, response_param]),
        capabilities: vec![capability.rebound(
            Capability::RequestHandler,
            vec![TypeArg::param(0), TypeArg::param(1)],
        )],
        constructors: handler.constructors().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AnyResponse, BoxError, CancellationToken, Envelope, OpenCommandHandler, OpenRequestHandler,
        Shape, TypeKey, types::matching::close,
    };

    #[allow(dead_code)]
    struct Wrapped<T>(T);

    trait Keyed {}

    struct Lookup;

    impl OpenRequestHandler for Lookup {
        async fn handle(&self, _request: Envelope, _cancel: CancellationToken) -> Result<AnyResponse, BoxError> {
            Ok(Box::new(String::from("found")))
        }
    }

    impl OpenCommandHandler for Lookup {
        async fn handle(&self, _command: Envelope, _cancel: CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn request_open() -> TypeInfo {
        TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("TKey").implements::<dyn Keyed>())
            .constructor(|| Lookup)
            .open_request_handler(TypeArg::param(0), TypeArg::of::<String>())
            .build()
    }

    fn response_open() -> TypeInfo {
        TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("TValue"))
            .constructor(|| Lookup)
            .open_request_handler(
                TypeArg::generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeArg::param(0)]),
                TypeArg::param(0),
            )
            .build()
    }

    #[test]
    fn request_open_handlers_keep_their_bounds_on_the_request() {
        let handler = request_open();
        let wrapper = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap();

        assert_eq!(wrapper.name(), "LookupWrapper");
        assert_ne!(wrapper.key(), handler.key());
        let params = wrapper.generic_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "TRequest");
        assert_eq!(params[0].bounds(), &[Bound::Implements(TypeKey::of::<dyn Keyed>())]);
        assert_eq!(params[1].bounds(), &[Bound::Matches(TypeArg::of::<String>())]);
        assert_eq!(wrapper.constructors().len(), 1);
    }

    #[test]
    fn response_open_handlers_fix_the_request_family() {
        let handler = response_open();
        let wrapper = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap();
        let capability = &wrapper.capabilities()[0];

        let shape = Shape::builder::<Wrapped<u8>>()
            .generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeKey::of::<u8>()])
            .build();
        let fits = [TypeKey::of::<Wrapped<u8>>(), TypeKey::of::<u8>()];
        let misfit = [TypeKey::of::<Wrapped<u8>>(), TypeKey::of::<String>()];

        assert!(close(wrapper.generic_params(), capability.args(), &fits, &shape).is_some());
        assert!(close(wrapper.generic_params(), capability.args(), &misfit, &shape).is_none());
    }

    #[test]
    fn other_capabilities_are_rejected() {
        let handler = TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("TCommand"))
            .open_command_handler(TypeArg::param(0))
            .build();

        let err = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot wrap type Lookup as it doesn't seem to implement RequestHandler<,>"
        );
    }

    #[test]
    fn both_slots_open_is_rejected() {
        let handler = TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("T"))
            .open_request_handler(TypeArg::param(0), TypeArg::param(0))
            .build();

        let err = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap_err();
        assert_eq!(err.reason(), UnmappableReason::BothArgumentsGeneric);
    }

    #[test]
    fn fully_closed_capabilities_are_rejected() {
        let handler = TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("T"))
            .open_request_handler(TypeArg::of::<u8>(), TypeArg::of::<String>())
            .build();

        let err = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap_err();
        assert!(err.to_string().contains("has no generic type arguments"));
    }

    #[test]
    fn multiple_constructors_are_rejected() {
        let handler = TypeInfo::builder::<Lookup>()
            .generic_param(GenericParam::new("T"))
            .constructor(|| Lookup)
            .constructor(|| Lookup)
            .open_request_handler(TypeArg::param(0), TypeArg::of::<String>())
            .build();

        let err = synthesize_wrapper(&handler, &handler.capabilities()[0]).unwrap_err();
        assert_eq!(err.to_string(), "Cannot wrap type Lookup as it has multiple constructors.");
    }
}
