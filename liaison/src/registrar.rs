//! # Registrar
//!
//! The only writer of bindings. Every binding goes through one of two
//! distinctness checks:
//!
//! - [`add_distinct_implementation`](ServiceRegistrar::add_distinct_implementation)
//!   rejects a second binding of the same (service key, implementation) pair,
//! - [`add_distinct_service`](ServiceRegistrar::add_distinct_service)
//!   rejects a second binding of the same service key.
//!
//! Open handlers are routed through the provided methods, which apply the
//! open-handler arity table.

use crate::classify::{HandlerFamily, OpenRule, open_rule, request_capabilities};
use liaison_core::{
    Capability, ConfigurationError, ServiceKey, TypeInfo, UnmappableHandlerError,
    UnmappableReason,
    types::{matching::unmatchable_argument, synthesize_wrapper},
};
use liaison_std::{Lifetime, ServiceCollection, ServiceDescriptor};
use std::sync::Arc;

/// Writes bindings into a service collection.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a ServiceRegistrar",
    label = "missing `ServiceRegistrar` implementation"
)]
pub trait ServiceRegistrar {
    /// Bind `implementation` under `service`, unless that exact pair is already bound.
    ///
    /// The lifetime plays no part in the check.
    fn add_distinct_implementation(
        &mut self,
        service: ServiceKey,
        implementation: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError>;

    /// Bind `implementation` under `service`, unless anything is bound under `service`.
    fn add_distinct_service(
        &mut self,
        service: ServiceKey,
        implementation: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError>;

    /// Every binding, in registration order.
    fn descriptors(&self) -> &[ServiceDescriptor];

    /// Register a generic request handler under its open key.
    fn register_generic_request_handler(
        &mut self,
        handler: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError> {
        match open_rule(HandlerFamily::Request, handler.generic_param_count()) {
            OpenRule::Unreachable => Err(unreachable(&handler)),
            OpenRule::Unsupported => Err(ConfigurationError::UnsupportedRequestArity {
                handler: handler.name().to_string(),
            }),
            OpenRule::Register => {
                ensure_matchable(&handler)?;
                let mut kinds: Vec<Capability> = Vec::new();
                for declared in request_capabilities(&handler) {
                    if !kinds.contains(&declared.capability()) {
                        kinds.push(declared.capability());
                    }
                }
                for kind in kinds {
                    self.add_distinct_implementation(ServiceKey::open(kind), handler.clone(), lifetime)?;
                }
                Ok(())
            }
            OpenRule::Disambiguate => {
                ensure_matchable(&handler)?;
                let declared: Vec<_> = request_capabilities(&handler).collect();
                let [capability] = declared.as_slice() else {
                    return Err(UnmappableHandlerError::new(
                        handler.name(),
                        UnmappableReason::MultipleRequestCapabilities,
                    )
                    .into());
                };
                match capability.capability() {
                    Capability::CommandHandler => self.add_distinct_implementation(
                        ServiceKey::open(Capability::CommandHandler),
                        handler.clone(),
                        lifetime,
                    ),
                    _ => {
                        let wrapper = synthesize_wrapper(&handler, capability)?;
                        tracing::debug!(
                            handler = %handler.name(),
                            wrapper = %wrapper.name(),
                            "Synthesized request handler wrapper"
                        );
                        self.add_distinct_implementation(
                            ServiceKey::open(Capability::RequestHandler),
                            Arc::new(wrapper),
                            lifetime,
                        )
                    }
                }
            }
        }
    }

    /// Register a generic notification handler under its open key.
    fn register_generic_notification_handler(
        &mut self,
        handler: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError> {
        match open_rule(HandlerFamily::Notification, handler.generic_param_count()) {
            OpenRule::Unreachable => Err(unreachable(&handler)),
            OpenRule::Register => {
                ensure_matchable(&handler)?;
                self.add_distinct_implementation(
                    ServiceKey::open(Capability::NotificationHandler),
                    handler,
                    lifetime,
                )
            }
            OpenRule::Disambiguate | OpenRule::Unsupported => {
                Err(ConfigurationError::UnsupportedNotificationArity {
                    handler: handler.name().to_string(),
                })
            }
        }
    }
}

/// Rejects handler capabilities that could never close over a message.
fn ensure_matchable(handler: &TypeInfo) -> Result<(), ConfigurationError> {
    let handlers = handler
        .capabilities()
        .iter()
        .filter(|declared| declared.capability().is_handler());
    for declared in handlers {
        if let Some(argument) = unmatchable_argument(handler.generic_params(), declared.args()) {
            tracing::debug!(
                handler = %handler.name(),
                capability = %declared.capability(),
                %argument,
                "Open handler capability can never match"
            );
            return Err(ConfigurationError::UnmatchableCapability {
                handler: handler.name().to_string(),
                capability: declared.capability().to_string(),
                argument,
            });
        }
    }
    Ok(())
}

fn unreachable(handler: &TypeInfo) -> ConfigurationError {
    let message = format!("Generic type must have at least one argument: {}", handler.name());
    tracing::error!(handler = %handler.name(), "{message}");
    ConfigurationError::Unreachable(message)
}

/// The production registrar over a [`ServiceCollection`].
#[derive(Debug)]
pub struct DistinctRegistrar<'a> {
    services: &'a mut ServiceCollection,
}

impl<'a> DistinctRegistrar<'a> {
    /// Register into `services`.
    pub fn new(services: &'a mut ServiceCollection) -> Self {
        Self { services }
    }

    fn add(&mut self, service: ServiceKey, implementation: Arc<TypeInfo>, lifetime: Lifetime) {
        tracing::debug!(
            service = %service,
            implementation = %implementation.name(),
            ?lifetime,
            "Registered binding"
        );
        self.services.register(service, implementation, lifetime);
    }
}

impl ServiceRegistrar for DistinctRegistrar<'_> {
    fn add_distinct_implementation(
        &mut self,
        service: ServiceKey,
        implementation: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError> {
        let duplicate = self.services.iter().any(|registered| {
            *registered.service() == service && registered.implementation().key() == implementation.key()
        });
        if duplicate {
            return Err(ConfigurationError::DuplicateImplementation {
                service: service.to_string(),
                implementation: implementation.name().to_string(),
            });
        }
        self.add(service, implementation, lifetime);
        Ok(())
    }

    fn add_distinct_service(
        &mut self,
        service: ServiceKey,
        implementation: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<(), ConfigurationError> {
        if let Some(existing) = self.services.iter().find(|registered| *registered.service() == service) {
            return Err(ConfigurationError::DuplicateService {
                service: service.to_string(),
                existing: existing.implementation().name().to_string(),
            });
        }
        self.add(service, implementation, lifetime);
        Ok(())
    }

    fn descriptors(&self) -> &[ServiceDescriptor] {
        self.services.descriptors()
    }
}
