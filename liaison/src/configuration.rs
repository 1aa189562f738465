//! # Registration configuration
//!
//! [`MediatorConfiguration`] is the public surface of the registration
//! phase. It validates candidate types, classifies them and routes them to
//! the [`ServiceRegistrar`].
//!
//! Every operation fails fast with a [`ConfigurationError`]. Bindings added
//! before a failure are kept; a failed configuration is expected to abort
//! startup.

use crate::{
    classify::{Classification, HandlerFamily, classify, is_handler_shaped},
    module::Module,
    registrar::ServiceRegistrar,
};
use liaison_core::{Capability, Component, ConfigurationError, ServiceKey, TypeInfo, TypeKey};
use liaison_std::Lifetime;
use std::{fmt, sync::Arc};

type IgnorePredicate = Box<dyn Fn(&TypeInfo) -> bool + Send + Sync>;

/// Configures the handlers and behaviors of a mediator.
///
/// # Example
///
/// ```rust,ignore
/// services.add_mediator(|config| {
///     config
///         .register_services_from_module_containing::<PingHandler>()?
///         .add_open_behavior::<LoggingBehavior>(Lifetime::Transient)?;
///     Ok(())
/// })?;
/// ```
pub struct MediatorConfiguration<R> {
    registrar: R,
    ignored: Vec<TypeKey>,
    ignore_predicates: Vec<IgnorePredicate>,
    handler_lifetime: Lifetime,
}

impl<R: ServiceRegistrar> MediatorConfiguration<R> {
    /// Configure through `registrar`.
    pub fn new(registrar: R) -> Self {
        Self {
            registrar,
            ignored: Vec::new(),
            ignore_predicates: Vec::new(),
            handler_lifetime: Lifetime::default(),
        }
    }

    /// The underlying registrar.
    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Give back the registrar.
    pub fn into_registrar(self) -> R {
        self.registrar
    }

    // ========================================================================
    // Behaviors
    // ========================================================================

    /// Add the closed behavior `T`.
    pub fn add_behavior<T: Component>(&mut self, lifetime: Lifetime) -> Result<&mut Self, ConfigurationError> {
        self.add_behavior_type(T::type_info(), lifetime)
    }

    /// Add a closed behavior, once per behavior capability it implements.
    pub fn add_behavior_type(&mut self, info: TypeInfo, lifetime: Lifetime) -> Result<&mut Self, ConfigurationError> {
        if info.is_generic() {
            return Err(ConfigurationError::GenericBehavior {
                behavior: info.name().to_string(),
            });
        }

        let mut keys: Vec<ServiceKey> = Vec::new();
        for declared in info.capabilities().iter().filter(|declared| declared.capability().is_behavior()) {
            let key = declared.closed_key().ok_or_else(|| {
                ConfigurationError::Unreachable(format!(
                    "{} declares an open {} without generic parameters",
                    info.name(),
                    declared.capability()
                ))
            })?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Err(ConfigurationError::NotABehavior {
                behavior: info.name().to_string(),
            });
        }

        let info = Arc::new(info);
        for key in keys {
            self.registrar.add_distinct_implementation(key, info.clone(), lifetime)?;
        }
        Ok(self)
    }

    /// Add the open behavior `T`.
    pub fn add_open_behavior<T: Component>(&mut self, lifetime: Lifetime) -> Result<&mut Self, ConfigurationError> {
        self.add_open_behavior_type(T::type_info(), lifetime)
    }

    /// Add an open behavior under the open key of its behavior capability.
    ///
    /// Adding a behavior whose type is already registered is a no-op.
    pub fn add_open_behavior_type(
        &mut self,
        info: TypeInfo,
        lifetime: Lifetime,
    ) -> Result<&mut Self, ConfigurationError> {
        let behavior = || info.name().to_string();
        if !info.is_generic() {
            return Err(ConfigurationError::OpenBehaviorNotGeneric { behavior: behavior() });
        }
        if !info.is_generic_definition() {
            return Err(ConfigurationError::OpenBehaviorNotDefinition { behavior: behavior() });
        }

        let pipeline = info.implements(Capability::PipelineBehavior);
        let notification = info.implements(Capability::NotificationBehavior);
        let capability = match (pipeline, notification) {
            (true, true) => return Err(ConfigurationError::AmbiguousOpenBehavior { behavior: behavior() }),
            (false, false) => return Err(ConfigurationError::NotABehavior { behavior: behavior() }),
            (true, false) => Capability::PipelineBehavior,
            (false, true) => Capability::NotificationBehavior,
        };
        if info.generic_param_count() != capability.arity() {
            return Err(ConfigurationError::OpenBehaviorArity {
                behavior: behavior(),
                capability: capability.open_name(),
            });
        }

        let registered = self
            .registrar
            .descriptors()
            .iter()
            .any(|descriptor| descriptor.implementation().key() == info.key());
        if registered {
            tracing::debug!(behavior = %info.name(), "Open behavior already registered");
            return Ok(self);
        }

        self.registrar
            .add_distinct_implementation(ServiceKey::open(capability), Arc::new(info), lifetime)?;
        Ok(self)
    }

    /// Add several open behaviors, in order.
    pub fn add_open_behaviors(
        &mut self,
        infos: impl IntoIterator<Item = TypeInfo>,
        lifetime: Lifetime,
    ) -> Result<&mut Self, ConfigurationError> {
        for info in infos {
            self.add_open_behavior_type(info, lifetime)?;
        }
        Ok(self)
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Set the lifetime of handlers registered from now on. Transient by default.
    pub fn handler_lifetime(&mut self, lifetime: Lifetime) -> &mut Self {
        self.handler_lifetime = lifetime;
        self
    }

    /// Register every declared handler of `module`, skipping ignored types.
    pub fn register_services_from_module(&mut self, module: &Module) -> Result<&mut Self, ConfigurationError> {
        tracing::debug!(module = %module.path(), "Scanning module");
        for info in module.declared_types() {
            if self.is_ignored(&info) {
                tracing::debug!(type_name = %info.name(), "Skipping ignored type");
                continue;
            }
            self.try_register(info)?;
        }
        Ok(self)
    }

    /// Register every declared handler of each module, in order.
    pub fn register_services_from_modules<'m>(
        &mut self,
        modules: impl IntoIterator<Item = &'m Module>,
    ) -> Result<&mut Self, ConfigurationError> {
        for module in modules {
            self.register_services_from_module(module)?;
        }
        Ok(self)
    }

    /// Register every declared handler of the crate `T` lives in.
    pub fn register_services_from_module_containing<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<&mut Self, ConfigurationError> {
        self.register_services_from_module(&Module::crate_of::<T>())
    }

    /// Register the given types. Ignore rules do not apply.
    pub fn register_services(
        &mut self,
        infos: impl IntoIterator<Item = TypeInfo>,
    ) -> Result<&mut Self, ConfigurationError> {
        for info in infos {
            self.try_register(info)?;
        }
        Ok(self)
    }

    /// Register `T`. Ignore rules do not apply.
    pub fn register_service<T: Component>(&mut self) -> Result<&mut Self, ConfigurationError> {
        self.register_services([T::type_info()])
    }

    // ========================================================================
    // Ignore rules
    // ========================================================================

    /// Exclude generic handler definitions from module scans made from now on.
    pub fn ignore_services(
        &mut self,
        infos: impl IntoIterator<Item = TypeInfo>,
    ) -> Result<&mut Self, ConfigurationError> {
        for info in infos {
            if !is_handler_shaped(&info) {
                return Err(ConfigurationError::IgnoreNotHandler {
                    name: info.name().to_string(),
                });
            }
            if !info.is_generic_definition() {
                return Err(ConfigurationError::IgnoreNotDefinition {
                    name: info.name().to_string(),
                });
            }
            self.ignored.push(info.key().clone());
        }
        Ok(self)
    }

    /// Exclude the generic handler definition `T` from module scans.
    pub fn ignore_service<T: Component>(&mut self) -> Result<&mut Self, ConfigurationError> {
        self.ignore_services([T::type_info()])
    }

    /// Exclude every scanned type matching `predicate`.
    pub fn ignore_services_where(
        &mut self,
        predicate: impl Fn(&TypeInfo) -> bool + Send + Sync + 'static,
    ) -> Result<&mut Self, ConfigurationError> {
        self.ignore_predicates.push(Box::new(predicate));
        Ok(self)
    }

    fn is_ignored(&self, info: &TypeInfo) -> bool {
        self.ignored.contains(info.key()) || self.ignore_predicates.iter().any(|ignore| ignore(info))
    }

    fn try_register(&mut self, info: TypeInfo) -> Result<(), ConfigurationError> {
        let lifetime = self.handler_lifetime;
        let info = Arc::new(info);
        let keys = match classify(&info) {
            Classification::Skipped => {
                tracing::debug!(type_name = %info.name(), "Skipping abstract type");
                return Ok(());
            }
            Classification::NotHandler => {
                tracing::trace!(type_name = %info.name(), "Not a handler");
                return Ok(());
            }
            Classification::Open(HandlerFamily::Request) => {
                return self.registrar.register_generic_request_handler(info.clone(), lifetime);
            }
            Classification::Open(HandlerFamily::Notification) => {
                return self.registrar.register_generic_notification_handler(info.clone(), lifetime);
            }
            Classification::Closed(capabilities) => capabilities
                .into_iter()
                .map(|declared| {
                    declared.closed_key().ok_or_else(|| {
                        ConfigurationError::Unreachable(format!(
                            "{} declares an open {} without generic parameters",
                            info.name(),
                            declared.capability()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        for key in keys {
            if key.capability().is_request_handler() {
                self.registrar.add_distinct_service(key, info.clone(), lifetime)?;
            } else {
                self.registrar.add_distinct_implementation(key, info.clone(), lifetime)?;
            }
        }
        Ok(())
    }
}

impl<R: fmt::Debug> fmt::Debug for MediatorConfiguration<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediatorConfiguration")
            .field("registrar", &self.registrar)
            .field("ignored", &self.ignored)
            .field("ignore_predicates", &self.ignore_predicates.len())
            .field("handler_lifetime", &self.handler_lifetime)
            .finish()
    }
}
