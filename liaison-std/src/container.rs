//! A minimal dependency-injection container.
//!
//! The registration engine writes bindings into a [`ServiceCollection`];
//! [`ServiceCollection::build_provider`] freezes them into a
//! [`ServiceProvider`] that constructs and caches instances according to
//! their [`Lifetime`] and binds them to the capability they were resolved as.
//!
//! Resolution covers both closed bindings (registered under exactly the
//! requested key) and open bindings whose capability closes over the
//! requested key's type arguments. Results always follow registration order.

use liaison_core::{
    CapabilityImpl, Instance, ResolveError, Service, ServiceKey, Shape, TypeInfo, TypeKey,
    types::matching::close,
};
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// How long a constructed instance is reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance for every resolution.
    #[default]
    Transient,
    /// One instance per scope.
    Scoped,
    /// One instance for the whole provider.
    Singleton,
}

/// One binding: an implementation registered under a service key.
#[derive(Clone)]
pub struct ServiceDescriptor {
    service: ServiceKey,
    implementation: Arc<TypeInfo>,
    lifetime: Lifetime,
}

impl ServiceDescriptor {
    /// Create a binding.
    pub fn new(service: ServiceKey, implementation: Arc<TypeInfo>, lifetime: Lifetime) -> Self {
        Self {
            service,
            implementation,
            lifetime,
        }
    }

    /// The key the implementation is bound under.
    pub fn service(&self) -> &ServiceKey {
        &self.service
    }

    /// The implementation.
    pub fn implementation(&self) -> &TypeInfo {
        &self.implementation
    }

    /// Shared handle to the implementation.
    pub fn implementation_handle(&self) -> Arc<TypeInfo> {
        self.implementation.clone()
    }

    /// The lifetime of instances.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The capability implementation that serves `key`, if the binding applies to it.
    fn serving(&self, key: &ServiceKey, message: &Shape) -> Option<&CapabilityImpl> {
        match &self.service {
            ServiceKey::Closed { .. } if self.service != *key => return None,
            ServiceKey::Open(capability) if *capability != key.capability() => return None,
            _ => {}
        }
        let implementation = self.implementation.as_ref();
        implementation
            .capabilities_of(key.capability())
            .find(|declared| {
                close(
                    implementation.generic_params(),
                    declared.args(),
                    key.args(),
                    message,
                )
                .is_some()
            })
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service", &self.service.to_string())
            .field("implementation", self.implementation.key())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// The mutable list of bindings, populated during setup.
#[derive(Debug, Clone, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Bind `implementation` under `service` with `lifetime`.
    pub fn register(
        &mut self,
        service: ServiceKey,
        implementation: Arc<TypeInfo>,
        lifetime: Lifetime,
    ) -> &mut Self {
        self.add(ServiceDescriptor::new(service, implementation, lifetime))
    }

    /// Every binding, in registration order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Iterate over the bindings.
    pub fn iter(&self) -> std::slice::Iter<'_, ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no binding was added.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freeze the bindings into a provider.
    pub fn build_provider(&self) -> ServiceProvider {
        let descriptors = self.descriptors.clone();
        let singletons = descriptors.iter().map(|_| OnceLock::new()).collect();
        let scoped = fresh_cells(descriptors.len());
        ServiceProvider {
            root: Arc::new(Root {
                descriptors,
                singletons,
            }),
            scoped,
        }
    }
}

impl<'a> IntoIterator for &'a ServiceCollection {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Root {
    descriptors: Vec<ServiceDescriptor>,
    singletons: Vec<OnceLock<Instance>>,
}

fn fresh_cells(len: usize) -> Arc<[OnceLock<Instance>]> {
    (0..len).map(|_| OnceLock::new()).collect()
}

/// A service bound to one capability, with the name of its implementation.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The implementation that produced the service.
    pub implementation: TypeKey,
    /// The bound service.
    pub service: Service,
}

/// Resolves services from frozen bindings.
///
/// Cloning is cheap and shares every cache. [`create_scope`](Self::create_scope)
/// shares singletons but starts fresh scoped instances.
#[derive(Clone)]
pub struct ServiceProvider {
    root: Arc<Root>,
    scoped: Arc<[OnceLock<Instance>]>,
}

impl ServiceProvider {
    /// A provider sharing singletons with this one, with its own scoped instances.
    pub fn create_scope(&self) -> ServiceProvider {
        ServiceProvider {
            root: self.root.clone(),
            scoped: fresh_cells(self.root.descriptors.len()),
        }
    }

    /// Every binding, in registration order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.root.descriptors
    }

    /// Resolve every binding that serves `key`, in registration order.
    ///
    /// `message` is the shape of the key's message type; it decides whether
    /// open bindings apply.
    pub fn resolve_all(
        &self,
        key: &ServiceKey,
        message: &Shape,
    ) -> Result<Vec<Resolved>, ResolveError> {
        self.root
            .descriptors
            .iter()
            .enumerate()
            .filter_map(|(index, descriptor)| {
                descriptor
                    .serving(key, message)
                    .map(|capability| (index, descriptor, capability))
            })
            .map(|(index, descriptor, capability)| {
                let instance = self.instance(index, descriptor)?;
                let service = capability
                    .bind(instance)
                    .ok_or_else(|| ResolveError::Binding {
                        implementation: descriptor.implementation.name().to_string(),
                        service: key.to_string(),
                    })?;
                Ok(Resolved {
                    implementation: descriptor.implementation.key().clone(),
                    service,
                })
            })
            .collect()
    }

    /// Resolve the single binding that serves `key`.
    pub fn resolve_one(&self, key: &ServiceKey, message: &Shape) -> Result<Resolved, ResolveError> {
        let mut resolved = self.resolve_all(key, message)?;
        match resolved.len() {
            0 => Err(ResolveError::NotFound {
                service: key.to_string(),
            }),
            1 => Ok(resolved.remove(0)),
            _ => Err(ResolveError::Ambiguous {
                service: key.to_string(),
                implementations: resolved
                    .iter()
                    .map(|resolved| resolved.implementation.name().to_string())
                    .collect(),
            }),
        }
    }

    fn instance(&self, index: usize, descriptor: &ServiceDescriptor) -> Result<Instance, ResolveError> {
        let cell = match descriptor.lifetime {
            Lifetime::Transient => return construct(descriptor),
            Lifetime::Singleton => &self.root.singletons[index],
            Lifetime::Scoped => &self.scoped[index],
        };
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }
        let instance = construct(descriptor)?;
        // A concurrent resolution may have won; its instance is the one kept.
        Ok(cell.get_or_init(|| instance).clone())
    }
}

fn construct(descriptor: &ServiceDescriptor) -> Result<Instance, ResolveError> {
    descriptor
        .implementation
        .construct()
        .ok_or_else(|| ResolveError::MissingConstructor {
            implementation: descriptor.implementation.name().to_string(),
        })
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("descriptors", &self.root.descriptors)
            .finish_non_exhaustive()
    }
}
