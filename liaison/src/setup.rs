//! Wiring the mediator into a service collection.

use crate::{configuration::MediatorConfiguration, mediator::Mediator, registrar::DistinctRegistrar};
use liaison_core::ConfigurationError;
use liaison_std::{ServiceCollection, ServiceProvider};

/// Adds mediator registration to [`ServiceCollection`].
pub trait ServiceCollectionExt {
    /// Run `configure` against a fresh [`MediatorConfiguration`] over this collection.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut services = ServiceCollection::new();
    /// services.add_mediator(|config| {
    ///     config.register_services_from_module(&Module::of::<PingHandler>())?;
    ///     Ok(())
    /// })?;
    /// let mediator = services.build_provider().mediator();
    /// ```
    fn add_mediator<F>(&mut self, configure: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut MediatorConfiguration<DistinctRegistrar<'_>>) -> Result<(), ConfigurationError>;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_mediator<F>(&mut self, configure: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut MediatorConfiguration<DistinctRegistrar<'_>>) -> Result<(), ConfigurationError>,
    {
        {
            let mut configuration = MediatorConfiguration::new(DistinctRegistrar::new(self));
            configure(&mut configuration)?;
        }
        tracing::debug!(bindings = self.len(), "Configured mediator");
        Ok(self)
    }
}

/// Builds a [`Mediator`] from a provider.
pub trait ServiceProviderExt {
    /// A mediator resolving from this provider.
    fn mediator(&self) -> Mediator;
}

impl ServiceProviderExt for ServiceProvider {
    fn mediator(&self) -> Mediator {
        Mediator::new(self.clone())
    }
}
