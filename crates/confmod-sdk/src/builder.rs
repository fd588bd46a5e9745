//! Fluent API for assembling composed modules.

use confmod_common::config::EngineConfig;
use confmod_common::error::{ConfmodError, Result};
use confmod_compose::{
    ComposedFactory, ConfigurableUnit, Export, ModuleDefinition, ModuleDescriptor, PartialModule,
    ProviderSpec, configurable_module,
};

use crate::schema::{ConfigSchema, class_unit};

/// Builder for a [`ComposedFactory`].
///
/// Collects units and the static parts of the module definition, then
/// produces a factory with [`build`](Self::build). Schema derivation
/// failures are deferred to `build` so the chain stays fluent.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    context: Option<String>,
    units: Vec<ConfigurableUnit>,
    partial: PartialModule,
    export_units: bool,
    config: EngineConfig,
    error: Option<ConfmodError>,
}

impl ModuleBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the naming context of the default identity.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Overrides the identity outright.
    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.partial = self.partial.with_identity(identity);
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub const fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a configurable unit.
    #[must_use]
    pub fn unit(mut self, unit: impl Into<ConfigurableUnit>) -> Self {
        self.units.push(unit.into());
        self
    }

    /// Appends a class unit derived from a typed schema.
    #[must_use]
    pub fn schema<T: ConfigSchema>(mut self) -> Self {
        match class_unit::<T>() {
            Ok(unit) => self.units.push(unit),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Adds a literal import.
    #[must_use]
    pub fn import(mut self, module: ModuleDescriptor) -> Self {
        self.partial = self.partial.import(module);
        self
    }

    /// Adds a provider.
    #[must_use]
    pub fn provider(mut self, provider: ProviderSpec) -> Self {
        self.partial = self.partial.provider(provider);
        self
    }

    /// Adds an export.
    #[must_use]
    pub fn export(mut self, export: impl Into<Export>) -> Self {
        self.partial = self.partial.export(export);
        self
    }

    /// Marks the module global.
    #[must_use]
    pub fn global(mut self, global: bool) -> Self {
        self.partial = self.partial.global(global);
        self
    }

    /// Re-exports every resolved unit module.
    #[must_use]
    pub const fn export_units(mut self) -> Self {
        self.export_units = true;
        self
    }

    /// Adds a grouped configurable import.
    #[must_use]
    pub fn configurable_import(mut self, unit: impl Into<ConfigurableUnit>) -> Self {
        self.partial = self.partial.configurable_import(unit.into());
        self
    }

    /// Adds a grouped smart import.
    #[must_use]
    pub fn smart_import(mut self, unit: impl Into<ConfigurableUnit>) -> Self {
        self.partial = self.partial.smart_import(unit.into());
        self
    }

    /// Builds the factory.
    ///
    /// # Errors
    ///
    /// Returns the first schema derivation failure, or a configuration
    /// error if the module would be entirely empty.
    pub fn build(self) -> Result<ComposedFactory> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let partial = self.partial;
        if self.units.is_empty()
            && partial.imports.is_empty()
            && partial.providers.is_empty()
            && partial.configurable_imports.is_empty()
            && partial.smart_imports.is_empty()
        {
            return Err(ConfmodError::Config {
                message: "module has no units, imports, or providers".to_string(),
            });
        }

        let definition = if self.export_units {
            ModuleDefinition::generator(move |imports, _| partial.clone().export_modules(imports))
        } else {
            ModuleDefinition::Static(partial)
        };
        tracing::debug!(
            context = self.context.as_deref().unwrap_or_default(),
            units = self.units.len(),
            "built module factory"
        );
        let factory = configurable_module(self.units, definition).with_config(self.config);
        Ok(match self.context {
            Some(context) => factory.named(context),
            None => factory,
        })
    }
}
