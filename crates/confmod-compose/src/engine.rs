//! The composition engine.
//!
//! A [`ComposedFactory`] resolves an ordered list of configurable units
//! plus a trailing module definition into one composite descriptor. It is
//! itself usable as a factory-shaped unit, which is how compositions nest.

use std::fmt;
use std::sync::Arc;

use confmod_common::config::EngineConfig;
use confmod_common::constants::{self, COMPOSED_MODULE_SUFFIX, CONFIG_MODULE_SUFFIX};
use confmod_common::error::Result;
use confmod_common::types::ConfigInstance;

use crate::argument::RuntimeArgument;
use crate::descriptor::{ModuleDescriptor, PartialModule};
use crate::initializer::instantiate_variant;
use crate::synthesizer::{synthesize, synthesize_unit};
use crate::unit::{ConfigurableUnit, ModuleFactory, UnitVariant, classify};

type GeneratorFn = dyn Fn(&[ModuleDescriptor], &[Option<ConfigInstance>]) -> PartialModule + Send + Sync;

/// The trailing definition of a composed module.
#[derive(Clone)]
pub enum ModuleDefinition {
    /// Taken as-is; no instances are computed for it.
    Static(PartialModule),
    /// Called with the resolved unit modules and, for immediate arguments
    /// only, one instance per unit (`None` for factory-shaped units). For
    /// deferred arguments the instance slice is empty.
    Generator(Arc<GeneratorFn>),
}

impl ModuleDefinition {
    /// Wraps a generator function.
    pub fn generator<F>(generate: F) -> Self
    where
        F: Fn(&[ModuleDescriptor], &[Option<ConfigInstance>]) -> PartialModule + Send + Sync + 'static,
    {
        Self::Generator(Arc::new(generate))
    }
}

impl Default for ModuleDefinition {
    fn default() -> Self {
        Self::Static(PartialModule::default())
    }
}

impl From<PartialModule> for ModuleDefinition {
    fn from(partial: PartialModule) -> Self {
        Self::Static(partial)
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(partial) => f.debug_tuple("Static").field(partial).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A reusable composition of configurable units.
#[derive(Debug, Clone)]
pub struct ComposedFactory {
    units: Vec<ConfigurableUnit>,
    definition: ModuleDefinition,
    context: Option<String>,
    suffix: &'static str,
    scope_label: Option<String>,
    config: EngineConfig,
}

impl ComposedFactory {
    /// Creates a factory from units and a definition.
    #[must_use]
    pub fn new(units: Vec<ConfigurableUnit>, definition: ModuleDefinition) -> Self {
        Self {
            units,
            definition,
            context: None,
            suffix: COMPOSED_MODULE_SUFFIX,
            scope_label: None,
            config: EngineConfig::default(),
        }
    }

    /// Sets the naming context prepended to the default identity.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the engine configuration used for every unit of this factory.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Narrows every incoming argument to its `label` sub-object first.
    ///
    /// This is the second step of a two-step labeled invocation, for
    /// arguments nested inside an outer object keyed by label.
    #[must_use]
    pub fn scoped_to(mut self, label: impl Into<String>) -> Self {
        self.scope_label = Some(label.into());
        self
    }

    const fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Identity used when the definition does not override it.
    #[must_use]
    pub fn default_identity(&self) -> String {
        constants::identity(self.context.as_deref(), self.suffix)
    }

    /// Resolves the composition against a runtime argument.
    ///
    /// # Errors
    ///
    /// Returns the first classification failure anywhere in the tree; no
    /// partial descriptor is produced.
    pub fn resolve(&self, arg: &RuntimeArgument) -> Result<ModuleDescriptor> {
        match self.scope_label.as_deref() {
            Some(label) => self.resolve_scoped(&arg.scoped(Some(label), None, &self.config)?),
            None => self.resolve_scoped(arg),
        }
    }

    fn resolve_scoped(&self, arg: &RuntimeArgument) -> Result<ModuleDescriptor> {
        let variants = self
            .units
            .iter()
            .map(|unit| classify(unit).map_err(|shape| shape.against(arg)))
            .collect::<Result<Vec<UnitVariant<'_>>>>()?;
        let resolved = variants
            .iter()
            .map(|variant| synthesize(variant, arg, &self.config))
            .collect::<Result<Vec<_>>>()?;

        let partial = match (&self.definition, arg) {
            (ModuleDefinition::Static(partial), _) => partial.clone(),
            (ModuleDefinition::Generator(generate), RuntimeArgument::Deferred(_)) => {
                generate(&resolved, &[])
            }
            (ModuleDefinition::Generator(generate), RuntimeArgument::Immediate(props)) => {
                let instances = variants
                    .iter()
                    .map(|variant| instantiate_variant(variant, props, &self.config))
                    .collect::<Result<Vec<_>>>()?;
                generate(&resolved, &instances)
            }
        };

        let configurable = self.resolve_group(&partial.configurable_imports, arg)?;
        let smart = self.resolve_group(&partial.smart_imports, arg)?;

        let PartialModule {
            identity,
            mut imports,
            providers,
            exports,
            global,
            ..
        } = partial;
        imports.extend(resolved);
        imports.extend(configurable);
        imports.extend(smart);

        let descriptor = ModuleDescriptor {
            identity: identity.unwrap_or_else(|| self.default_identity()),
            imports,
            providers,
            exports,
            global,
        };
        tracing::debug!(
            identity = %descriptor.identity,
            units = self.units.len(),
            imports = descriptor.imports.len(),
            argument = arg.kind(),
            "composed module"
        );
        Ok(descriptor)
    }

    fn resolve_group(
        &self,
        group: &[ConfigurableUnit],
        arg: &RuntimeArgument,
    ) -> Result<Vec<ModuleDescriptor>> {
        group
            .iter()
            .map(|unit| synthesize_unit(unit, arg, &self.config))
            .collect()
    }

    /// Turns the factory into a factory-shaped unit for use in another
    /// composition.
    #[must_use]
    pub fn into_unit(self) -> ConfigurableUnit {
        ConfigurableUnit::Factory(self.into_module_factory())
    }

    /// Turns the factory into an opaque [`ModuleFactory`].
    #[must_use]
    pub fn into_module_factory(self) -> ModuleFactory {
        ModuleFactory::new(move |arg| self.resolve(arg))
    }
}

impl From<ComposedFactory> for ConfigurableUnit {
    fn from(factory: ComposedFactory) -> Self {
        factory.into_unit()
    }
}

/// Composes `units` with a trailing module definition.
#[must_use]
pub fn configurable_module(
    units: impl IntoIterator<Item = ConfigurableUnit>,
    definition: impl Into<ModuleDefinition>,
) -> ComposedFactory {
    ComposedFactory::new(units.into_iter().collect(), definition.into())
}

/// Alias of [`configurable_module`].
#[must_use]
pub fn smart_module(
    units: impl IntoIterator<Item = ConfigurableUnit>,
    definition: impl Into<ModuleDefinition>,
) -> ComposedFactory {
    configurable_module(units, definition)
}

/// Composes `units` into a module that re-exports every resolved unit.
///
/// The identity is the naming context followed by `Config`.
#[must_use]
pub fn config(units: impl IntoIterator<Item = ConfigurableUnit>, global: bool) -> ComposedFactory {
    configurable_module(
        units,
        ModuleDefinition::generator(move |imports, _| {
            PartialModule::new().export_modules(imports).global(global)
        }),
    )
    .with_suffix(CONFIG_MODULE_SUFFIX)
}
