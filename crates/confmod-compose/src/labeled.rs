//! Label-parameterised compositions.
//!
//! These wrappers let one composition be instantiated several times in
//! the same application under distinct string labels. Every wrapper
//! offers two invocation shapes: `resolve(label, arg)` resolves at once,
//! and `for_label(label)` returns a continuation expecting an outer
//! argument keyed by `label`.

use std::fmt;
use std::sync::Arc;

use confmod_common::config::EngineConfig;
use confmod_common::constants::{
    EXPORTER_INFIX, IMPORTER_INFIX, LABELED_MODULE_INFIX, LABELED_PROXY_INFIX,
    MODULE_LABELED_INFIX, labeled_identity,
};
use confmod_common::error::{ConfmodError, Result};
use confmod_common::types::{ConfigInstance, Token};

use crate::argument::RuntimeArgument;
use crate::descriptor::{Export, ModuleDescriptor, PartialModule, ProviderSpec};
use crate::engine::{ComposedFactory, ModuleDefinition, configurable_module};
use crate::unit::{ConfigurableUnit, UnitVariant, classify};

type LabeledGeneratorFn =
    dyn Fn(&str, &[ModuleDescriptor], &[Option<ConfigInstance>]) -> PartialModule + Send + Sync;

type TokenFn = dyn Fn(&str) -> String + Send + Sync;

/// A composition instantiated per label behind a proxy module.
///
/// For label `L` the result is a proxy descriptor importing and
/// re-exporting an inner descriptor; the inner one is the composition of
/// the base units with the per-label definition, resolved against `arg[L]`.
#[derive(Clone)]
pub struct LabeledModuleFactory {
    units: Vec<ConfigurableUnit>,
    definition: Arc<LabeledGeneratorFn>,
    context: Option<String>,
    config: EngineConfig,
}

impl LabeledModuleFactory {
    /// Sets the naming context prepended to both identities.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Continuation for an argument keyed by `label`.
    #[must_use]
    pub fn for_label(&self, label: &str) -> ComposedFactory {
        let inner_identity = labeled_identity(self.context.as_deref(), LABELED_MODULE_INFIX, label);
        let proxy_identity = labeled_identity(self.context.as_deref(), LABELED_PROXY_INFIX, label);
        tracing::debug!(label, inner = %inner_identity, proxy = %proxy_identity, "labeled module");

        let definition = Arc::clone(&self.definition);
        let owned_label = label.to_owned();
        let inner = configurable_module(
            self.units.iter().cloned(),
            ModuleDefinition::generator(move |imports, instances| {
                let mut partial = definition(&owned_label, imports, instances);
                if partial.identity.is_none() {
                    partial.identity = Some(inner_identity.clone());
                }
                partial
            }),
        )
        .with_config(self.config);

        configurable_module(
            [inner.into_unit().labeled(label)],
            ModuleDefinition::generator(move |imports, _| {
                PartialModule::new()
                    .with_identity(proxy_identity.clone())
                    .export_modules(imports)
            }),
        )
        .with_config(self.config)
    }

    /// Resolves the labeled composition for `label` with an unkeyed argument.
    ///
    /// # Errors
    ///
    /// Returns the first classification failure in the tree.
    pub fn resolve(&self, label: &str, arg: &RuntimeArgument) -> Result<ModuleDescriptor> {
        self.for_label(label).resolve(&arg.nested_under(label))
    }
}

impl fmt::Debug for LabeledModuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledModuleFactory")
            .field("units", &self.units)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Builds a [`LabeledModuleFactory`].
///
/// `definition` receives the label, the resolved base units, and the
/// per-unit instances exactly as a composition generator does.
pub fn configurable_module_labeled<F>(
    units: impl IntoIterator<Item = ConfigurableUnit>,
    definition: F,
) -> LabeledModuleFactory
where
    F: Fn(&str, &[ModuleDescriptor], &[Option<ConfigInstance>]) -> PartialModule
        + Send
        + Sync
        + 'static,
{
    LabeledModuleFactory {
        units: units.into_iter().collect(),
        definition: Arc::new(definition),
        context: None,
        config: EngineConfig::default(),
    }
}

/// A class-shaped unit with its plain and label-qualified tokens.
struct LabeledClass {
    unit: ConfigurableUnit,
    plain: Token,
    derived: Token,
}

/// Classifies exporter and importer units.
///
/// Errors name `arg` when one is supplied, else the label alone.
fn labeled_classes(
    units: &[ConfigurableUnit],
    token_fn: &TokenFn,
    label: &str,
    arg: Option<&RuntimeArgument>,
) -> Result<Vec<LabeledClass>> {
    let context = || arg.map_or_else(|| format!("label \"{label}\""), RuntimeArgument::describe);
    units
        .iter()
        .map(|unit| {
            let variant = classify(unit).map_err(|shape| shape.with_argument(context()))?;
            let (class, wrapper) = match variant {
                UnitVariant::Class(class) => (class, None),
                UnitVariant::WrappedClass { wrapper, class } => (class, Some(wrapper)),
                UnitVariant::Factory(_) | UnitVariant::WrappedFactory { .. } => {
                    return Err(ConfmodError::InvalidUnitShape {
                        shape: format!("{} where a class was expected", unit.shape()),
                        argument: context(),
                    });
                }
            };
            let base = variant.token().unwrap_or_else(|| class.token());
            let derived = Token::new(format!("{}{base}", token_fn(label)));
            let mut labeled = ConfigurableUnit::Class(Arc::clone(class)).with_token(derived.clone());
            if let Some(label) = wrapper.and_then(|w| w.label.clone()) {
                labeled = labeled.labeled(label);
            }
            if let Some(prefix) = wrapper.and_then(|w| w.prefix.clone()) {
                labeled = labeled.prefixed(prefix);
            }
            Ok(LabeledClass {
                unit: labeled,
                plain: class.token(),
                derived,
            })
        })
        .collect()
}

/// Exports class-shaped units under label-qualified tokens.
///
/// Each unit's export token is `token_fn(label)` followed by its explicit
/// token or class name, so two labels never collide.
#[derive(Clone)]
pub struct LabeledExporter {
    units: Vec<ConfigurableUnit>,
    token_fn: Arc<TokenFn>,
    context: Option<String>,
    config: EngineConfig,
}

impl LabeledExporter {
    /// Sets the naming context prepended to the identity.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    fn factory(&self, label: &str, arg: Option<&RuntimeArgument>) -> Result<ComposedFactory> {
        let classes = labeled_classes(&self.units, self.token_fn.as_ref(), label, arg)?;
        let identity = labeled_identity(self.context.as_deref(), EXPORTER_INFIX, label);
        tracing::debug!(label, identity = %identity, units = classes.len(), "labeled exporter");
        let mut partial = PartialModule::new().with_identity(identity).global(true);
        let mut units = Vec::with_capacity(classes.len());
        for class in classes {
            partial = partial.export(class.derived);
            units.push(class.unit);
        }
        Ok(configurable_module(units, partial).with_config(self.config))
    }

    /// Continuation for an argument keyed by `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit is not class-shaped. No argument exists
    /// yet, so the error names the label.
    pub fn for_label(&self, label: &str) -> Result<ComposedFactory> {
        Ok(self.factory(label, None)?.scoped_to(label))
    }

    /// Resolves the exporter for `label` with an unkeyed argument.
    ///
    /// # Errors
    ///
    /// Returns an error naming `arg` if a unit is not class-shaped.
    pub fn resolve(&self, label: &str, arg: &RuntimeArgument) -> Result<ModuleDescriptor> {
        self.factory(label, Some(arg))?.resolve(arg)
    }
}

impl fmt::Debug for LabeledExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledExporter")
            .field("units", &self.units)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Builds a [`LabeledExporter`].
pub fn config_labeled_exporter<F>(
    units: impl IntoIterator<Item = ConfigurableUnit>,
    token_fn: F,
) -> LabeledExporter
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    LabeledExporter {
        units: units.into_iter().collect(),
        token_fn: Arc::new(token_fn),
        context: None,
        config: EngineConfig::default(),
    }
}

/// Aliases plain class tokens to the tokens a [`LabeledExporter`] with the
/// same units and token function exports for a label.
#[derive(Clone)]
pub struct LabeledImporter {
    units: Vec<ConfigurableUnit>,
    token_fn: Arc<TokenFn>,
    context: Option<String>,
}

impl LabeledImporter {
    /// Sets the naming context prepended to the identity.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Builds the aliasing module for `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit is not class-shaped.
    pub fn resolve(&self, label: &str) -> Result<ModuleDescriptor> {
        let classes = labeled_classes(&self.units, self.token_fn.as_ref(), label, None)?;
        let mut module =
            ModuleDescriptor::new(labeled_identity(self.context.as_deref(), IMPORTER_INFIX, label));
        for class in classes {
            module.providers.push(ProviderSpec::Alias {
                token: class.plain.clone(),
                existing: class.derived,
            });
            module.exports.push(Export::Token(class.plain));
        }
        tracing::debug!(label, identity = %module.identity, "labeled importer");
        Ok(module)
    }
}

impl fmt::Debug for LabeledImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledImporter")
            .field("units", &self.units)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Builds a [`LabeledImporter`].
pub fn config_labeled_importer<F>(
    units: impl IntoIterator<Item = ConfigurableUnit>,
    token_fn: F,
) -> LabeledImporter
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    LabeledImporter {
        units: units.into_iter().collect(),
        token_fn: Arc::new(token_fn),
        context: None,
    }
}

/// A plain module whose body depends only on a label.
#[derive(Clone)]
pub struct LabeledModule {
    body: Arc<dyn Fn(&str) -> PartialModule + Send + Sync>,
    context: Option<String>,
}

impl LabeledModule {
    /// Sets the naming context prepended to the identity.
    #[must_use]
    pub fn named(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Builds the module for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfmodError::Config`] if the body declares grouped
    /// configurable or smart imports; there is no argument to resolve
    /// them against.
    pub fn resolve(&self, label: &str) -> Result<ModuleDescriptor> {
        let PartialModule {
            identity,
            imports,
            providers,
            exports,
            global,
            configurable_imports,
            smart_imports,
        } = (self.body)(label);
        if !configurable_imports.is_empty() || !smart_imports.is_empty() {
            tracing::warn!(
                label,
                configurable = configurable_imports.len(),
                smart = smart_imports.len(),
                "labeled module body declares grouped imports"
            );
            return Err(ConfmodError::Config {
                message: format!(
                    "labeled module for label \"{label}\" declares grouped imports, which need a runtime argument"
                ),
            });
        }
        Ok(ModuleDescriptor {
            identity: identity.unwrap_or_else(|| {
                labeled_identity(self.context.as_deref(), MODULE_LABELED_INFIX, label)
            }),
            imports,
            providers,
            exports,
            global,
        })
    }
}

impl fmt::Debug for LabeledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledModule")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Builds a [`LabeledModule`].
pub fn module_labeled<F>(body: F) -> LabeledModule
where
    F: Fn(&str) -> PartialModule + Send + Sync + 'static,
{
    LabeledModule {
        body: Arc::new(body),
        context: None,
    }
}
