//! # confmod-compose
//!
//! Composition engine turning configurable units into module descriptors
//! for a host dependency-injection container.
//!
//! Handles:
//! - **Unit**: the authored unit variants and their classification.
//! - **Extract**: label- and prefix-scoped property extraction.
//! - **Argument**: immediate and deferred runtime arguments.
//! - **Initializer**: default-merge of class-shaped units, now or deferred.
//! - **Synthesizer**: single-unit module descriptors.
//! - **Engine**: recursive composition of unit lists and module definitions.
//! - **Labeled**: per-label compositions, exporters, and importers.

pub mod argument;
pub mod descriptor;
pub mod engine;
pub mod extract;
pub mod initializer;
pub mod labeled;
pub mod synthesizer;
pub mod unit;

pub use argument::{DeferredArgument, RuntimeArgument};
pub use descriptor::{DeferredResolver, Export, ModuleDescriptor, PartialModule, ProviderSpec};
pub use engine::{ComposedFactory, ModuleDefinition, config, configurable_module, smart_module};
pub use labeled::{
    LabeledExporter, LabeledImporter, LabeledModule, LabeledModuleFactory, config_labeled_exporter,
    config_labeled_importer, configurable_module_labeled, module_labeled,
};
pub use unit::{ConfigClass, ConfigurableUnit, ModuleFactory, UnitVariant, UnitWrapper, classify};
