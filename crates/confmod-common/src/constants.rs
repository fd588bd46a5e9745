//! Naming conventions for descriptor identities.
//!
//! Identities exist for debuggability only. The engine never checks them
//! for uniqueness.

/// Suffix appended to a class name to form its synthesized module identity.
pub const CLASS_MODULE_SUFFIX: &str = "ConfigurableClassModule";

/// Suffix appended to the naming context of a composed module.
pub const COMPOSED_MODULE_SUFFIX: &str = "ConfigurableModule";

/// Infix between the naming context and the label of a labeled inner module.
pub const LABELED_MODULE_INFIX: &str = "ConfigurableModule_";

/// Infix between the naming context and the label of a labeled proxy module.
pub const LABELED_PROXY_INFIX: &str = "ConfigurableModuleProxy_";

/// Suffix appended to the naming context of a `config` module.
pub const CONFIG_MODULE_SUFFIX: &str = "Config";

/// Infix between the naming context and the label of an exporter module.
pub const EXPORTER_INFIX: &str = "ConfigLabeledExporter_";

/// Infix between the naming context and the label of an importer module.
pub const IMPORTER_INFIX: &str = "ConfigLabeledImporter_";

/// Infix between the naming context and the label of a plain labeled module.
pub const MODULE_LABELED_INFIX: &str = "Module_";

/// Joins an optional naming context with a fixed suffix.
#[must_use]
pub fn identity(context: Option<&str>, suffix: &str) -> String {
    format!("{}{suffix}", context.unwrap_or_default())
}

/// Joins an optional naming context, a fixed infix, and a label.
#[must_use]
pub fn labeled_identity(context: Option<&str>, infix: &str, label: &str) -> String {
    format!("{}{infix}{label}", context.unwrap_or_default())
}
