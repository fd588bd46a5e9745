//! Configurable units and their variant classification.
//!
//! A unit is authored once, statically, as one of three constructors:
//! a class (default record plus optional static metadata), a factory
//! (itself a resolver, usually another composed module), or a wrapper
//! that adds call-site `label` / `prefix` / `token` overrides around
//! either. Classification turns a unit into exactly one of the four
//! resolvable [`UnitVariant`]s, or reports the shape it could not accept.

use std::fmt;
use std::sync::Arc;

use confmod_common::error::{ConfmodError, Result};
use confmod_common::types::{Properties, Token};
use serde_json::Value;

use crate::argument::RuntimeArgument;
use crate::descriptor::ModuleDescriptor;

/// A default-constructible configuration type.
///
/// `defaults` is the explicit record of declared default values; fields
/// without a default are simply absent from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigClass {
    name: String,
    defaults: Properties,
    label: Option<String>,
    prefix: Option<String>,
    token: Option<Token>,
}

impl ConfigClass {
    /// Creates a class with no defaults and no static metadata.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declares a default value for one property.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.defaults.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole default record.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Properties) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets the static label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the static prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the static export token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<Token>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default values.
    #[must_use]
    pub const fn defaults(&self) -> &Properties {
        &self.defaults
    }

    /// Static label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Static prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Token this class exports when nothing overrides it: the static
    /// token, else the class name.
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
            .clone()
            .unwrap_or_else(|| Token::new(self.name.clone()))
    }
}

type FactoryFn = dyn Fn(&RuntimeArgument) -> Result<ModuleDescriptor> + Send + Sync;

/// A function from a runtime argument to a module descriptor.
///
/// Factories are opaque sub-composition engines: the synthesizer only
/// scopes their argument and returns whatever they produce.
#[derive(Clone)]
pub struct ModuleFactory(Arc<FactoryFn>);

impl ModuleFactory {
    /// Wraps a resolver function.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&RuntimeArgument) -> Result<ModuleDescriptor> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// Invokes the factory.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while the factory resolves its own units.
    pub fn invoke(&self, argument: &RuntimeArgument) -> Result<ModuleDescriptor> {
        (self.0)(argument)
    }
}

impl fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleFactory(..)")
    }
}

/// Call-site overrides around another unit.
#[derive(Debug, Clone)]
pub struct UnitWrapper {
    /// Label overriding the wrapped class's static label.
    pub label: Option<String>,
    /// Prefix overriding the wrapped class's static prefix.
    pub prefix: Option<String>,
    /// Token overriding the wrapped class's static token.
    pub token: Option<Token>,
    /// The wrapped unit. Must itself be a class or a factory.
    pub config: ConfigurableUnit,
}

/// An authored configurable unit.
#[derive(Debug, Clone)]
pub enum ConfigurableUnit {
    /// A bare class.
    Class(Arc<ConfigClass>),
    /// A bare factory.
    Factory(ModuleFactory),
    /// A class or factory with call-site overrides.
    Wrapped(Box<UnitWrapper>),
}

impl ConfigurableUnit {
    /// A bare class unit.
    #[must_use]
    pub fn class(class: ConfigClass) -> Self {
        Self::Class(Arc::new(class))
    }

    /// A bare factory unit.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&RuntimeArgument) -> Result<ModuleDescriptor> + Send + Sync + 'static,
    {
        Self::Factory(ModuleFactory::new(factory))
    }

    /// Wraps `config` without overrides.
    ///
    /// Unlike [`labeled`](Self::labeled) and friends this always adds a
    /// wrapper layer, so wrapping a wrapper yields an unclassifiable unit.
    #[must_use]
    pub fn wrap(config: Self) -> Self {
        Self::Wrapped(Box::new(UnitWrapper {
            label: None,
            prefix: None,
            token: None,
            config,
        }))
    }

    /// Sets the call-site label, wrapping the unit if needed.
    #[must_use]
    pub fn labeled(self, label: impl Into<String>) -> Self {
        self.map_wrapper(|w| w.label = Some(label.into()))
    }

    /// Sets the call-site prefix, wrapping the unit if needed.
    #[must_use]
    pub fn prefixed(self, prefix: impl Into<String>) -> Self {
        self.map_wrapper(|w| w.prefix = Some(prefix.into()))
    }

    /// Sets the call-site token, wrapping the unit if needed.
    #[must_use]
    pub fn with_token(self, token: impl Into<Token>) -> Self {
        self.map_wrapper(|w| w.token = Some(token.into()))
    }

    fn map_wrapper(self, apply: impl FnOnce(&mut UnitWrapper)) -> Self {
        let mut wrapper = match self {
            Self::Wrapped(wrapper) => wrapper,
            other => Box::new(UnitWrapper {
                label: None,
                prefix: None,
                token: None,
                config: other,
            }),
        };
        apply(&mut wrapper);
        Self::Wrapped(wrapper)
    }

    /// Short description of the unit's shape, used in error messages.
    #[must_use]
    pub fn shape(&self) -> String {
        match self {
            Self::Class(class) => format!("\"{}\" of [class]", class.name),
            Self::Factory(_) => "factory of [function]".to_string(),
            Self::Wrapped(wrapper) => format!("{{ config: {} }} of [object]", wrapper.config.shape()),
        }
    }
}

impl From<ConfigClass> for ConfigurableUnit {
    fn from(class: ConfigClass) -> Self {
        Self::class(class)
    }
}

impl From<ModuleFactory> for ConfigurableUnit {
    fn from(factory: ModuleFactory) -> Self {
        Self::Factory(factory)
    }
}

/// A classified unit, ready for resolution.
#[derive(Debug, Clone, Copy)]
pub enum UnitVariant<'a> {
    /// A bare class.
    Class(&'a Arc<ConfigClass>),
    /// A bare factory.
    Factory(&'a ModuleFactory),
    /// A class with call-site overrides.
    WrappedClass {
        /// The overrides.
        wrapper: &'a UnitWrapper,
        /// The wrapped class.
        class: &'a Arc<ConfigClass>,
    },
    /// A factory with call-site overrides.
    WrappedFactory {
        /// The overrides.
        wrapper: &'a UnitWrapper,
        /// The wrapped factory.
        factory: &'a ModuleFactory,
    },
}

impl<'a> UnitVariant<'a> {
    /// Whether the unit yields a single configuration instance.
    #[must_use]
    pub const fn is_class_shaped(&self) -> bool {
        matches!(self, Self::Class(_) | Self::WrappedClass { .. })
    }

    /// The class behind a class-shaped variant.
    #[must_use]
    pub const fn class(&self) -> Option<&'a Arc<ConfigClass>> {
        match self {
            Self::Class(class) | Self::WrappedClass { class, .. } => Some(class),
            Self::Factory(_) | Self::WrappedFactory { .. } => None,
        }
    }

    /// Effective label: the wrapper's, else the class's static label.
    #[must_use]
    pub fn label(&self) -> Option<&'a str> {
        match self {
            Self::Class(class) => class.label(),
            Self::Factory(_) => None,
            Self::WrappedClass { wrapper, class } => {
                wrapper.label.as_deref().or_else(|| class.label())
            }
            Self::WrappedFactory { wrapper, .. } => wrapper.label.as_deref(),
        }
    }

    /// Effective prefix: the wrapper's, else the class's static prefix.
    #[must_use]
    pub fn prefix(&self) -> Option<&'a str> {
        match self {
            Self::Class(class) => class.prefix(),
            Self::Factory(_) => None,
            Self::WrappedClass { wrapper, class } => {
                wrapper.prefix.as_deref().or_else(|| class.prefix())
            }
            Self::WrappedFactory { wrapper, .. } => wrapper.prefix.as_deref(),
        }
    }

    /// Export token of a class-shaped variant.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            Self::Class(class) => Some(class.token()),
            Self::WrappedClass { wrapper, class } => {
                Some(wrapper.token.clone().unwrap_or_else(|| class.token()))
            }
            Self::Factory(_) | Self::WrappedFactory { .. } => None,
        }
    }

    /// Variant name for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Factory(_) => "factory",
            Self::WrappedClass { .. } => "wrapped-class",
            Self::WrappedFactory { .. } => "wrapped-factory",
        }
    }
}

/// A unit that matched none of the four variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidShape {
    shape: String,
}

impl InvalidShape {
    /// Attaches the runtime argument the unit was being resolved against.
    #[must_use]
    pub fn against(self, argument: &RuntimeArgument) -> ConfmodError {
        self.with_argument(argument.describe())
    }

    /// Attaches a free-form description of the resolution context.
    #[must_use]
    pub fn with_argument(self, argument: impl Into<String>) -> ConfmodError {
        ConfmodError::InvalidUnitShape {
            shape: self.shape,
            argument: argument.into(),
        }
    }
}

/// Classifies a unit into one of the four resolvable variants.
///
/// A wrapper must wrap a class or a factory directly, and a class must
/// carry a name to derive its token and identity from.
///
/// # Errors
///
/// Returns [`InvalidShape`] describing the offending unit otherwise.
pub fn classify(unit: &ConfigurableUnit) -> std::result::Result<UnitVariant<'_>, InvalidShape> {
    let variant = match unit {
        ConfigurableUnit::Class(class) => UnitVariant::Class(class),
        ConfigurableUnit::Factory(factory) => UnitVariant::Factory(factory),
        ConfigurableUnit::Wrapped(wrapper) => match &wrapper.config {
            ConfigurableUnit::Class(class) => UnitVariant::WrappedClass { wrapper, class },
            ConfigurableUnit::Factory(factory) => UnitVariant::WrappedFactory { wrapper, factory },
            ConfigurableUnit::Wrapped(_) => {
                return Err(InvalidShape {
                    shape: unit.shape(),
                });
            }
        },
    };
    if variant.class().is_some_and(|class| class.name().is_empty()) {
        return Err(InvalidShape {
            shape: unit.shape(),
        });
    }
    Ok(variant)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_class() -> ConfigClass {
        ConfigClass::new("TestConfigClass").with_default("defaultProp", "default")
    }

    #[test]
    fn bare_class_classifies_as_class() {
        let unit = ConfigurableUnit::class(test_class());
        let variant = classify(&unit).expect("classify");
        assert_eq!(variant.kind(), "class");
        assert!(variant.is_class_shaped());
        assert_eq!(variant.token(), Some(Token::new("TestConfigClass")));
    }

    #[test]
    fn bare_factory_classifies_as_factory() {
        let unit = ConfigurableUnit::factory(|_| Ok(ModuleDescriptor::new("Inner")));
        let variant = classify(&unit).expect("classify");
        assert_eq!(variant.kind(), "factory");
        assert!(!variant.is_class_shaped());
        assert_eq!(variant.token(), None);
    }

    #[test]
    fn wrapper_overrides_static_metadata() {
        let class = test_class()
            .with_label("static_label")
            .with_prefix("static_prefix_")
            .with_token("StaticToken");
        let unit = ConfigurableUnit::class(class)
            .labeled("inline_label")
            .with_token("InlineToken");
        let variant = classify(&unit).expect("classify");
        assert_eq!(variant.kind(), "wrapped-class");
        assert_eq!(variant.label(), Some("inline_label"));
        assert_eq!(variant.prefix(), Some("static_prefix_"));
        assert_eq!(variant.token(), Some(Token::new("InlineToken")));
    }

    #[test]
    fn wrapped_class_falls_back_to_static_token_then_name() {
        let with_static = ConfigurableUnit::class(test_class().with_token("Static")).labeled("l");
        assert_eq!(
            classify(&with_static).expect("classify").token(),
            Some(Token::new("Static"))
        );
        let bare = ConfigurableUnit::wrap(ConfigurableUnit::class(test_class()));
        assert_eq!(
            classify(&bare).expect("classify").token(),
            Some(Token::new("TestConfigClass"))
        );
    }

    #[test]
    fn chained_overrides_share_one_wrapper() {
        let unit = ConfigurableUnit::class(test_class())
            .labeled("a")
            .prefixed("p_");
        let variant = classify(&unit).expect("chained overrides stay classifiable");
        assert_eq!(variant.label(), Some("a"));
        assert_eq!(variant.prefix(), Some("p_"));
    }

    #[test]
    fn wrapped_factory_carries_label_and_prefix() {
        let unit = ConfigurableUnit::factory(|_| Ok(ModuleDescriptor::new("Inner")))
            .labeled("inline_label")
            .prefixed("p_");
        let variant = classify(&unit).expect("classify");
        assert_eq!(variant.kind(), "wrapped-factory");
        assert_eq!(variant.label(), Some("inline_label"));
        assert_eq!(variant.prefix(), Some("p_"));
        assert!(variant.class().is_none());
    }

    #[test]
    fn wrapper_around_wrapper_is_rejected() {
        let unit = ConfigurableUnit::wrap(ConfigurableUnit::wrap(ConfigurableUnit::class(
            test_class(),
        )));
        let Err(shape) = classify(&unit) else {
            panic!("nested wrapper must not classify");
        };
        let argument = RuntimeArgument::try_from(json!({ "requiredProp": "required" }))
            .expect("object argument");
        let msg = shape.against(&argument).to_string();
        assert!(msg.contains("[object]"), "got: {msg}");
        assert!(msg.contains("requiredProp"), "got: {msg}");
    }

    #[test]
    fn nameless_class_is_rejected() {
        let unit = ConfigurableUnit::class(ConfigClass::new(""));
        let err = classify(&unit)
            .map(|v| v.kind())
            .expect_err("nameless class")
            .with_argument("\"\"");
        assert_eq!(
            err.to_string(),
            "configurable unit \"\" of [class] resolved against \"\" is not a valid config base for module"
        );
    }
}
