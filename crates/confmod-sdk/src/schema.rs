//! Typed configuration schemas.
//!
//! A [`ConfigSchema`] is a plain serde struct whose `Default` value holds
//! the property defaults. The engine itself works on untyped property
//! maps; this module bridges the two.

use confmod_common::error::{ConfmodError, Result};
use confmod_common::types::{ConfigInstance, Properties};
use confmod_compose::{ConfigClass, ConfigurableUnit};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A typed configuration class.
///
/// Fields that serialize to `null` in the default value are treated as
/// having no default.
pub trait ConfigSchema: Serialize + DeserializeOwned + Default {
    /// Class name; also the default injection token.
    const NAME: &'static str;
    /// Static label scoping the argument to a sub-object.
    const LABEL: Option<&'static str> = None;
    /// Static key prefix filtering the argument.
    const PREFIX: Option<&'static str> = None;
    /// Static token overriding [`NAME`](Self::NAME).
    const TOKEN: Option<&'static str> = None;
}

/// Derives the untyped class descriptor for `T`.
///
/// # Errors
///
/// Returns an error if `T::default()` does not serialize to a JSON object.
pub fn config_class<T: ConfigSchema>() -> Result<ConfigClass> {
    let defaults = match serde_json::to_value(T::default())? {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect::<Properties>(),
        other => {
            return Err(ConfmodError::Config {
                message: format!("schema {} serializes to {other}, expected an object", T::NAME),
            });
        }
    };
    let mut class = ConfigClass::new(T::NAME).with_defaults(defaults);
    if let Some(label) = T::LABEL {
        class = class.with_label(label);
    }
    if let Some(prefix) = T::PREFIX {
        class = class.with_prefix(prefix);
    }
    if let Some(token) = T::TOKEN {
        class = class.with_token(token);
    }
    tracing::trace!(class = T::NAME, defaults = class.defaults().len(), "derived config class");
    Ok(class)
}

/// Derives a class-shaped unit for `T`.
///
/// # Errors
///
/// Returns an error if `T::default()` does not serialize to a JSON object.
pub fn class_unit<T: ConfigSchema>() -> Result<ConfigurableUnit> {
    config_class::<T>().map(ConfigurableUnit::class)
}

/// Reads a merged instance back as `T`.
///
/// # Errors
///
/// Returns an error if the merged properties do not match `T`.
pub fn instance_of<T: ConfigSchema>(instance: &ConfigInstance) -> Result<T> {
    instance.deserialize()
}
