//! Default-merge instantiation of class-shaped units.
//!
//! Immediate arguments are merged now. Deferred arguments produce a
//! provider whose resolver performs the exact same extraction and merge
//! once the host container supplies the computed object.

use std::sync::Arc;

use confmod_common::config::EngineConfig;
use confmod_common::error::{BoxError, Result};
use confmod_common::types::{ConfigInstance, Properties, Token};
use serde_json::Value;

use crate::argument::DeferredArgument;
use crate::descriptor::{DeferredResolver, ProviderSpec};
use crate::extract::extract_with;
use crate::unit::{ConfigClass, UnitVariant};

/// Overlays `overrides` onto `defaults`.
///
/// `null` overrides never replace a default and are never added. Keys
/// unknown to the defaults are still applied.
#[must_use]
pub fn merge(defaults: &Properties, overrides: Properties) -> ConfigInstance {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        if !value.is_null() {
            let _ = merged.insert(key, value);
        }
    }
    ConfigInstance::new(merged)
}

/// Scopes `arg` by label and prefix, then merges it over the class defaults.
///
/// # Errors
///
/// Returns an error if the label is missing under the strict policy.
pub fn instantiate(
    class: &ConfigClass,
    arg: &Properties,
    label: Option<&str>,
    prefix: Option<&str>,
    config: &EngineConfig,
) -> Result<ConfigInstance> {
    let overrides = extract_with(arg, label, prefix, config)?;
    Ok(merge(class.defaults(), overrides))
}

/// Instance of a classified unit, or `None` for factory-shaped units.
///
/// # Errors
///
/// Returns an error if the label is missing under the strict policy.
pub fn instantiate_variant(
    variant: &UnitVariant<'_>,
    arg: &Properties,
    config: &EngineConfig,
) -> Result<Option<ConfigInstance>> {
    variant
        .class()
        .map(|class| instantiate(class, arg, variant.label(), variant.prefix(), config))
        .transpose()
}

/// Builds the deferred provider for a class-shaped unit.
///
/// The provider carries the deferred argument's dependencies; its resolver
/// awaits the computation, then extracts and merges.
#[must_use]
pub fn deferred_provider(
    class: &Arc<ConfigClass>,
    token: Token,
    label: Option<&str>,
    prefix: Option<&str>,
    deferred: &DeferredArgument,
    config: &EngineConfig,
) -> ProviderSpec {
    let class = Arc::clone(class);
    let label = label.map(str::to_owned);
    let prefix = prefix.map(str::to_owned);
    let config = *config;
    let pending = deferred.clone();
    let resolve = DeferredResolver::new(move |deps| {
        let computation = pending.resolve(deps);
        let class = Arc::clone(&class);
        let label = label.clone();
        let prefix = prefix.clone();
        async move {
            let arg = computation.await?;
            let instance = instantiate(&class, &arg, label.as_deref(), prefix.as_deref(), &config)?;
            Ok::<Value, BoxError>(instance.into_value())
        }
    });
    ProviderSpec::Deferred {
        token,
        dependency_modules: deferred.dependency_modules().to_vec(),
        dependency_tokens: deferred.dependency_tokens().to_vec(),
        resolve,
    }
}
