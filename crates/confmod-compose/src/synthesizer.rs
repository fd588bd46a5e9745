//! Single-unit module synthesis.
//!
//! Class-shaped units become a one-provider, one-export descriptor.
//! Factory-shaped units are invoked with their scoped argument and their
//! descriptor is returned untouched.

use confmod_common::config::EngineConfig;
use confmod_common::constants::CLASS_MODULE_SUFFIX;
use confmod_common::error::Result;

use crate::argument::RuntimeArgument;
use crate::descriptor::{Export, ModuleDescriptor, ProviderSpec};
use crate::initializer::{deferred_provider, instantiate};
use crate::unit::{ConfigurableUnit, UnitVariant, classify};

/// Classifies and synthesizes a unit.
///
/// # Errors
///
/// Returns an error if the unit, or any unit inside a factory it invokes,
/// cannot be classified.
pub fn synthesize_unit(
    unit: &ConfigurableUnit,
    arg: &RuntimeArgument,
    config: &EngineConfig,
) -> Result<ModuleDescriptor> {
    let variant = classify(unit).map_err(|shape| shape.against(arg))?;
    synthesize(&variant, arg, config)
}

/// Synthesizes the descriptor of an already classified unit.
///
/// # Errors
///
/// Returns an error if a nested factory fails, or if a label is missing
/// under the strict policy.
pub fn synthesize(
    variant: &UnitVariant<'_>,
    arg: &RuntimeArgument,
    config: &EngineConfig,
) -> Result<ModuleDescriptor> {
    let descriptor = match *variant {
        UnitVariant::Factory(factory) => factory.invoke(arg)?,
        UnitVariant::WrappedFactory { factory, .. } => {
            let scoped = arg.scoped(variant.label(), variant.prefix(), config)?;
            factory.invoke(&scoped)?
        }
        UnitVariant::Class(class) | UnitVariant::WrappedClass { class, .. } => {
            let token = variant.token().unwrap_or_else(|| class.token());
            let provider = match arg {
                RuntimeArgument::Immediate(props) => ProviderSpec::Value {
                    token: token.clone(),
                    value: instantiate(class, props, variant.label(), variant.prefix(), config)?
                        .into_value(),
                },
                RuntimeArgument::Deferred(deferred) => deferred_provider(
                    class,
                    token.clone(),
                    variant.label(),
                    variant.prefix(),
                    deferred,
                    config,
                ),
            };
            ModuleDescriptor {
                identity: format!("{}{CLASS_MODULE_SUFFIX}", class.name()),
                imports: Vec::new(),
                providers: vec![provider],
                exports: vec![Export::Token(token)],
                global: None,
            }
        }
    };
    tracing::debug!(
        kind = variant.kind(),
        identity = %descriptor.identity,
        argument = arg.kind(),
        "synthesized unit module"
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use confmod_common::types::{Properties, Token};
    use serde_json::{Value, json};

    use super::*;
    use crate::argument::DeferredArgument;
    use crate::unit::ConfigClass;

    fn arg(value: Value) -> RuntimeArgument {
        RuntimeArgument::try_from(value).expect("object argument")
    }

    fn test_class() -> ConfigClass {
        ConfigClass::new("TestConfigClass").with_default("defaultProp", "default")
    }

    #[test]
    fn class_becomes_one_provider_one_export() {
        let unit = ConfigurableUnit::class(test_class());
        let module = synthesize_unit(
            &unit,
            &arg(json!({ "requiredProp": "required" })),
            &EngineConfig::default(),
        )
        .expect("synthesize");
        assert_eq!(
            serde_json::to_value(&module).expect("serialize"),
            json!({
                "identity": "TestConfigClassConfigurableClassModule",
                "imports": [],
                "providers": [{
                    "kind": "value",
                    "token": "TestConfigClass",
                    "value": { "requiredProp": "required", "defaultProp": "default" },
                }],
                "exports": ["TestConfigClass"],
            })
        );
    }

    #[test]
    fn explicit_token_is_provided_and_exported() {
        let unit = ConfigurableUnit::class(test_class()).with_token("TestToken");
        let module = synthesize_unit(&unit, &RuntimeArgument::empty(), &EngineConfig::default())
            .expect("synthesize");
        assert_eq!(module.providers[0].token(), &Token::new("TestToken"));
        assert_eq!(
            module.exported_tokens().collect::<Vec<_>>(),
            vec![&Token::new("TestToken")]
        );
        assert_eq!(module.identity, "TestConfigClassConfigurableClassModule");
    }

    #[test]
    fn wrapped_factory_receives_scoped_argument() {
        let seen = Arc::new(std::sync::Mutex::new(Properties::new()));
        let sink = Arc::clone(&seen);
        let unit = ConfigurableUnit::factory(move |arg| {
            if let RuntimeArgument::Immediate(props) = arg {
                if let Ok(mut guard) = sink.lock() {
                    *guard = props.clone();
                }
            }
            Ok(ModuleDescriptor::new("Inner"))
        })
        .labeled("L")
        .prefixed("p_");
        let module = synthesize_unit(
            &unit,
            &arg(json!({ "L": { "p_a": 1, "b": 2 }, "other": 3 })),
            &EngineConfig::default(),
        )
        .expect("synthesize");
        assert_eq!(module.identity, "Inner");
        let observed = seen.lock().expect("lock").clone();
        assert_eq!(Value::Object(observed), json!({ "a": 1 }));
    }

    #[test]
    fn bare_factory_is_invoked_once_with_full_argument() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let unit = ConfigurableUnit::factory(move |arg| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(arg.describe(), r#"{"x":1}"#);
            Ok(ModuleDescriptor::new("Inner"))
        });
        let _ = synthesize_unit(&unit, &arg(json!({ "x": 1 })), &EngineConfig::default())
            .expect("synthesize");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_class_embeds_dependencies() {
        let deferred = DeferredArgument::from_fn(|_| Ok(Properties::new()))
            .with_dependency_modules(vec![ModuleDescriptor::new("SomeImportModule")])
            .with_dependency_tokens(vec![Token::new("SomeImportModule")]);
        let module = synthesize_unit(
            &ConfigurableUnit::class(test_class()),
            &RuntimeArgument::from(deferred),
            &EngineConfig::default(),
        )
        .expect("synthesize");
        let value = serde_json::to_value(&module).expect("serialize");
        assert_eq!(value["providers"][0]["kind"], "deferred");
        assert_eq!(
            value["providers"][0]["dependency_modules"][0]["identity"],
            "SomeImportModule"
        );
        assert_eq!(value["providers"][0]["dependency_tokens"], json!(["SomeImportModule"]));
        assert_eq!(value["exports"], json!(["TestConfigClass"]));
    }

    #[test]
    fn invalid_unit_reports_argument() {
        let unit = ConfigurableUnit::wrap(ConfigurableUnit::wrap(ConfigurableUnit::class(
            test_class(),
        )));
        let err = synthesize_unit(&unit, &arg(json!({ "k": "v" })), &EngineConfig::default())
            .expect_err("invalid shape");
        assert!(err.to_string().contains(r#"{"k":"v"}"#), "got: {err}");
    }
}
