//! Two labeled database configurations in one application.
//!
//! Demonstrates deriving a class from a typed schema, exporting it under
//! per-label tokens, resolving a deferred argument the way a host
//! container would, and inspecting the resulting module graph.
//!
//! Run with:
//! ```bash
//! cargo run -p confmod-sdk --example labeled_database
//! ```

use confmod_common::error::BoxError;
use confmod_common::types::{ConfigInstance, Properties, Token};
use confmod_compose::{
    DeferredArgument, ModuleDescriptor, ProviderSpec, RuntimeArgument, config_labeled_exporter,
    config_labeled_importer,
};
use confmod_sdk::graph::ModuleGraph;
use confmod_sdk::schema::{ConfigSchema, class_unit, instance_of};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct DatabaseConfig {
    host: String,
    port: u16,
    pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            pool_size: 4,
        }
    }
}

impl ConfigSchema for DatabaseConfig {
    const NAME: &'static str = "DatabaseConfig";
    const PREFIX: Option<&'static str> = Some("db_");
}

fn token_prefix(label: &str) -> String {
    format!("{label}_")
}

/// Deferred argument reading `<LABEL>_DB_*` style settings from an
/// injected environment object.
fn environment_argument() -> DeferredArgument {
    DeferredArgument::new(|deps: Vec<Value>| async move {
        let env = deps.into_iter().next().unwrap_or(Value::Null);
        let mut props = Properties::new();
        if let Value::Object(map) = env {
            props.extend(map);
        }
        Ok::<_, BoxError>(props)
    })
    .with_dependency_modules(vec![ModuleDescriptor::new("EnvironmentModule")])
    .with_dependency_tokens(vec![Token::new("Environment")])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .init();

    tracing::info!("=== confmod: labeled database configuration ===");

    let exporter = config_labeled_exporter([class_unit::<DatabaseConfig>()?], token_prefix)
        .named("Database");
    let importer = config_labeled_importer([class_unit::<DatabaseConfig>()?], token_prefix)
        .named("Database");

    let primary = exporter.resolve(
        "primary",
        &RuntimeArgument::try_from(json!({ "db_host": "primary.internal", "db_pool_size": 16 }))?,
    )?;
    let replica = exporter.resolve("replica", &RuntimeArgument::from(environment_argument()))?;
    let aliases = importer.resolve("primary")?;

    for module in [&primary, &replica, &aliases] {
        let tokens: Vec<&str> = module.exported_tokens().map(Token::as_str).collect();
        tracing::info!(identity = %module.identity, ?tokens, "module ready");
    }

    if let ProviderSpec::Value { value, .. } = &primary.imports[0].providers[0] {
        let instance = ConfigInstance::new(value.as_object().cloned().unwrap_or_default());
        let config: DatabaseConfig = instance_of(&instance)?;
        tracing::info!(?config, "primary configuration");
    }

    if let ProviderSpec::Deferred { resolve, .. } = &replica.imports[0].providers[0] {
        let environment = json!({ "db_host": "replica.internal", "db_port": 6432 });
        let value = resolve
            .invoke(vec![environment])
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!(%value, "replica configuration resolved");
    }

    let mut root = ModuleDescriptor::new("AppModule");
    root.imports.extend([primary, replica, aliases]);
    let graph = ModuleGraph::from_descriptor(&root);
    for (step, identity) in graph.init_order()?.iter().enumerate() {
        tracing::info!(step = step + 1, identity, "initialize");
    }
    let collisions = graph.identity_collisions();
    tracing::info!(count = collisions.len(), "identity check complete");

    Ok(())
}
