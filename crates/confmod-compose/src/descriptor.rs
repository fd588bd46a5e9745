//! Module descriptors handed to the host container.
//!
//! Every composed-factory invocation builds a fresh descriptor tree. The
//! `identity` strings are for debuggability only.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use confmod_common::error::BoxError;
use confmod_common::types::Token;
use serde::Serialize;
use serde_json::{Value, json};

use crate::argument::BoxFuture;
use crate::unit::ConfigurableUnit;

type ResolverFn = dyn Fn(Vec<Value>) -> BoxFuture<std::result::Result<Value, BoxError>> + Send + Sync;

/// Resolver embedded into a deferred provider for the host container to
/// invoke, at most once, with the values of its dependency tokens.
#[derive(Clone)]
pub struct DeferredResolver(Arc<ResolverFn>);

impl DeferredResolver {
    /// Wraps an async resolver.
    pub fn new<F, Fut>(resolve: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, BoxError>> + Send + 'static,
    {
        Self(Arc::new(
            move |deps| -> BoxFuture<std::result::Result<Value, BoxError>> { Box::pin(resolve(deps)) },
        ))
    }

    /// Runs the resolver.
    #[must_use]
    pub fn invoke(&self, dependencies: Vec<Value>) -> BoxFuture<std::result::Result<Value, BoxError>> {
        (self.0)(dependencies)
    }
}

impl fmt::Debug for DeferredResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredResolver(..)")
    }
}

/// One provider registration.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSpec {
    /// A ready value.
    Value {
        /// Provided token.
        token: Token,
        /// Provided value.
        value: Value,
    },
    /// A value computed by the host container through `resolve`.
    Deferred {
        /// Provided token.
        token: Token,
        /// Modules to import before resolving.
        dependency_modules: Vec<ModuleDescriptor>,
        /// Tokens whose values are passed to `resolve`.
        dependency_tokens: Vec<Token>,
        /// The embedded resolver.
        #[serde(skip)]
        resolve: DeferredResolver,
    },
    /// `token` resolves to whatever `existing` resolves to.
    Alias {
        /// Provided token.
        token: Token,
        /// Token being aliased.
        existing: Token,
    },
    /// A provider the host container constructs itself.
    Declared {
        /// Provided token.
        token: Token,
    },
}

impl ProviderSpec {
    /// Token this provider registers.
    #[must_use]
    pub const fn token(&self) -> &Token {
        match self {
            Self::Value { token, .. }
            | Self::Deferred { token, .. }
            | Self::Alias { token, .. }
            | Self::Declared { token } => token,
        }
    }

    /// A provider the host container constructs itself.
    #[must_use]
    pub fn declared(token: impl Into<Token>) -> Self {
        Self::Declared {
            token: token.into(),
        }
    }

    /// A ready value provider.
    #[must_use]
    pub fn value(token: impl Into<Token>, value: impl Into<Value>) -> Self {
        Self::Value {
            token: token.into(),
            value: value.into(),
        }
    }

    fn structure(&self) -> Value {
        match self {
            Self::Deferred {
                token,
                dependency_modules,
                dependency_tokens,
                ..
            } => json!({
                "kind": "deferred",
                "token": token,
                "dependency_modules": dependency_modules.iter().map(ModuleDescriptor::structure).collect::<Vec<_>>(),
                "dependency_tokens": dependency_tokens,
            }),
            other => serde_json::to_value(other).unwrap_or(Value::Null),
        }
    }
}

/// An entry of a descriptor's export list.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Export {
    /// A provided token.
    Token(Token),
    /// A re-exported module.
    Module(ModuleDescriptor),
    /// An inline provider exported directly.
    Provider(ProviderSpec),
}

impl Export {
    fn structure(&self) -> Value {
        match self {
            Self::Token(token) => json!(token),
            Self::Module(module) => module.structure(),
            Self::Provider(provider) => provider.structure(),
        }
    }
}

impl From<Token> for Export {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<ModuleDescriptor> for Export {
    fn from(module: ModuleDescriptor) -> Self {
        Self::Module(module)
    }
}

impl From<ProviderSpec> for Export {
    fn from(provider: ProviderSpec) -> Self {
        Self::Provider(provider)
    }
}

/// A resolved, host-container-consumable module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDescriptor {
    /// Human-readable identity.
    pub identity: String,
    /// Imported modules.
    pub imports: Vec<ModuleDescriptor>,
    /// Provider registrations.
    pub providers: Vec<ProviderSpec>,
    /// Exported tokens, modules, or providers.
    pub exports: Vec<Export>,
    /// Whether the module is registered globally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
}

impl ModuleDescriptor {
    /// An empty descriptor with the given identity.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            imports: Vec::new(),
            providers: Vec::new(),
            exports: Vec::new(),
            global: None,
        }
    }

    /// Tokens this descriptor exports directly.
    pub fn exported_tokens(&self) -> impl Iterator<Item = &Token> {
        self.exports.iter().filter_map(|e| match e {
            Export::Token(token) => Some(token),
            Export::Provider(provider) => Some(provider.token()),
            Export::Module(_) => None,
        })
    }

    /// The descriptor tree with every identity string removed.
    ///
    /// Two descriptors built from identical inputs have equal structures.
    #[must_use]
    pub fn structure(&self) -> Value {
        let mut out = json!({
            "imports": self.imports.iter().map(Self::structure).collect::<Vec<_>>(),
            "providers": self.providers.iter().map(ProviderSpec::structure).collect::<Vec<_>>(),
            "exports": self.exports.iter().map(Export::structure).collect::<Vec<_>>(),
        });
        if let (Some(global), Value::Object(map)) = (self.global, &mut out) {
            let _ = map.insert("global".into(), Value::Bool(global));
        }
        out
    }
}

/// A module definition before the engine appends resolved imports.
///
/// `configurable_imports` and `smart_imports` are grouped unit lists the
/// engine resolves against the same runtime argument.
#[derive(Debug, Clone, Default)]
pub struct PartialModule {
    /// Identity overriding the engine's default naming.
    pub identity: Option<String>,
    /// Literal imports, placed first.
    pub imports: Vec<ModuleDescriptor>,
    /// Provider registrations.
    pub providers: Vec<ProviderSpec>,
    /// Exports.
    pub exports: Vec<Export>,
    /// Global flag.
    pub global: Option<bool>,
    /// Grouped configurable imports.
    pub configurable_imports: Vec<ConfigurableUnit>,
    /// Grouped smart imports.
    pub smart_imports: Vec<ConfigurableUnit>,
}

impl PartialModule {
    /// An empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the identity.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Adds a literal import.
    #[must_use]
    pub fn import(mut self, module: ModuleDescriptor) -> Self {
        self.imports.push(module);
        self
    }

    /// Adds a provider.
    #[must_use]
    pub fn provider(mut self, provider: ProviderSpec) -> Self {
        self.providers.push(provider);
        self
    }

    /// Adds an export.
    #[must_use]
    pub fn export(mut self, export: impl Into<Export>) -> Self {
        self.exports.push(export.into());
        self
    }

    /// Exports every module in `modules`.
    #[must_use]
    pub fn export_modules(mut self, modules: &[ModuleDescriptor]) -> Self {
        self.exports
            .extend(modules.iter().cloned().map(Export::Module));
        self
    }

    /// Sets the global flag.
    #[must_use]
    pub const fn global(mut self, global: bool) -> Self {
        self.global = Some(global);
        self
    }

    /// Adds a unit to the grouped configurable imports.
    #[must_use]
    pub fn configurable_import(mut self, unit: ConfigurableUnit) -> Self {
        self.configurable_imports.push(unit);
        self
    }

    /// Adds a unit to the grouped smart imports.
    #[must_use]
    pub fn smart_import(mut self, unit: ConfigurableUnit) -> Self {
        self.smart_imports.push(unit);
        self
    }
}
