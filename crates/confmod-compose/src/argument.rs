//! The runtime argument a composed factory is invoked with.
//!
//! An argument is either an immediate property object or a deferred
//! computation bundled with the dependencies the host container must
//! inject into it. The engine never polls a deferred computation; it only
//! composes new resolvers around it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use confmod_common::config::EngineConfig;
use confmod_common::error::{BoxError, ConfmodError, Result};
use confmod_common::types::{Properties, Token};
use serde_json::Value;

use crate::descriptor::ModuleDescriptor;
use crate::extract::extract_with;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type ResolveFn = dyn Fn(Vec<Value>) -> BoxFuture<std::result::Result<Properties, BoxError>>
    + Send
    + Sync;

/// A single-shot asynchronous computation of the argument object.
///
/// `resolve` receives the values the host container resolved for
/// `dependency_tokens`, in order.
#[derive(Clone)]
pub struct DeferredArgument {
    dependency_modules: Vec<ModuleDescriptor>,
    dependency_tokens: Vec<Token>,
    resolve: Arc<ResolveFn>,
}

impl DeferredArgument {
    /// Creates a deferred argument from an async resolver.
    pub fn new<F, Fut>(resolve: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Properties, BoxError>> + Send + 'static,
    {
        Self {
            dependency_modules: Vec::new(),
            dependency_tokens: Vec::new(),
            resolve: Arc::new(
                move |deps| -> BoxFuture<std::result::Result<Properties, BoxError>> {
                    Box::pin(resolve(deps))
                },
            ),
        }
    }

    /// Creates a deferred argument from a synchronous resolver.
    pub fn from_fn<F>(resolve: F) -> Self
    where
        F: Fn(Vec<Value>) -> std::result::Result<Properties, BoxError> + Send + Sync + 'static,
    {
        Self::new(move |deps| std::future::ready(resolve(deps)))
    }

    /// Sets the modules the host container must import before resolving.
    #[must_use]
    pub fn with_dependency_modules(mut self, modules: Vec<ModuleDescriptor>) -> Self {
        self.dependency_modules = modules;
        self
    }

    /// Sets the tokens whose values are injected into the resolver.
    #[must_use]
    pub fn with_dependency_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.dependency_tokens = tokens;
        self
    }

    /// Modules the host container must import before resolving.
    #[must_use]
    pub fn dependency_modules(&self) -> &[ModuleDescriptor] {
        &self.dependency_modules
    }

    /// Tokens whose values are injected into the resolver.
    #[must_use]
    pub fn dependency_tokens(&self) -> &[Token] {
        &self.dependency_tokens
    }

    /// Starts the deferred computation with the injected dependencies.
    #[must_use]
    pub fn resolve(&self, dependencies: Vec<Value>) -> BoxFuture<std::result::Result<Properties, BoxError>> {
        (self.resolve)(dependencies)
    }

    /// Returns a deferred argument with the same dependencies whose result
    /// is post-processed by `transform`.
    #[must_use]
    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(Properties) -> std::result::Result<Properties, BoxError> + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.resolve);
        let transform = Arc::new(transform);
        Self {
            dependency_modules: self.dependency_modules.clone(),
            dependency_tokens: self.dependency_tokens.clone(),
            resolve: Arc::new(
                move |deps| -> BoxFuture<std::result::Result<Properties, BoxError>> {
                    let pending = inner(deps);
                    let transform = Arc::clone(&transform);
                    Box::pin(async move { transform(pending.await?) })
                },
            ),
        }
    }
}

impl fmt::Debug for DeferredArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredArgument")
            .field("dependency_modules", &self.dependency_modules)
            .field("dependency_tokens", &self.dependency_tokens)
            .finish_non_exhaustive()
    }
}

/// The argument of one composed-factory invocation.
#[derive(Debug, Clone)]
pub enum RuntimeArgument {
    /// A ready property object.
    Immediate(Properties),
    /// A deferred computation of the property object.
    Deferred(DeferredArgument),
}

impl RuntimeArgument {
    /// An immediate argument with no properties.
    #[must_use]
    pub fn empty() -> Self {
        Self::Immediate(Properties::new())
    }

    /// Whether the argument is deferred.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Narrows the argument by label then prefix.
    ///
    /// Immediate arguments are extracted now; deferred ones get a resolver
    /// that extracts once the computation completes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfmodError::MissingLabel`] if the label is missing under
    /// the strict policy. For a deferred argument this call always
    /// succeeds: the failure surfaces only when the host runs the resolver,
    /// as a [`BoxError`] wrapping the same `MissingLabel` (recoverable with
    /// `downcast_ref::<ConfmodError>()`).
    pub fn scoped(
        &self,
        label: Option<&str>,
        prefix: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self> {
        match self {
            Self::Immediate(props) => Ok(Self::Immediate(extract_with(props, label, prefix, config)?)),
            Self::Deferred(deferred) => {
                let label = label.map(str::to_owned);
                let prefix = prefix.map(str::to_owned);
                let config = *config;
                Ok(Self::Deferred(deferred.map(move |props| {
                    Ok(extract_with(&props, label.as_deref(), prefix.as_deref(), &config)?)
                })))
            }
        }
    }

    /// Wraps the argument object as the single value of `label`.
    #[must_use]
    pub fn nested_under(&self, label: &str) -> Self {
        let nest = |props: Properties| {
            let mut outer = Properties::new();
            let _ = outer.insert(label.to_owned(), Value::Object(props));
            outer
        };
        match self {
            Self::Immediate(props) => Self::Immediate(nest(props.clone())),
            Self::Deferred(deferred) => {
                let label = label.to_owned();
                Self::Deferred(deferred.map(move |props| {
                    let mut outer = Properties::new();
                    let _ = outer.insert(label.clone(), Value::Object(props));
                    Ok(outer)
                }))
            }
        }
    }

    /// Renders the argument for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Immediate(props) => {
                serde_json::to_string(props).unwrap_or_else(|_| "<unprintable>".to_string())
            }
            Self::Deferred(deferred) => {
                let tokens: Vec<&str> = deferred.dependency_tokens.iter().map(Token::as_str).collect();
                format!("deferred argument injecting [{}]", tokens.join(", "))
            }
        }
    }

    /// Kind name for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Immediate(_) => "immediate",
            Self::Deferred(_) => "deferred",
        }
    }
}

impl Default for RuntimeArgument {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Properties> for RuntimeArgument {
    fn from(props: Properties) -> Self {
        Self::Immediate(props)
    }
}

impl From<DeferredArgument> for RuntimeArgument {
    fn from(deferred: DeferredArgument) -> Self {
        Self::Deferred(deferred)
    }
}

impl TryFrom<Value> for RuntimeArgument {
    type Error = ConfmodError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(props) => Ok(Self::Immediate(props)),
            other => Err(ConfmodError::Config {
                message: format!("runtime argument must be a JSON object, got {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn non_object_value_is_rejected() {
        let err = RuntimeArgument::try_from(json!([1, 2])).expect_err("array");
        assert!(err.to_string().contains("JSON object"), "got: {err}");
    }

    #[test]
    fn immediate_scoping_extracts_now() {
        let arg = RuntimeArgument::from(props(json!({ "L": { "p_a": 1, "b": 2 } })));
        let scoped = arg
            .scoped(Some("L"), Some("p_"), &EngineConfig::default())
            .expect("scoped");
        let RuntimeArgument::Immediate(inner) = scoped else {
            panic!("immediate stays immediate");
        };
        assert_eq!(inner, props(json!({ "a": 1 })));
    }

    #[test]
    fn nested_under_wraps_object() {
        let arg = RuntimeArgument::from(props(json!({ "a": 1 })));
        let RuntimeArgument::Immediate(outer) = arg.nested_under("L") else {
            panic!("immediate stays immediate");
        };
        assert_eq!(outer, props(json!({ "L": { "a": 1 } })));
    }

    #[test]
    fn describe_immediate_is_json() {
        let arg = RuntimeArgument::from(props(json!({ "a": 1 })));
        assert_eq!(arg.describe(), r#"{"a":1}"#);
        assert_eq!(arg.kind(), "immediate");
    }

    #[test]
    fn describe_deferred_lists_tokens() {
        let arg = RuntimeArgument::from(
            DeferredArgument::from_fn(|_| Ok(Properties::new()))
                .with_dependency_tokens(vec![Token::new("Env")]),
        );
        assert_eq!(arg.describe(), "deferred argument injecting [Env]");
        assert!(arg.is_deferred());
    }

    #[tokio::test]
    async fn deferred_scoping_keeps_dependencies_and_extracts_later() {
        let deferred = DeferredArgument::new(|deps: Vec<Value>| async move {
            let mut out = Properties::new();
            let _ = out.insert("L".into(), json!({ "p_seen": deps.len() }));
            Ok::<_, BoxError>(out)
        })
        .with_dependency_tokens(vec![Token::new("A"), Token::new("B")]);
        let arg = RuntimeArgument::from(deferred);

        let RuntimeArgument::Deferred(scoped) = arg
            .scoped(Some("L"), Some("p_"), &EngineConfig::default())
            .expect("scoped")
        else {
            panic!("deferred stays deferred");
        };
        assert_eq!(scoped.dependency_tokens().len(), 2);
        let resolved = scoped
            .resolve(vec![json!(1), json!(2)])
            .await
            .expect("resolved");
        assert_eq!(resolved, props(json!({ "seen": 2 })));
    }

    #[tokio::test]
    async fn deferred_strict_scoping_fails_at_resolution() {
        let arg = RuntimeArgument::from(DeferredArgument::from_fn(|_| Ok(Properties::new())));
        let RuntimeArgument::Deferred(scoped) = arg
            .scoped(Some("missing"), None, &EngineConfig::strict())
            .expect("composition itself succeeds")
        else {
            panic!("deferred stays deferred");
        };
        let err = scoped.resolve(Vec::new()).await.expect_err("strict");
        assert!(err.to_string().contains("missing"), "got: {err}");
        assert!(matches!(
            err.downcast_ref::<ConfmodError>(),
            Some(ConfmodError::MissingLabel { label }) if label == "missing"
        ));
    }
}
