//! # confmod-sdk
//!
//! Higher-level helpers on top of `confmod-compose`.
//!
//! Provides three main entry points:
//! - [`ConfigSchema`](schema::ConfigSchema): typed configuration classes backed by serde.
//! - [`ModuleBuilder`](builder::ModuleBuilder): fluent API for assembling composed modules.
//! - [`ModuleGraph`](graph::ModuleGraph): initialization order and identity checks for resolved descriptors.
//!
//! # Example
//!
//! ```rust,no_run
//! use confmod_compose::RuntimeArgument;
//! use confmod_sdk::builder::ModuleBuilder;
//! use confmod_sdk::schema::ConfigSchema;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct CacheConfig {
//!     ttl_seconds: u64,
//! }
//!
//! impl ConfigSchema for CacheConfig {
//!     const NAME: &'static str = "CacheConfig";
//! }
//!
//! # fn main() -> confmod_common::error::Result<()> {
//! let factory = ModuleBuilder::new()
//!     .named("Cache")
//!     .schema::<CacheConfig>()
//!     .build()?;
//! let module = factory.resolve(&RuntimeArgument::empty())?;
//! assert_eq!(module.identity, "CacheConfigurableModule");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod graph;
pub mod schema;

pub use builder::ModuleBuilder;
pub use graph::ModuleGraph;
pub use schema::{ConfigSchema, class_unit, config_class, instance_of};
