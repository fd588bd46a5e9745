//! Descriptor tree inspection using `petgraph`.
//!
//! Identities are advisory: the engine never checks them. A
//! [`ModuleGraph`] flattens a resolved descriptor into a directed graph so
//! callers can derive an initialization order and spot identities reused
//! by structurally different modules.

use std::collections::BTreeMap;

use confmod_common::error::{ConfmodError, Result};
use confmod_common::types::Token;
use confmod_compose::{Export, ModuleDescriptor, ProviderSpec};
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;

#[derive(Debug)]
struct ModuleNode {
    identity: String,
    structure: Value,
}

/// Import graph of one resolved descriptor.
///
/// Every occurrence of a descriptor in the tree is its own node. Edges
/// point from an import to its importer, so a topological sort yields
/// imports first. Dependency modules of deferred providers count as
/// imports.
#[derive(Debug)]
pub struct ModuleGraph {
    graph: DiGraph<ModuleNode, ()>,
    root: NodeIndex,
    exported: Vec<Token>,
}

impl ModuleGraph {
    /// Builds the graph rooted at `root`.
    #[must_use]
    pub fn from_descriptor(root: &ModuleDescriptor) -> Self {
        let mut graph = DiGraph::new();
        let index = add_module(&mut graph, root);
        let mut exported = Vec::new();
        collect_exports(root, &mut exported);
        tracing::debug!(
            root = %root.identity,
            modules = graph.node_count(),
            exported = exported.len(),
            "built module graph"
        );
        Self {
            graph,
            root: index,
            exported,
        }
    }

    /// Number of module occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph is empty. Never true for a built graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Identity of the root module.
    #[must_use]
    pub fn root_identity(&self) -> &str {
        &self.graph[self.root].identity
    }

    /// Identities in initialization order: every import before its
    /// importer, the root last.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn init_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx))
                .map(|node| node.identity.clone())
                .collect()),
            Err(_cycle) => Err(ConfmodError::Config {
                message: "cyclic import detected in module graph".into(),
            }),
        }
    }

    /// Tokens the root makes available to its importers, following
    /// re-exported modules transitively.
    #[must_use]
    pub fn exported_tokens(&self) -> &[Token] {
        &self.exported
    }

    /// Identities shared by structurally different modules, sorted.
    #[must_use]
    pub fn identity_collisions(&self) -> Vec<String> {
        let mut seen: BTreeMap<&str, Vec<&Value>> = BTreeMap::new();
        for node in self.graph.node_weights() {
            seen.entry(node.identity.as_str())
                .or_default()
                .push(&node.structure);
        }
        let collisions: Vec<String> = seen
            .into_iter()
            .filter(|(_, structures)| structures.iter().any(|s| *s != structures[0]))
            .map(|(identity, _)| identity.to_owned())
            .collect();
        if !collisions.is_empty() {
            tracing::warn!(count = collisions.len(), "module identities reused by different modules");
        }
        collisions
    }
}

fn add_module(graph: &mut DiGraph<ModuleNode, ()>, module: &ModuleDescriptor) -> NodeIndex {
    let index = graph.add_node(ModuleNode {
        identity: module.identity.clone(),
        structure: module.structure(),
    });
    let deferred_dependencies = module.providers.iter().flat_map(|provider| match provider {
        ProviderSpec::Deferred {
            dependency_modules, ..
        } => dependency_modules.as_slice(),
        _ => [].as_slice(),
    });
    for import in module.imports.iter().chain(deferred_dependencies) {
        let child = add_module(graph, import);
        let _ = graph.add_edge(child, index, ());
    }
    index
}

fn collect_exports(module: &ModuleDescriptor, out: &mut Vec<Token>) {
    for export in &module.exports {
        match export {
            Export::Token(token) => out.push(token.clone()),
            Export::Provider(provider) => out.push(provider.token().clone()),
            Export::Module(inner) => collect_exports(inner, out),
        }
    }
}
