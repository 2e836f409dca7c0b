//! Resolution graph built from declared dependencies using `petgraph`.
//!
//! Every layer of a binding is a node: the base implementation (or factory
//! or instance) and one node per decorator. Edges point from consumer to
//! dependency:
//!
//! - a decorator has an `Inner` edge to the next-inner layer of its chain;
//! - every layer has a `Requires` edge per declared dependency, targeting the
//!   dependency's outermost layer.
//!
//! Required dependencies with no binding point to an `Unresolved` node.
//! Optional dependencies with no binding produce no edge.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::descriptors::LayerKind;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Layer, Registry};

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Implementation,
    Factory,
    Instance,
    /// Decorator layer; position 0 wraps the base.
    Decorator { position: usize },
    /// A required contract with no binding.
    Unresolved,
}

/// One layer of a binding, or a missing contract.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub contract: Key,
    pub implementation: &'static str,
    pub kind: NodeKind,
    /// `None` for unresolved contracts.
    pub lifetime: Option<Lifetime>,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contract = self.contract.short_name();
        match (self.kind, self.lifetime) {
            (NodeKind::Unresolved, _) => write!(f, "{contract} (unresolved)"),
            (NodeKind::Decorator { position }, _) => {
                write!(f, "{contract} decorator #{position}")
            }
            (_, Some(lifetime)) => write!(f, "{contract} ({lifetime})"),
            (_, None) => f.write_str(contract),
        }
    }
}

/// Relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEdge {
    /// Declared dependency.
    Requires { optional: bool },
    /// Decorator to the layer it wraps.
    Inner,
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphEdge::Requires { optional: false } => f.write_str("requires"),
            GraphEdge::Requires { optional: true } => f.write_str("optional"),
            GraphEdge::Inner => f.write_str("wraps"),
        }
    }
}

/// Directed resolution graph of a container.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{key_of, Container, Injectable};
/// use std::sync::Arc;
///
/// struct Config;
/// impl Injectable for Config {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Config
///     }
/// }
///
/// struct Service;
/// impl Injectable for Service {
///     type Deps = (Arc<Config>,);
///     fn inject(_: Self::Deps) -> Self {
///         Service
///     }
/// }
///
/// let mut container = Container::new();
/// container.transient_self::<Service>().singleton_self::<Config>();
///
/// let graph = container.dependency_graph();
/// let order = graph.construction_order().unwrap();
/// assert_eq!(order, vec![key_of::<Config>(), key_of::<Service>()]);
/// assert!(graph.to_dot().starts_with("digraph"));
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    // Outermost layer per contract, registration order.
    entries: Vec<(Key, NodeIndex)>,
    outermost: HashMap<Key, NodeIndex>,
}

impl DependencyGraph {
    pub(crate) fn build(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut chains: Vec<(Vec<NodeIndex>, Vec<&Layer>)> = Vec::with_capacity(registry.len());
        let mut outermost = HashMap::with_capacity(registry.len());
        let mut entries = Vec::with_capacity(registry.len());

        // Nodes first, so edges can target contracts registered later.
        for binding in registry.iter() {
            let mut nodes = Vec::new();
            let mut layers = Vec::new();
            for (position, layer) in binding.layers().enumerate() {
                let kind = match layer.kind {
                    LayerKind::Implementation => NodeKind::Implementation,
                    LayerKind::Factory => NodeKind::Factory,
                    LayerKind::Instance => NodeKind::Instance,
                    LayerKind::Decorator => NodeKind::Decorator { position: position - 1 },
                };
                nodes.push(graph.add_node(GraphNode {
                    contract: binding.contract,
                    implementation: layer.name,
                    kind,
                    lifetime: Some(binding.lifetime),
                }));
                layers.push(layer);
            }
            if let Some(&last) = nodes.last() {
                outermost.insert(binding.contract, last);
                entries.push((binding.contract, last));
            }
            chains.push((nodes, layers));
        }

        let mut unresolved: HashMap<Key, NodeIndex> = HashMap::new();
        for (nodes, layers) in &chains {
            for (i, (&node, layer)) in nodes.iter().zip(layers).enumerate() {
                if i > 0 {
                    graph.add_edge(node, nodes[i - 1], GraphEdge::Inner);
                }
                for dep in &layer.dependencies {
                    let target = match outermost.get(&dep.key) {
                        Some(&target) => target,
                        None if dep.optional => continue,
                        None => *unresolved.entry(dep.key).or_insert_with(|| {
                            graph.add_node(GraphNode {
                                contract: dep.key,
                                implementation: dep.key.display_name(),
                                kind: NodeKind::Unresolved,
                                lifetime: None,
                            })
                        }),
                    };
                    graph.add_edge(node, target, GraphEdge::Requires { optional: dep.optional });
                }
            }
        }

        Self {
            graph,
            entries,
            outermost,
        }
    }

    /// The underlying `petgraph` graph.
    pub fn inner(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every node, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Outermost layer of `contract`, if it is registered.
    pub fn entry(&self, contract: &Key) -> Option<&GraphNode> {
        self.outermost.get(contract).map(|&index| &self.graph[index])
    }

    /// Contracts required by any layer of `contract`, in chain and declared
    /// order, without repeats. Unresolved contracts are included.
    pub fn dependencies_of(&self, contract: &Key) -> Vec<Key> {
        let mut out = Vec::new();
        let Some(&start) = self.outermost.get(contract) else {
            return out;
        };

        let mut layer = Some(start);
        let mut chain = Vec::new();
        while let Some(node) = layer {
            chain.push(node);
            layer = self
                .ordered_edges(node)
                .into_iter()
                .find(|(_, edge)| *edge == GraphEdge::Inner)
                .map(|(target, _)| target);
        }

        for node in chain.into_iter().rev() {
            for (target, edge) in self.ordered_edges(node) {
                let key = self.graph[target].contract;
                if matches!(edge, GraphEdge::Requires { .. }) && !out.contains(&key) {
                    out.push(key);
                }
            }
        }
        out
    }

    /// First cycle found by a depth-first walk from each contract in
    /// registration order, as contract names without repeating the first.
    pub fn find_cycle(&self) -> Option<Vec<&'static str>> {
        let mut state = vec![Visit::New; self.graph.node_count()];
        let mut stack = Vec::new();

        for &(_, entry) in &self.entries {
            if state[entry.index()] == Visit::New {
                if let Some(cycle) = self.dfs(entry, &mut state, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs(&self, node: NodeIndex, state: &mut [Visit], stack: &mut Vec<NodeIndex>) -> Option<Vec<&'static str>> {
        state[node.index()] = Visit::OnStack;
        stack.push(node);

        for (target, _) in self.ordered_edges(node) {
            match state[target.index()] {
                Visit::OnStack => {
                    let start = stack.iter().position(|&n| n == target).unwrap_or(0);
                    return Some(self.cycle_names(&stack[start..]));
                }
                Visit::New => {
                    if let Some(cycle) = self.dfs(target, state, stack) {
                        return Some(cycle);
                    }
                }
                Visit::Done => {}
            }
        }

        stack.pop();
        state[node.index()] = Visit::Done;
        None
    }

    // Layers of one contract collapse into a single name.
    fn cycle_names(&self, nodes: &[NodeIndex]) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let name = self.graph[node].contract.display_name();
            if names.last() != Some(&name) {
                names.push(name);
            }
        }
        if names.len() > 1 && names.first() == names.last() {
            names.pop();
        }
        names
    }

    /// Outgoing edges in insertion order, which is declared order.
    fn ordered_edges(&self, node: NodeIndex) -> Vec<(NodeIndex, GraphEdge)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex, GraphEdge)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target(), *edge.weight()))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, target, edge)| (target, edge)).collect()
    }

    /// Registered contracts ordered so that every contract comes after the
    /// contracts it depends on.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::CircularDependency`] if the graph has a cycle.
    pub fn construction_order(&self) -> DiResult<Vec<Key>> {
        let sorted = toposort(&self.graph, None)
            .map_err(|_| DiError::CircularDependency(self.find_cycle().unwrap_or_default()))?;

        // Consumers come first in `sorted`; walk it backwards. A contract is
        // ready once its outermost layer is reached.
        Ok(sorted
            .into_iter()
            .rev()
            .filter(|index| {
                let node = &self.graph[*index];
                self.outermost.get(&node.contract) == Some(index)
            })
            .map(|index| self.graph[index].contract)
            .collect())
    }

    /// Graphviz DOT rendering. Optional edges are dashed, decorator links
    /// bold, unresolved contracts red.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph DependencyGraph {\n");
        out.push_str("  rankdir=TB;\n");
        out.push_str("  node [shape=ellipse];\n\n");

        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            let attrs = match node.kind {
                NodeKind::Unresolved => ", color=red, fontcolor=red",
                NodeKind::Decorator { .. } => ", shape=box",
                _ => "",
            };
            let _ = writeln!(out, "  n{} [label=\"{}\"{}];", index.index(), escape(&node.to_string()), attrs);
        }

        out.push('\n');
        for edge in self.graph.edge_references() {
            let style = match edge.weight() {
                GraphEdge::Requires { optional: true } => " [style=dashed]",
                GraphEdge::Inner => " [style=bold]",
                GraphEdge::Requires { optional: false } => "",
            };
            let _ = writeln!(out, "  n{} -> n{}{};", edge.source().index(), edge.target().index(), style);
        }

        out.push_str("}\n");
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
