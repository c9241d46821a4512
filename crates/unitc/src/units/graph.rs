//! Conversion graph and the precomputed pairwise factor table
//!
//! Nodes are units, edges point from parent to child and carry the factor
//! that turns a parent magnitude into a child magnitude. The table is filled
//! by one breadth-first traversal per node, walking edges in both
//! directions: forward multiplies by the edge factor, backward divides by it.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction as EdgeDirection;
use tracing::debug;

use super::description::Direction;
use crate::common::{Span, UnitsError, UnitsResult};

/// Relative tolerance used when two paths reach the same unit
pub const CYCLE_TOLERANCE: f64 = 1e-9;

/// A declared conversion, normalized so that
/// `child value = parent value × factor`
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEdge {
    pub child: String,
    pub parent: String,
    pub factor: f64,
}

impl ConversionEdge {
    pub fn new(
        child: impl Into<String>,
        parent: impl Into<String>,
        raw_factor: f64,
        direction: Direction,
        span: Span,
    ) -> UnitsResult<Self> {
        if !raw_factor.is_finite() || raw_factor <= 0.0 {
            return Err(UnitsError::InvalidFactor {
                factor: raw_factor,
                span,
            });
        }
        let factor = match direction {
            Direction::ChildToParent => 1.0 / raw_factor,
            Direction::ParentToChild => raw_factor,
        };
        Ok(Self {
            child: child.into(),
            parent: parent.into(),
            factor,
        })
    }
}

/// Undirected-in-spirit weighted graph over unit names
#[derive(Debug, Default)]
pub struct ConversionGraph {
    graph: DiGraph<String, f64>,
    nodes: HashMap<String, NodeIndex>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, edge: &ConversionEdge, span: Span) -> UnitsResult<()> {
        let parent = *self
            .nodes
            .get(&edge.parent)
            .ok_or_else(|| UnitsError::unknown_unit(&edge.parent, span))?;
        let child = *self
            .nodes
            .get(&edge.child)
            .ok_or_else(|| UnitsError::unknown_unit(&edge.child, span))?;
        self.graph.add_edge(parent, child, edge.factor);
        Ok(())
    }

    pub fn unit_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }

    /// Compute `factor(u, v)` for every ordered pair in every component.
    ///
    /// Fails if two paths between the same pair disagree.
    pub fn build_table(&self) -> UnitsResult<ConversionTable> {
        let mut factors = HashMap::new();

        for start in self.graph.node_indices() {
            for (target, factor) in self.traverse_from(start)? {
                factors.insert((start, target), factor);
            }
        }

        debug!(
            units = self.unit_count(),
            edges = self.edge_count(),
            components = self.component_count(),
            pairs = factors.len(),
            "conversion table built"
        );

        Ok(ConversionTable {
            index: self.nodes.clone(),
            factors,
        })
    }

    fn traverse_from(&self, start: NodeIndex) -> UnitsResult<HashMap<NodeIndex, f64>> {
        let mut reached = HashMap::new();
        let mut queue = VecDeque::new();
        reached.insert(start, 1.0);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            let here = reached[&node];

            let forward = self
                .graph
                .edges_directed(node, EdgeDirection::Outgoing)
                .map(|e| (e.target(), here * e.weight()));
            let backward = self
                .graph
                .edges_directed(node, EdgeDirection::Incoming)
                .map(|e| (e.source(), here / e.weight()));

            for (next, factor) in forward.chain(backward) {
                match reached.get(&next) {
                    Some(&known) => {
                        if !approx_eq(known, factor) {
                            return Err(UnitsError::InconsistentCycle {
                                from: self.graph[start].clone(),
                                to: self.graph[next].clone(),
                                expected: known,
                                found: factor,
                            });
                        }
                    }
                    None => {
                        reached.insert(next, factor);
                        queue.push_back(next);
                    }
                }
            }
        }

        Ok(reached)
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= CYCLE_TOLERANCE * a.abs().max(b.abs())
}

/// Read-only map from ordered unit pair to conversion factor
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    index: HashMap<String, NodeIndex>,
    factors: HashMap<(NodeIndex, NodeIndex), f64>,
}

impl ConversionTable {
    /// Multiplier turning a magnitude in `from` into a magnitude in `to`
    pub fn factor(&self, from: &str, to: &str) -> Option<f64> {
        let from = self.index.get(from)?;
        let to = self.index.get(to)?;
        self.factors.get(&(*from, *to)).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// All units connected to `unit`, including itself
    pub fn connected(&self, unit: &str) -> Vec<(&str, f64)> {
        let Some(&from) = self.index.get(unit) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, f64)> = self
            .index
            .iter()
            .filter_map(|(name, to)| {
                self.factors
                    .get(&(from, *to))
                    .map(|&f| (name.as_str(), f))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }
}
