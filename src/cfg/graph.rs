//! Control flow graph implementation.
//!
//! This module provides the main [`ControlFlowGraph`] structure owning basic
//! blocks, typed control edges, the entrypoint designation, and the region
//! arena. All structural invariants are enforced at mutation time so that a
//! graph handed to the AST lifter is well-formed by construction.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::{
    cfg::{
        BasicBlock, BasicRegion, ControlEdge, ControlEdgeKind, ExceptionHandlerRegion, Region,
        RegionId,
    },
    graph::{DirectedGraph, SubGraph},
    Error, Result,
};

/// Escapes a string for inclusion in a DOT label.
fn escape_dot(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '<' | '>' | '{' | '}' | '|' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A control flow graph over basic blocks of instructions of type `I`.
///
/// Nodes are [`BasicBlock`]s keyed by the offset of their first instruction;
/// the offset is the node's identity within the graph. Edges are typed
/// [`ControlEdge`]s owned by their origin node, with a derived predecessor
/// index maintained in lockstep. Regions group nodes hierarchically and are
/// stored in an arena addressed by [`RegionId`].
///
/// # Invariants
///
/// - Every edge's endpoints are nodes of this graph
/// - A node has at most one fall-through and at most one unconditional successor
/// - Redundant identical edges are rejected
/// - Every node belongs to at most one immediate region
/// - The entrypoint, once set, is a member of the graph
///
/// # Examples
///
/// ```rust
/// use irlift::cfg::{BasicBlock, ControlEdgeKind, ControlFlowGraph};
///
/// # fn main() -> irlift::Result<()> {
/// let mut cfg = ControlFlowGraph::new();
/// cfg.add_node(BasicBlock::new(0x00, vec!["nop"]))?;
/// cfg.add_node(BasicBlock::new(0x10, vec!["ret"]))?;
/// cfg.connect(0x00, 0x10, ControlEdgeKind::FallThrough)?;
/// cfg.set_entrypoint(0x00)?;
///
/// assert_eq!(cfg.successors(0x00), vec![0x10]);
/// assert_eq!(cfg.entrypoint(), Some(0x00));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph<I> {
    /// Basic blocks keyed by offset, enumerated in ascending order.
    nodes: BTreeMap<i64, BasicBlock<I>>,
    /// Outgoing edges per node.
    out_edges: BTreeMap<i64, Vec<ControlEdge>>,
    /// Derived incoming-edge index, kept in lockstep with `out_edges`.
    in_edges: BTreeMap<i64, Vec<ControlEdge>>,
    /// The designated entry node, if any.
    entrypoint: Option<i64>,
    /// Region arena; ids index into this vector and are never reused.
    regions: Vec<Region>,
    /// Regions that are not nested inside any other region.
    roots: Vec<RegionId>,
    /// The immediate region of each node that belongs to one.
    node_regions: BTreeMap<i64, RegionId>,
}

impl<I> Default for ControlFlowGraph<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> ControlFlowGraph<I> {
    /// Creates a new empty control flow graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            in_edges: BTreeMap::new(),
            entrypoint: None,
            regions: Vec::new(),
            roots: Vec::new(),
            node_regions: BTreeMap::new(),
        }
    }

    /// Inserts a node owned by this graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if a node with the same offset
    /// already exists.
    pub fn add_node(&mut self, node: BasicBlock<I>) -> Result<()> {
        let offset = node.offset();
        if self.nodes.contains_key(&offset) {
            return Err(Error::InvariantViolation {
                message: "a node with this offset already exists".to_string(),
                offset,
            });
        }
        self.nodes.insert(offset, node);
        Ok(())
    }

    /// Resolves a node by offset.
    #[must_use]
    pub fn node(&self, offset: i64) -> Option<&BasicBlock<I>> {
        self.nodes.get(&offset)
    }

    /// Resolves a node by offset, mutably.
    pub fn node_mut(&mut self, offset: i64) -> Option<&mut BasicBlock<I>> {
        self.nodes.get_mut(&offset)
    }

    /// Returns all nodes in ascending offset order.
    pub fn nodes(&self) -> impl Iterator<Item = &BasicBlock<I>> {
        self.nodes.values()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a typed edge from `origin` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if either endpoint is not a node of
    /// this graph, and [`Error::InvariantViolation`] if the edge would be a
    /// redundant duplicate or a second fall-through/unconditional successor.
    pub fn connect(&mut self, origin: i64, target: i64, kind: ControlEdgeKind) -> Result<()> {
        if !self.nodes.contains_key(&origin) {
            return Err(Error::InconsistentInput {
                message: "edge origin is not a node of this graph".to_string(),
                offset: origin,
            });
        }
        if !self.nodes.contains_key(&target) {
            return Err(Error::InconsistentInput {
                message: "edge target is not a node of this graph".to_string(),
                offset: target,
            });
        }

        if let Some(outgoing) = self.out_edges.get(&origin) {
            for existing in outgoing {
                if existing.target() == target && existing.kind() == kind {
                    return Err(Error::InvariantViolation {
                        message: format!("redundant {kind} edge to {target}"),
                        offset: origin,
                    });
                }
                if kind.is_unique_per_node() && existing.kind() == kind {
                    return Err(Error::InvariantViolation {
                        message: format!("node already has a {kind} successor"),
                        offset: origin,
                    });
                }
            }
        }

        let edge = ControlEdge::new(origin, target, kind);
        self.out_edges.entry(origin).or_default().push(edge);
        self.in_edges.entry(target).or_default().push(edge);
        Ok(())
    }

    /// Enumerates all edges by lazily flattening the per-node outgoing lists.
    pub fn edges(&self) -> impl Iterator<Item = &ControlEdge> {
        self.out_edges.values().flatten()
    }

    /// Returns the outgoing edges of a node.
    #[must_use]
    pub fn outgoing_edges(&self, offset: i64) -> &[ControlEdge] {
        self.out_edges.get(&offset).map_or(&[], Vec::as_slice)
    }

    /// Returns the incoming edges of a node.
    #[must_use]
    pub fn incoming_edges(&self, offset: i64) -> &[ControlEdge] {
        self.in_edges.get(&offset).map_or(&[], Vec::as_slice)
    }

    /// Returns the offsets of all successors of a node.
    #[must_use]
    pub fn successors(&self, offset: i64) -> Vec<i64> {
        self.outgoing_edges(offset)
            .iter()
            .map(ControlEdge::target)
            .collect()
    }

    /// Returns the offsets of all predecessors of a node.
    #[must_use]
    pub fn predecessors(&self, offset: i64) -> Vec<i64> {
        self.incoming_edges(offset)
            .iter()
            .map(ControlEdge::origin)
            .collect()
    }

    /// Designates the entry node of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if no node with the given offset
    /// exists.
    pub fn set_entrypoint(&mut self, offset: i64) -> Result<()> {
        if !self.nodes.contains_key(&offset) {
            return Err(Error::InvariantViolation {
                message: "entrypoint is not a node of this graph".to_string(),
                offset,
            });
        }
        self.entrypoint = Some(offset);
        Ok(())
    }

    /// Returns the offset of the entry node, if one has been designated.
    #[must_use]
    pub const fn entrypoint(&self) -> Option<i64> {
        self.entrypoint
    }

    fn push_region(&mut self, region: Region, parent: Option<RegionId>) -> Result<RegionId> {
        let id = RegionId::new(self.regions.len());
        self.regions.push(region);
        match parent {
            Some(parent_id) => self.basic_region_mut(parent_id)?.push_child(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Adds a new empty basic region.
    ///
    /// When `parent` is given the region is nested inside it; otherwise it
    /// becomes a root region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRegionKind`] if `parent` does not resolve to
    /// a basic region.
    pub fn add_basic_region(&mut self, parent: Option<RegionId>) -> Result<RegionId> {
        self.push_region(Region::Basic(BasicRegion::new()), parent)
    }

    /// Adds a new exception handler region along with its protected region.
    ///
    /// The protected region is created empty and is identity-held by the new
    /// exception handler region; use [`protected_region`](Self::protected_region)
    /// to retrieve its id and [`add_handler_region`](Self::add_handler_region)
    /// to append handlers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRegionKind`] if `parent` does not resolve to
    /// a basic region.
    pub fn add_exception_handler_region(&mut self, parent: Option<RegionId>) -> Result<RegionId> {
        let protected = RegionId::new(self.regions.len());
        self.regions.push(Region::Basic(BasicRegion::new()));
        self.push_region(
            Region::ExceptionHandler(ExceptionHandlerRegion::new(protected)),
            parent,
        )
    }

    /// Appends a new handler region to an exception handler region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRegionKind`] if `owner` does not resolve to
    /// an exception handler region.
    pub fn add_handler_region(&mut self, owner: RegionId) -> Result<RegionId> {
        if !matches!(self.regions.get(owner.index()), Some(Region::ExceptionHandler(_))) {
            return Err(Error::UnsupportedRegionKind {
                region: owner.index(),
            });
        }
        let handler = RegionId::new(self.regions.len());
        self.regions.push(Region::Basic(BasicRegion::new()));
        if let Some(region) = self
            .regions
            .get_mut(owner.index())
            .and_then(Region::as_exception_handler_mut)
        {
            region.push_handler(handler);
        }
        Ok(handler)
    }

    /// Returns the id of the protected region of an exception handler region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRegionKind`] if `owner` does not resolve to
    /// an exception handler region.
    pub fn protected_region(&self, owner: RegionId) -> Result<RegionId> {
        match self.regions.get(owner.index()) {
            Some(Region::ExceptionHandler(region)) => Ok(region.protected()),
            _ => Err(Error::UnsupportedRegionKind {
                region: owner.index(),
            }),
        }
    }

    /// Resolves a region by id.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    /// Enumerates all regions with their ids.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(index, region)| (RegionId::new(index), region))
    }

    /// Returns the regions not nested inside any other region.
    #[must_use]
    pub fn root_regions(&self) -> &[RegionId] {
        &self.roots
    }

    /// Returns the number of regions in the arena.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Returns the immediate region of a node, if it belongs to one.
    #[must_use]
    pub fn region_of(&self, offset: i64) -> Option<RegionId> {
        self.node_regions.get(&offset).copied()
    }

    fn basic_region_mut(&mut self, id: RegionId) -> Result<&mut BasicRegion> {
        self.regions
            .get_mut(id.index())
            .and_then(Region::as_basic_mut)
            .ok_or(Error::UnsupportedRegionKind { region: id.index() })
    }

    /// Moves a node into a region.
    ///
    /// The node leaves its current region (if any) and enters the target in one
    /// step, preserving the "one immediate region per node" invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if the node is not part of this
    /// graph, and [`Error::UnsupportedRegionKind`] if the target does not
    /// resolve to a basic region. Exception handler regions hold no nodes
    /// directly; move nodes into their protected or handler member regions.
    pub fn move_node_to_region(&mut self, offset: i64, region: RegionId) -> Result<()> {
        if !self.nodes.contains_key(&offset) {
            return Err(Error::InconsistentInput {
                message: "cannot move unknown node into a region".to_string(),
                offset,
            });
        }
        // Check the target before detaching from the current region so a bad
        // target leaves the membership untouched.
        if self
            .regions
            .get(region.index())
            .and_then(Region::as_basic)
            .is_none()
        {
            return Err(Error::UnsupportedRegionKind {
                region: region.index(),
            });
        }

        if let Some(current) = self.node_regions.remove(&offset) {
            if let Ok(basic) = self.basic_region_mut(current) {
                basic.remove_node(offset);
            }
        }
        self.basic_region_mut(region)?.insert_node(offset);
        self.node_regions.insert(offset, region);
        Ok(())
    }

    /// Checks the structural invariants of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if no entrypoint is designated or
    /// the membership indices drifted, and [`Error::InconsistentInput`] if an
    /// edge endpoint or a region member is not a node of this graph.
    pub fn validate(&self) -> Result<()> {
        match self.entrypoint {
            Some(entry) if self.nodes.contains_key(&entry) => {}
            Some(entry) => {
                return Err(Error::InvariantViolation {
                    message: "entrypoint is not a node of this graph".to_string(),
                    offset: entry,
                })
            }
            None => {
                return Err(Error::InvariantViolation {
                    message: "no entrypoint designated".to_string(),
                    offset: 0,
                })
            }
        }

        for edge in self.edges() {
            for endpoint in [edge.origin(), edge.target()] {
                if !self.nodes.contains_key(&endpoint) {
                    return Err(Error::InconsistentInput {
                        message: "edge endpoint is not a node of this graph".to_string(),
                        offset: endpoint,
                    });
                }
            }
        }

        for (id, region) in self.regions() {
            if let Region::Basic(basic) = region {
                for &member in basic.nodes() {
                    if !self.nodes.contains_key(&member) {
                        return Err(Error::InconsistentInput {
                            message: format!("region {id} references an unknown node"),
                            offset: member,
                        });
                    }
                    if self.node_regions.get(&member) != Some(&id) {
                        return Err(Error::InvariantViolation {
                            message: "node region membership index drifted".to_string(),
                            offset: member,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl<I: fmt::Display> ControlFlowGraph<I> {
    /// Renders the graph in Graphviz DOT format.
    ///
    /// Basic regions become nested clusters; exception handler regions render
    /// their protected and handler regions as sibling clusters. This is a
    /// debugging view, not a serialization format.
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph cfg {{");
        let _ = writeln!(dot, "    node [shape=box, fontname=\"monospace\"];");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"{}\";", escape_dot(name));
        }

        for &root in &self.roots {
            self.write_region_cluster(&mut dot, root, 1);
        }
        for (&offset, block) in &self.nodes {
            if !self.node_regions.contains_key(&offset) {
                self.write_node(&mut dot, offset, block, 1);
            }
        }
        for edge in self.edges() {
            let style = match edge.kind() {
                ControlEdgeKind::FallThrough => "style=dashed",
                ControlEdgeKind::Unconditional => "style=solid",
                ControlEdgeKind::Conditional => "style=solid, color=blue",
                ControlEdgeKind::Abnormal => "style=dotted, color=red",
            };
            let _ = writeln!(
                dot,
                "    \"b{}\" -> \"b{}\" [{}];",
                edge.origin(),
                edge.target(),
                style
            );
        }
        let _ = writeln!(dot, "}}");
        dot
    }

    fn write_node(&self, dot: &mut String, offset: i64, block: &BasicBlock<I>, depth: usize) {
        let indent = "    ".repeat(depth);
        let mut label = format!("{offset}:");
        for instruction in block.instructions() {
            let _ = write!(label, "\\l  {}", escape_dot(&instruction.to_string()));
        }
        label.push_str("\\l");
        let _ = writeln!(dot, "{indent}\"b{offset}\" [label=\"{label}\"];");
    }

    fn write_region_cluster(&self, dot: &mut String, id: RegionId, depth: usize) {
        let indent = "    ".repeat(depth);
        match self.region(id) {
            Some(Region::Basic(basic)) => {
                let _ = writeln!(dot, "{indent}subgraph cluster_{id} {{");
                let _ = writeln!(dot, "{indent}    label=\"{id}\";");
                for &member in basic.nodes() {
                    if let Some(block) = self.node(member) {
                        self.write_node(dot, member, block, depth + 1);
                    }
                }
                for &child in basic.children() {
                    self.write_region_cluster(dot, child, depth + 1);
                }
                let _ = writeln!(dot, "{indent}}}");
            }
            Some(Region::ExceptionHandler(handler)) => {
                let _ = writeln!(dot, "{indent}subgraph cluster_{id} {{");
                let _ = writeln!(dot, "{indent}    label=\"{id} (exception handler)\";");
                self.write_region_cluster(dot, handler.protected(), depth + 1);
                for &h in handler.handlers() {
                    self.write_region_cluster(dot, h, depth + 1);
                }
                let _ = writeln!(dot, "{indent}}}");
            }
            None => {}
        }
    }
}

impl<I> SubGraph for ControlFlowGraph<I> {
    fn node_ids(&self) -> Vec<i64> {
        self.nodes.keys().copied().collect()
    }

    fn contains_node(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }
}

impl<I> DirectedGraph for ControlFlowGraph<I> {
    type Node = BasicBlock<I>;

    fn node(&self, id: i64) -> Option<&Self::Node> {
        self.nodes.get(&id)
    }

    fn successors(&self, id: i64) -> Vec<i64> {
        ControlFlowGraph::successors(self, id)
    }

    fn predecessors(&self, id: i64) -> Vec<i64> {
        ControlFlowGraph::predecessors(self, id)
    }
}
