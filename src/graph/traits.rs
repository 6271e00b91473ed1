//! Capability traits shared by all graph models.
//!
//! Both the control flow graph and the data flow graph expose the same minimal
//! surface: nodes identified by a signed 64-bit offset, node lookup by id, and
//! adjacency enumeration. The traits here capture that surface so analyses can
//! be written once against either graph.
//!
//! Identity is always by id, never by reference. Two nodes with the same id in
//! the same graph cannot exist; a node's id is stable for its entire lifetime.

/// A node with a stable 64-bit identity.
///
/// Identifiers are offsets in the analyzed instruction stream for real nodes, and
/// synthetic negative values for nodes that do not correspond to any instruction
/// (external data sources, lifted statements).
pub trait GraphNode {
    /// Returns the stable identifier of this node.
    fn id(&self) -> i64;
}

/// Any view that enumerates a subset of a graph's nodes.
///
/// Implemented by the graphs themselves (the full node set) and by regions
/// (the nodes contained in one grouping).
pub trait SubGraph {
    /// Returns the ids of all nodes in this view, in deterministic order.
    fn node_ids(&self) -> Vec<i64>;

    /// Returns `true` if the view contains a node with the given id.
    fn contains_node(&self, id: i64) -> bool {
        self.node_ids().contains(&id)
    }
}

/// A directed graph over offset-identified nodes.
///
/// Extends [`SubGraph`] with node resolution and adjacency traversal. Edge
/// payloads are graph-specific (typed control edges, typed data dependencies)
/// and are exposed by the concrete graph types; this trait only covers the
/// shape shared by all of them.
pub trait DirectedGraph: SubGraph {
    /// The node type stored in this graph.
    type Node: GraphNode;

    /// Resolves a node by id.
    fn node(&self, id: i64) -> Option<&Self::Node>;

    /// Returns the ids of all nodes this node has outgoing edges to.
    fn successors(&self, id: i64) -> Vec<i64>;

    /// Returns the ids of all nodes with an edge into this node.
    fn predecessors(&self, id: i64) -> Vec<i64>;
}
