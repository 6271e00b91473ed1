//! Control flow edge types for the CFG.
//!
//! This module defines the edge representations used in the control flow graph,
//! providing semantic information about how control flows between basic blocks.

use std::fmt;

/// The kind of control flow represented by an edge.
///
/// This enum classifies edges by their control flow semantics. The graph model
/// enforces multiplicity rules per kind: a node has at most one fall-through and
/// at most one unconditional successor, while conditional and abnormal edges may
/// be multiple.
///
/// # Examples
///
/// ```rust
/// use irlift::cfg::ControlEdgeKind;
///
/// let kind = ControlEdgeKind::Conditional;
/// assert!(kind.is_conditional());
/// assert!(!kind.is_unique_per_node());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEdgeKind {
    /// Implicit flow into the next block when the current block does not branch.
    FallThrough,

    /// A direct, always-taken jump to the target block.
    Unconditional,

    /// A branch taken only when a condition holds.
    ///
    /// Multi-way branches (switch tables) are represented as several conditional
    /// edges out of the same node.
    Conditional,

    /// Flow that bypasses normal sequencing, such as the transfer into an
    /// exception handler.
    Abnormal,
}

impl ControlEdgeKind {
    /// Returns `true` if this is a fall-through edge.
    #[must_use]
    pub const fn is_fall_through(&self) -> bool {
        matches!(self, Self::FallThrough)
    }

    /// Returns `true` if this is an unconditional jump edge.
    #[must_use]
    pub const fn is_unconditional(&self) -> bool {
        matches!(self, Self::Unconditional)
    }

    /// Returns `true` if this is a conditional branch edge.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::Conditional)
    }

    /// Returns `true` if this is an abnormal (exceptional) flow edge.
    #[must_use]
    pub const fn is_abnormal(&self) -> bool {
        matches!(self, Self::Abnormal)
    }

    /// Returns `true` if at most one outgoing edge of this kind may exist per node.
    #[must_use]
    pub const fn is_unique_per_node(&self) -> bool {
        matches!(self, Self::FallThrough | Self::Unconditional)
    }
}

impl fmt::Display for ControlEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FallThrough => write!(f, "fallthrough"),
            Self::Unconditional => write!(f, "unconditional"),
            Self::Conditional => write!(f, "conditional"),
            Self::Abnormal => write!(f, "abnormal"),
        }
    }
}

/// An edge in the control flow graph.
///
/// Each edge is an ordered pair of node offsets with a typed label. Edges are
/// owned by their origin node inside the graph; the pair `(origin, target, kind)`
/// identifies an edge uniquely, and redundant identical edges are rejected by
/// [`ControlFlowGraph::connect`](crate::cfg::ControlFlowGraph::connect).
///
/// # Examples
///
/// ```rust
/// use irlift::cfg::{ControlEdge, ControlEdgeKind};
///
/// let edge = ControlEdge::new(0x00, 0x10, ControlEdgeKind::Unconditional);
/// assert_eq!(edge.origin(), 0x00);
/// assert_eq!(edge.target(), 0x10);
/// assert!(edge.kind().is_unconditional());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlEdge {
    /// The offset of the block this edge leaves.
    origin: i64,
    /// The offset of the block this edge enters.
    target: i64,
    /// The kind of control flow this edge represents.
    kind: ControlEdgeKind,
}

impl ControlEdge {
    /// Creates a new control flow edge.
    ///
    /// # Arguments
    ///
    /// * `origin` - The offset of the originating block
    /// * `target` - The offset of the target block
    /// * `kind` - The kind of control flow
    #[must_use]
    pub const fn new(origin: i64, target: i64, kind: ControlEdgeKind) -> Self {
        Self {
            origin,
            target,
            kind,
        }
    }

    /// Returns the offset of the originating block.
    #[must_use]
    pub const fn origin(&self) -> i64 {
        self.origin
    }

    /// Returns the offset of the target block.
    #[must_use]
    pub const fn target(&self) -> i64 {
        self.target
    }

    /// Returns the kind of control flow this edge represents.
    #[must_use]
    pub const fn kind(&self) -> ControlEdgeKind {
        self.kind
    }
}

impl fmt::Display for ControlEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} [{}]", self.origin, self.target, self.kind)
    }
}
