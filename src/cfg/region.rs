//! Hierarchical region model for the control flow graph.
//!
//! Regions group basic blocks into nested structures, most importantly the
//! protected/handler split of exception handling. Regions are stored in an
//! arena owned by the [`ControlFlowGraph`](crate::cfg::ControlFlowGraph) and
//! referenced by [`RegionId`]; node membership is tracked on the graph so the
//! "at most one immediate region per node" invariant has a single owner.
//!
//! Two variants exist:
//!
//! - [`BasicRegion`] - a set of member nodes plus nested child regions
//! - [`ExceptionHandlerRegion`] - one protected region and an ordered list of
//!   handler regions; the protected region's identity is stable for the
//!   lifetime of its owner

use std::collections::BTreeSet;
use std::fmt;

use crate::graph::SubGraph;

/// A strongly-typed identifier for regions within a control flow graph.
///
/// `RegionId` wraps a `usize` index into the graph's region arena. Region IDs
/// are assigned sequentially starting from 0 when regions are added and are
/// never reused.
///
/// # Examples
///
/// ```rust
/// use irlift::cfg::RegionId;
///
/// let region = RegionId::new(2);
/// assert_eq!(region.index(), 2);
/// assert_eq!(format!("{region}"), "r2");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub(crate) usize);

impl RegionId {
    /// Creates a new `RegionId` from a raw index value.
    ///
    /// Normal usage should obtain `RegionId` values from the region-creating
    /// operations on [`ControlFlowGraph`](crate::cfg::ControlFlowGraph).
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        RegionId(index)
    }

    /// Returns the raw index value of this region identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A region grouping a set of nodes with nested child regions.
///
/// Member nodes are stored as a sorted set of offsets, giving deterministic
/// enumeration. Child regions are ordered by insertion. Mutation happens
/// through the owning graph's [`move_node_to_region`](crate::cfg::ControlFlowGraph::move_node_to_region)
/// so that the node-to-region index stays consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicRegion {
    /// Offsets of the nodes directly contained in this region.
    nodes: BTreeSet<i64>,
    /// Nested child regions, in insertion order.
    children: Vec<RegionId>,
}

impl BasicRegion {
    /// Creates a new empty region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the offsets of the nodes directly contained in this region.
    #[must_use]
    pub const fn nodes(&self) -> &BTreeSet<i64> {
        &self.nodes
    }

    /// Returns the nested child regions in insertion order.
    #[must_use]
    pub fn children(&self) -> &[RegionId] {
        &self.children
    }

    /// Returns the number of directly contained nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if this region directly contains no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn insert_node(&mut self, offset: i64) {
        self.nodes.insert(offset);
    }

    pub(crate) fn remove_node(&mut self, offset: i64) {
        self.nodes.remove(&offset);
    }

    pub(crate) fn push_child(&mut self, child: RegionId) {
        self.children.push(child);
    }
}

impl SubGraph for BasicRegion {
    fn node_ids(&self) -> Vec<i64> {
        self.nodes.iter().copied().collect()
    }

    fn contains_node(&self, id: i64) -> bool {
        self.nodes.contains(&id)
    }
}

/// A region modeling one protected range and its exception handlers.
///
/// The protected region is a [`BasicRegion`] whose identity is held by this
/// owner for its entire lifetime; transformations populate it in place rather
/// than replacing it. Handlers are an ordered list of [`BasicRegion`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandlerRegion {
    /// The region whose nodes are covered by the handlers.
    protected: RegionId,
    /// The handler regions, in declaration order.
    handlers: Vec<RegionId>,
}

impl ExceptionHandlerRegion {
    pub(crate) const fn new(protected: RegionId) -> Self {
        Self {
            protected,
            handlers: Vec::new(),
        }
    }

    /// Returns the id of the protected region.
    #[must_use]
    pub const fn protected(&self) -> RegionId {
        self.protected
    }

    /// Returns the handler regions in declaration order.
    #[must_use]
    pub fn handlers(&self) -> &[RegionId] {
        &self.handlers
    }

    pub(crate) fn push_handler(&mut self, handler: RegionId) {
        self.handlers.push(handler);
    }
}

/// A region of the control flow graph.
///
/// Exactly two variants exist; open extension is deliberately avoided so that
/// transformations can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// A plain grouping of nodes and nested regions.
    Basic(BasicRegion),
    /// A protected region with an ordered list of exception handlers.
    ExceptionHandler(ExceptionHandlerRegion),
}

impl Region {
    /// Returns `true` if this is a basic region.
    #[must_use]
    pub const fn is_basic(&self) -> bool {
        matches!(self, Self::Basic(_))
    }

    /// Returns `true` if this is an exception handler region.
    #[must_use]
    pub const fn is_exception_handler(&self) -> bool {
        matches!(self, Self::ExceptionHandler(_))
    }

    /// Returns the basic region, if this is one.
    #[must_use]
    pub const fn as_basic(&self) -> Option<&BasicRegion> {
        match self {
            Self::Basic(region) => Some(region),
            Self::ExceptionHandler(_) => None,
        }
    }

    /// Returns the exception handler region, if this is one.
    #[must_use]
    pub const fn as_exception_handler(&self) -> Option<&ExceptionHandlerRegion> {
        match self {
            Self::ExceptionHandler(region) => Some(region),
            Self::Basic(_) => None,
        }
    }

    pub(crate) fn as_basic_mut(&mut self) -> Option<&mut BasicRegion> {
        match self {
            Self::Basic(region) => Some(region),
            Self::ExceptionHandler(_) => None,
        }
    }

    pub(crate) fn as_exception_handler_mut(&mut self) -> Option<&mut ExceptionHandlerRegion> {
        match self {
            Self::ExceptionHandler(region) => Some(region),
            Self::Basic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_id() {
        let id = RegionId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(format!("{id}"), "r7");
        assert_eq!(format!("{id:?}"), "RegionId(7)");
    }

    #[test]
    fn test_region_id_ordering() {
        let mut ids = vec![RegionId::new(2), RegionId::new(0), RegionId::new(1)];
        ids.sort();
        assert_eq!(ids, vec![RegionId::new(0), RegionId::new(1), RegionId::new(2)]);
    }

    #[test]
    fn test_basic_region_membership() {
        let mut region = BasicRegion::new();
        assert!(region.is_empty());

        region.insert_node(0x10);
        region.insert_node(0x20);
        region.insert_node(0x10);
        assert_eq!(region.len(), 2);
        assert!(region.contains_node(0x10));
        assert!(!region.contains_node(0x30));

        region.remove_node(0x10);
        assert!(!region.contains_node(0x10));
        assert_eq!(region.node_ids(), vec![0x20]);
    }

    #[test]
    fn test_basic_region_children_order() {
        let mut region = BasicRegion::new();
        region.push_child(RegionId::new(3));
        region.push_child(RegionId::new(1));
        assert_eq!(region.children(), &[RegionId::new(3), RegionId::new(1)]);
    }

    #[test]
    fn test_exception_handler_region() {
        let mut region = ExceptionHandlerRegion::new(RegionId::new(0));
        assert_eq!(region.protected(), RegionId::new(0));
        assert!(region.handlers().is_empty());

        region.push_handler(RegionId::new(1));
        region.push_handler(RegionId::new(2));
        assert_eq!(region.handlers(), &[RegionId::new(1), RegionId::new(2)]);
    }

    #[test]
    fn test_region_variant_accessors() {
        let basic = Region::Basic(BasicRegion::new());
        assert!(basic.is_basic());
        assert!(basic.as_basic().is_some());
        assert!(basic.as_exception_handler().is_none());

        let handler = Region::ExceptionHandler(ExceptionHandlerRegion::new(RegionId::new(0)));
        assert!(handler.is_exception_handler());
        assert!(handler.as_exception_handler().is_some());
        assert!(handler.as_basic().is_none());
    }
}
