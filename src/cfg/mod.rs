//! Control flow graph (CFG) model.
//!
//! This module provides the control flow side of the analysis toolkit: basic
//! blocks keyed by instruction offset, typed control edges with per-kind
//! multiplicity rules, an entrypoint designation, and hierarchical regions
//! including exception handlers.
//!
//! # Architecture
//!
//! The CFG builds on the [`crate::graph`] substrate: nodes are identified by
//! `i64` offsets, and the graph implements the shared [`crate::graph::DirectedGraph`]
//! capability surface. Structural invariants (one node per offset, edge
//! multiplicity, one immediate region per node, entrypoint membership) are
//! enforced at mutation time.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The graph itself, owning blocks, edges, and regions
//! - [`BasicBlock`] - An offset-keyed straight-line instruction sequence
//! - [`ControlEdge`] / [`ControlEdgeKind`] - Typed edges (fall-through,
//!   unconditional, conditional, abnormal)
//! - [`Region`], [`BasicRegion`], [`ExceptionHandlerRegion`], [`RegionId`] -
//!   The hierarchical region model
//!
//! # Examples
//!
//! ```rust
//! use irlift::cfg::{BasicBlock, ControlEdgeKind, ControlFlowGraph};
//!
//! # fn main() -> irlift::Result<()> {
//! let mut cfg = ControlFlowGraph::new();
//! cfg.add_node(BasicBlock::new(0, vec!["br 8"]))?;
//! cfg.add_node(BasicBlock::new(8, vec!["ret"]))?;
//! cfg.connect(0, 8, ControlEdgeKind::Unconditional)?;
//! cfg.set_entrypoint(0)?;
//!
//! let handlers = cfg.add_exception_handler_region(None)?;
//! let protected = cfg.protected_region(handlers)?;
//! cfg.move_node_to_region(0, protected)?;
//! # Ok(())
//! # }
//! ```

mod block;
mod edge;
mod graph;
mod region;

pub use block::BasicBlock;
pub use edge::{ControlEdge, ControlEdgeKind};
pub use graph::ControlFlowGraph;
pub use region::{BasicRegion, ExceptionHandlerRegion, Region, RegionId};
