//! Data flow graph (DFG) model.
//!
//! This module provides the data flow side of the analysis toolkit: nodes
//! corresponding 1:1 to instructions, typed dependencies over stack slots and
//! named variables, external data sources for values entering from outside the
//! analyzed code, and a derived dependants index for O(degree) reverse lookup.
//!
//! # Architecture
//!
//! Forward dependencies stored on each node are the authoritative data. The
//! [`DataFlowGraph`] maintains the reverse index in lockstep through its
//! mutators; the two views drifting apart is a bug, never an expected state.
//! There are no owning back-pointers anywhere in the model.
//!
//! # Key Components
//!
//! - [`DataFlowGraph`] - The graph, owning nodes and the dependants index
//! - [`DataFlowNode`] / [`InstructionNode`] / [`ExternalDataSource`] - Node kinds
//! - [`StackDependencies`] / [`StackSource`] - Positional stack-slot use-def edges
//! - [`VariableDependencies`] - Named variable use-def edges

mod deps;
mod graph;
mod node;

pub use deps::{StackDependencies, StackSource, VariableDependencies};
pub use graph::DataFlowGraph;
pub use node::{DataFlowNode, ExternalDataSource, InstructionNode};
