//! # irlift Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the irlift library. Import this module to get quick access
//! to the essential types for building graphs and lifting them into SSA form.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all irlift operations
pub use crate::Error;

/// The result type used throughout irlift
pub use crate::Result;

// ================================================================================================
// Graph Substrate
// ================================================================================================

/// Shared graph capability traits
pub use crate::graph::{DirectedGraph, GraphNode, SubGraph};

// ================================================================================================
// Control Flow
// ================================================================================================

/// Control flow graph and its building blocks
pub use crate::cfg::{
    BasicBlock, BasicRegion, ControlEdge, ControlEdgeKind, ControlFlowGraph,
    ExceptionHandlerRegion, Region, RegionId,
};

// ================================================================================================
// Data Flow
// ================================================================================================

/// Data flow graph and its dependency collections
pub use crate::dfg::{
    DataFlowGraph, DataFlowNode, ExternalDataSource, InstructionNode, StackDependencies,
    StackSource, VariableDependencies,
};

// ================================================================================================
// ISA Boundary
// ================================================================================================

/// The instruction set architecture interface and its statement decorator
pub use crate::arch::{Architecture, AstArchitecture, SourceVariable};

// ================================================================================================
// AST and Lifting
// ================================================================================================

/// The lifter and the lifted statement model
pub use crate::ast::{AstLifter, AstVariable, Expression, Statement};
