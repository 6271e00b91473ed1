// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # irlift
//!
//! A static program-analysis toolkit for low-level instruction streams. `irlift`
//! models a linear sequence of opaque instructions as two interrelated graphs —
//! a **control flow graph** partitioned into basic blocks and a **data flow
//! graph** capturing stack- and variable-level dependencies — and fuses them
//! into a control flow graph of **AST statements in SSA form**, suitable as
//! input for decompilation, symbolic execution, or further transformation.
//!
//! # Architecture
//!
//! The library is organized into layered modules; dependencies flow upward:
//!
//! - **Graph substrate** ([`graph`]): identity and adjacency primitives shared
//!   by both graph models
//! - **Control flow** ([`cfg`]): basic blocks, typed control edges, nested
//!   regions including exception handlers
//! - **Data flow** ([`dfg`]): stack and variable use-def dependencies, external
//!   data sources, a derived dependants index
//! - **ISA boundary** ([`arch`]): the narrow per-instruction query interface
//!   the toolkit consumes, plus a decorator adapting it to lifted statements
//! - **AST lifting** ([`ast`]): the SSA rewriting stage fusing the two graphs
//!
//! Instruction decoding and the initial construction of the two graphs are the
//! caller's responsibility; `irlift` starts where completed graphs exist.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use irlift::ast::AstLifter;
//! use irlift::cfg::{BasicBlock, ControlEdgeKind, ControlFlowGraph};
//! use irlift::dfg::{DataFlowGraph, StackSource};
//!
//! // Build the graphs (normally done by a decoder frontend).
//! let mut cfg = ControlFlowGraph::new();
//! cfg.add_node(BasicBlock::new(0, instructions))?;
//! cfg.set_entrypoint(0)?;
//!
//! let mut dfg = DataFlowGraph::new();
//! dfg.add_instruction_node(0)?;
//!
//! // Lift into SSA statements.
//! let lifted = AstLifter::lift(&cfg, &dfg, &isa)?;
//! for block in lifted.nodes() {
//!     for statement in block.instructions() {
//!         println!("{statement}");
//!     }
//! }
//! ```
//!
//! # Guarantees
//!
//! - **Topology preservation**: the lifted graph has the same node offsets,
//!   edge triples, region tree, and entrypoint as the input
//! - **SSA form**: every versioned variable has exactly one defining statement;
//!   merges are explicit φ statements with canonical, memoized slots
//! - **Determinism**: identical inputs produce structurally identical output
//! - **No partial output**: lifting either completes or fails with an
//!   [`Error`] naming the offending offset
//!
//! # Thread Safety
//!
//! The graphs are plain owned data: safe to send between threads and to share
//! immutably. A lifter owns all its working state, so independent lifting runs
//! on disjoint inputs may proceed in parallel without any coordination.

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// Generic graph substrate: identity and adjacency primitives.
///
/// See [`graph::GraphNode`], [`graph::SubGraph`], and [`graph::DirectedGraph`].
pub mod graph;

/// Control flow graph model: basic blocks, typed edges, and regions.
///
/// See [`cfg::ControlFlowGraph`] for the main entry point.
pub mod cfg;

/// Data flow graph model: stack and variable use-def dependencies.
///
/// See [`dfg::DataFlowGraph`] for the main entry point.
pub mod dfg;

/// Instruction set architecture boundary.
///
/// See [`arch::Architecture`] for the query interface and
/// [`arch::AstArchitecture`] for the statement-level decorator.
pub mod arch;

/// AST model and the SSA lifting stage.
///
/// See [`ast::AstLifter`] for the lifting entry point.
pub mod ast;

/// `irlift` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is
/// always [`crate::Error`]. This is used consistently throughout the crate for
/// all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `irlift` Error type.
///
/// The main error type for all operations in this crate, covering input
/// consistency, structural invariants, region kinds, and ISA contract
/// breaches.
pub use error::Error;
