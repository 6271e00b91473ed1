//! Generic graph substrate.
//!
//! This module provides the identity and adjacency primitives shared by the
//! [`crate::cfg`] and [`crate::dfg`] models. It intentionally contains no
//! algorithms beyond adjacency traversal: the graph models build their own
//! semantics (typed control edges, typed dependencies, regions) on top of
//! these capabilities.
//!
//! # Key Components
//!
//! - [`GraphNode`] - Identity of a node (a stable `i64` offset or synthetic id)
//! - [`SubGraph`] - Any view enumerating a subset of nodes
//! - [`DirectedGraph`] - Node resolution plus successor/predecessor traversal

mod traits;

pub use traits::{DirectedGraph, GraphNode, SubGraph};
