//! Data flow graph implementation.
//!
//! The forward dependency collections on each node are the authoritative data;
//! the graph maintains a reverse dependants index in lockstep so in-edges can
//! be enumerated in O(degree). Every mutation goes through the graph to keep
//! the two views consistent.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    arch::SourceVariable,
    dfg::{DataFlowNode, ExternalDataSource, InstructionNode, StackSource},
    graph::{DirectedGraph, SubGraph},
    Error, Result,
};

/// A data flow graph over use-def dependencies between instructions.
///
/// Nodes correspond 1:1 to instructions (keyed by offset) plus any number of
/// external data sources. Edges are typed dependencies: positional stack slot
/// consumption and named variable reads. The dependency direction runs from
/// consumer to producer; the derived dependants index yields the reverse.
///
/// # Examples
///
/// ```rust
/// use irlift::dfg::{DataFlowGraph, StackSource};
///
/// #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// struct Var(String);
/// impl irlift::arch::SourceVariable for Var {
///     fn name(&self) -> &str {
///         &self.0
///     }
/// }
///
/// # fn main() -> irlift::Result<()> {
/// let mut dfg: DataFlowGraph<Var> = DataFlowGraph::new();
/// dfg.add_instruction_node(0)?;
/// dfg.add_instruction_node(2)?;
/// dfg.add_stack_dependency(2, 0, StackSource::new(0, 0))?;
///
/// assert_eq!(dfg.dependants_of(0).collect::<Vec<_>>(), vec![2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DataFlowGraph<V> {
    /// Nodes keyed by offset, enumerated in ascending order.
    nodes: BTreeMap<i64, DataFlowNode<V>>,
    /// Derived reverse index: producer offset to the consumers that reference it.
    dependants: BTreeMap<i64, BTreeSet<i64>>,
}

impl<V: SourceVariable> Default for DataFlowGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SourceVariable> DataFlowGraph<V> {
    /// Creates a new empty data flow graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            dependants: BTreeMap::new(),
        }
    }

    /// Inserts an instruction node for the given offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if a node with the same offset
    /// already exists.
    pub fn add_instruction_node(&mut self, offset: i64) -> Result<()> {
        self.insert_node(offset, DataFlowNode::Instruction(InstructionNode::new(offset)))
    }

    /// Inserts an external data source with a human-readable name.
    ///
    /// By convention external sources use synthetic negative offsets so they
    /// never collide with instruction offsets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if a node with the same offset
    /// already exists.
    pub fn add_external_source(&mut self, offset: i64, name: impl Into<String>) -> Result<()> {
        self.insert_node(
            offset,
            DataFlowNode::External(ExternalDataSource::new(offset, name.into())),
        )
    }

    fn insert_node(&mut self, offset: i64, node: DataFlowNode<V>) -> Result<()> {
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
    pub fn node(&self, offset: i64) -> Option<&DataFlowNode<V>> {
        self.nodes.get(&offset)
    }

    /// Returns all nodes in ascending offset order.
    pub fn nodes(&self) -> impl Iterator<Item = &DataFlowNode<V>> {
        self.nodes.values()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn instruction_mut(&mut self, offset: i64) -> Result<&mut InstructionNode<V>> {
        match self.nodes.get_mut(&offset) {
            None => Err(Error::InconsistentInput {
                message: "dependency references a node that does not exist".to_string(),
                offset,
            }),
            Some(node) => node.as_instruction_mut().ok_or(Error::InvariantViolation {
                message: "external data sources have no dependencies".to_string(),
                offset,
            }),
        }
    }

    fn check_producer(&self, producer: i64) -> Result<()> {
        if self.nodes.contains_key(&producer) {
            Ok(())
        } else {
            Err(Error::InconsistentInput {
                message: "dependency references a producer that does not exist".to_string(),
                offset: producer,
            })
        }
    }

    /// Records that `consumer` consumes stack slot `slot_index` from `source`.
    ///
    /// Adding the same source twice is a no-op. The dependants index of the
    /// producer is updated in the same step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if either endpoint does not exist,
    /// and [`Error::InvariantViolation`] if `consumer` is an external source.
    pub fn add_stack_dependency(
        &mut self,
        consumer: i64,
        slot_index: usize,
        source: StackSource,
    ) -> Result<()> {
        self.check_producer(source.producer())?;
        let node = self.instruction_mut(consumer)?;
        node.stack_dependencies_mut()
            .ensure_slot(slot_index)
            .insert(source);
        self.dependants
            .entry(source.producer())
            .or_default()
            .insert(consumer);
        Ok(())
    }

    /// Records that `consumer` reads `variable` as possibly produced by `producer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if either endpoint does not exist,
    /// and [`Error::InvariantViolation`] if `consumer` is an external source.
    pub fn add_variable_dependency(
        &mut self,
        consumer: i64,
        variable: V,
        producer: i64,
    ) -> Result<()> {
        self.check_producer(producer)?;
        let node = self.instruction_mut(consumer)?;
        node.variable_dependencies_mut()
            .ensure_entry(variable)
            .insert(producer);
        self.dependants.entry(producer).or_default().insert(consumer);
        Ok(())
    }

    /// Removes one stack dependency entry.
    ///
    /// The producer leaves the dependants index only when `consumer` no longer
    /// references it through any dependency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if `consumer` does not exist, and
    /// [`Error::InvariantViolation`] if it is an external source.
    pub fn remove_stack_dependency(
        &mut self,
        consumer: i64,
        slot_index: usize,
        source: StackSource,
    ) -> Result<()> {
        let node = self.instruction_mut(consumer)?;
        if let Some(slot) = node.stack_dependencies_mut().slot_mut(slot_index) {
            slot.remove(&source);
        }
        self.unlink_if_unreferenced(consumer, source.producer());
        Ok(())
    }

    /// Removes one variable dependency entry, dropping the variable's entry
    /// when its producer set becomes empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if `consumer` does not exist, and
    /// [`Error::InvariantViolation`] if it is an external source.
    pub fn remove_variable_dependency(
        &mut self,
        consumer: i64,
        variable: &V,
        producer: i64,
    ) -> Result<()> {
        let node = self.instruction_mut(consumer)?;
        let mut now_empty = false;
        if let Some(producers) = node.variable_dependencies_mut().entry_mut(variable) {
            producers.remove(&producer);
            now_empty = producers.is_empty();
        }
        if now_empty {
            node.variable_dependencies_mut().remove_entry(variable);
        }
        self.unlink_if_unreferenced(consumer, producer);
        Ok(())
    }

    /// Isolates a node: clears its own dependencies and removes it from every
    /// dependant's dependency collections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] if the node does not exist.
    pub fn disconnect(&mut self, offset: i64) -> Result<()> {
        if !self.nodes.contains_key(&offset) {
            return Err(Error::InconsistentInput {
                message: "cannot disconnect a node that does not exist".to_string(),
                offset,
            });
        }

        // Drop this node's own dependencies first.
        if let Some(node) = self.nodes.get_mut(&offset).and_then(DataFlowNode::as_instruction_mut)
        {
            let producers: BTreeSet<i64> = node.producers().collect();
            node.stack_dependencies_mut().slots_mut().clear();
            node.variable_dependencies_mut().retain_producers(|_| false);
            for producer in producers {
                self.unlink_if_unreferenced(offset, producer);
            }
        }

        // Then remove it from everyone that depends on it.
        let consumers = self.dependants.remove(&offset).unwrap_or_default();
        for consumer in consumers {
            if let Some(node) = self
                .nodes
                .get_mut(&consumer)
                .and_then(DataFlowNode::as_instruction_mut)
            {
                for slot in node.stack_dependencies_mut().slots_mut() {
                    slot.retain(|source| source.producer() != offset);
                }
                node.variable_dependencies_mut()
                    .retain_producers(|producer| producer != offset);
            }
        }
        Ok(())
    }

    fn unlink_if_unreferenced(&mut self, consumer: i64, producer: i64) {
        let still_referenced = self
            .nodes
            .get(&consumer)
            .and_then(DataFlowNode::as_instruction)
            .is_some_and(|node| node.producers().any(|p| p == producer));
        if !still_referenced {
            if let Some(consumers) = self.dependants.get_mut(&producer) {
                consumers.remove(&consumer);
                if consumers.is_empty() {
                    self.dependants.remove(&producer);
                }
            }
        }
    }

    /// Iterates the consumers that depend on the given node, in ascending order.
    pub fn dependants_of(&self, offset: i64) -> impl Iterator<Item = i64> + '_ {
        self.dependants.get(&offset).into_iter().flatten().copied()
    }

    /// Returns `true` if any node depends on the given node.
    #[must_use]
    pub fn has_dependants(&self, offset: i64) -> bool {
        self.dependants
            .get(&offset)
            .is_some_and(|consumers| !consumers.is_empty())
    }

    /// Checks the bidirectional consistency between the forward dependency
    /// collections and the derived dependants index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] when a dependency references an
    /// unknown node, and [`Error::InvariantViolation`] when the two views
    /// drifted apart.
    pub fn validate(&self) -> Result<()> {
        for node in self.nodes.values() {
            let Some(instruction) = node.as_instruction() else {
                continue;
            };
            let consumer = instruction.offset();
            for producer in instruction.producers() {
                if !self.nodes.contains_key(&producer) {
                    return Err(Error::InconsistentInput {
                        message: "dependency references a producer that does not exist"
                            .to_string(),
                        offset: producer,
                    });
                }
                let linked = self
                    .dependants
                    .get(&producer)
                    .is_some_and(|consumers| consumers.contains(&consumer));
                if !linked {
                    return Err(Error::InvariantViolation {
                        message: "dependants index is missing a forward dependency".to_string(),
                        offset: producer,
                    });
                }
            }
        }

        for (&producer, consumers) in &self.dependants {
            for &consumer in consumers {
                let references = self
                    .nodes
                    .get(&consumer)
                    .and_then(DataFlowNode::as_instruction)
                    .is_some_and(|node| node.producers().any(|p| p == producer));
                if !references {
                    return Err(Error::InvariantViolation {
                        message: "dependants index contains a stale entry".to_string(),
                        offset: producer,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<V: SourceVariable> SubGraph for DataFlowGraph<V> {
    fn node_ids(&self) -> Vec<i64> {
        self.nodes.keys().copied().collect()
    }

    fn contains_node(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }
}

impl<V: SourceVariable> DirectedGraph for DataFlowGraph<V> {
    type Node = DataFlowNode<V>;

    fn node(&self, id: i64) -> Option<&Self::Node> {
        self.nodes.get(&id)
    }

    /// Successors of a node are the producers it depends on.
    fn successors(&self, id: i64) -> Vec<i64> {
        self.nodes
            .get(&id)
            .and_then(DataFlowNode::as_instruction)
            .map(|node| {
                let unique: BTreeSet<i64> = node.producers().collect();
                unique.into_iter().collect()
            })
            .unwrap_or_default()
    }

    /// Predecessors of a node are its dependants.
    fn predecessors(&self, id: i64) -> Vec<i64> {
        self.dependants_of(id).collect()
    }
}
