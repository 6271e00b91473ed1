//! Node types for the data flow graph.

use crate::{
    arch::SourceVariable,
    dfg::{StackDependencies, VariableDependencies},
    graph::GraphNode,
};

/// A node corresponding 1:1 to an instruction in the analyzed stream.
///
/// Keyed by the instruction's offset. Owns the forward dependency collections;
/// the reverse dependants index lives on the owning
/// [`DataFlowGraph`](crate::dfg::DataFlowGraph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionNode<V> {
    offset: i64,
    stack: StackDependencies,
    variables: VariableDependencies<V>,
}

impl<V: SourceVariable> InstructionNode<V> {
    pub(crate) fn new(offset: i64) -> Self {
        Self {
            offset,
            stack: StackDependencies::new(),
            variables: VariableDependencies::new(),
        }
    }

    /// Returns the instruction offset identifying this node.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Returns the stack dependencies of this instruction.
    #[must_use]
    pub const fn stack_dependencies(&self) -> &StackDependencies {
        &self.stack
    }

    /// Returns the variable dependencies of this instruction.
    #[must_use]
    pub const fn variable_dependencies(&self) -> &VariableDependencies<V> {
        &self.variables
    }

    pub(crate) fn stack_dependencies_mut(&mut self) -> &mut StackDependencies {
        &mut self.stack
    }

    pub(crate) fn variable_dependencies_mut(&mut self) -> &mut VariableDependencies<V> {
        &mut self.variables
    }

    /// Iterates the offsets of every node this instruction depends on.
    pub fn producers(&self) -> impl Iterator<Item = i64> + '_ {
        self.stack
            .sources()
            .map(|source| source.producer())
            .chain(self.variables.producers())
    }
}

/// A distinguished node representing a value entering from outside the
/// analyzed code, such as a parameter or an initial local.
///
/// External sources carry a human-readable name and never have dependencies of
/// their own. By convention producers assign them synthetic negative offsets so
/// they cannot collide with instruction offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDataSource {
    offset: i64,
    name: String,
}

impl ExternalDataSource {
    pub(crate) fn new(offset: i64, name: String) -> Self {
        Self { offset, name }
    }

    /// Returns the synthetic offset identifying this source.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Returns the human-readable name of this source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A node of the data flow graph.
///
/// Either an instruction node with dependency collections, or an external data
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFlowNode<V> {
    /// A node corresponding to an instruction in the analyzed stream.
    Instruction(InstructionNode<V>),
    /// A value entering from outside the analyzed code.
    External(ExternalDataSource),
}

impl<V: SourceVariable> DataFlowNode<V> {
    /// Returns the offset identifying this node.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        match self {
            Self::Instruction(node) => node.offset(),
            Self::External(node) => node.offset(),
        }
    }

    /// Returns `true` if this node is an external data source.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }

    /// Returns the name of this node, if it is an external data source.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::External(node) => Some(node.name()),
            Self::Instruction(_) => None,
        }
    }

    /// Returns the instruction node, if this is one.
    #[must_use]
    pub const fn as_instruction(&self) -> Option<&InstructionNode<V>> {
        match self {
            Self::Instruction(node) => Some(node),
            Self::External(_) => None,
        }
    }

    /// Returns the external data source, if this is one.
    #[must_use]
    pub const fn as_external(&self) -> Option<&ExternalDataSource> {
        match self {
            Self::External(node) => Some(node),
            Self::Instruction(_) => None,
        }
    }

    pub(crate) fn as_instruction_mut(&mut self) -> Option<&mut InstructionNode<V>> {
        match self {
            Self::Instruction(node) => Some(node),
            Self::External(_) => None,
        }
    }
}

impl<V: SourceVariable> GraphNode for DataFlowNode<V> {
    fn id(&self) -> i64 {
        self.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    struct Var(&'static str);

    impl SourceVariable for Var {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_instruction_node() {
        let node: InstructionNode<Var> = InstructionNode::new(0x10);
        assert_eq!(node.offset(), 0x10);
        assert!(node.stack_dependencies().is_empty());
        assert!(node.variable_dependencies().is_empty());
        assert_eq!(node.producers().count(), 0);
    }

    #[test]
    fn test_external_source() {
        let node = ExternalDataSource::new(-1, "arg0".to_string());
        assert_eq!(node.offset(), -1);
        assert_eq!(node.name(), "arg0");
    }

    #[test]
    fn test_node_variants() {
        let instruction: DataFlowNode<Var> = DataFlowNode::Instruction(InstructionNode::new(4));
        assert!(!instruction.is_external());
        assert_eq!(instruction.name(), None);
        assert_eq!(instruction.id(), 4);

        let external: DataFlowNode<Var> =
            DataFlowNode::External(ExternalDataSource::new(-2, "this".to_string()));
        assert!(external.is_external());
        assert_eq!(external.name(), Some("this"));
        assert_eq!(external.id(), -2);
    }
}
