//! Architecture decorator for lifted statements.

use crate::{
    arch::Architecture,
    ast::{Expression, Statement},
};

/// Adapts an [`Architecture`] over instructions to one over lifted
/// [`Statement`]s.
///
/// Composition, not extension: the decorator wraps a borrowed inner
/// architecture and answers queries by delegating to it for statements that
/// carry a real instruction. Statements whose effects are synthetic — φ
/// statements, and the variable expressions inside any statement — report zero
/// stack effects and no variable effects, because their writes exist only in
/// the lifted form.
///
/// A statement's offset is its synthetic id, which the lifter keeps disjoint
/// from all real instruction offsets.
///
/// # Examples
///
/// ```rust,ignore
/// let lifted = AstLifter::lift(&cfg, &dfg, &isa)?;
/// let ast_isa = AstArchitecture::new(&isa);
/// for block in lifted.nodes() {
///     for statement in block.instructions() {
///         let pushes = ast_isa.stack_push_count(statement);
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AstArchitecture<'a, A> {
    inner: &'a A,
}

impl<'a, A> AstArchitecture<'a, A> {
    /// Creates a decorator over the given architecture.
    #[must_use]
    pub const fn new(inner: &'a A) -> Self {
        Self { inner }
    }

    /// Returns the wrapped architecture.
    #[must_use]
    pub const fn inner(&self) -> &A {
        self.inner
    }
}

impl<A: Architecture> AstArchitecture<'_, A> {
    /// Returns the real instruction a statement carries, if any.
    fn lifted_instruction<'s>(
        &self,
        statement: &'s Statement<A::Instruction>,
    ) -> Option<&'s A::Instruction> {
        match statement.expression()? {
            Expression::Instruction { instruction, .. } => Some(instruction),
            Expression::Variable { .. } => None,
        }
    }
}

impl<A: Architecture> Architecture for AstArchitecture<'_, A> {
    type Instruction = Statement<A::Instruction>;
    type Variable = A::Variable;

    fn offset(&self, statement: &Self::Instruction) -> i64 {
        statement.id()
    }

    fn stack_push_count(&self, statement: &Self::Instruction) -> usize {
        self.lifted_instruction(statement)
            .map_or(0, |instruction| self.inner.stack_push_count(instruction))
    }

    fn stack_pop_count(&self, statement: &Self::Instruction) -> usize {
        self.lifted_instruction(statement)
            .map_or(0, |instruction| self.inner.stack_pop_count(instruction))
    }

    fn written_variables(&self, statement: &Self::Instruction) -> Vec<Self::Variable> {
        self.lifted_instruction(statement)
            .map_or_else(Vec::new, |instruction| {
                self.inner.written_variables(instruction)
            })
    }

    fn read_variables(&self, statement: &Self::Instruction) -> Vec<Self::Variable> {
        self.lifted_instruction(statement)
            .map_or_else(Vec::new, |instruction| self.inner.read_variables(instruction))
    }
}
