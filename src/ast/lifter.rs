//! The AST lifter: fuses a control flow graph and a data flow graph into a
//! control flow graph of SSA-form statements.
//!
//! # Algorithm Overview
//!
//! The lifter rewrites each basic block's instruction list into statements,
//! preserving the graph's topology and region structure untouched:
//!
//! 1. **Argument resolution** - each stack and variable dependency of an
//!    instruction is resolved to an AST variable; merge points (several
//!    producers converging on one consumption) synthesize φ statements
//!    prepended to the consuming block
//! 2. **Versioning** - every variable write allocates the next SSA version of
//!    that variable; every value push allocates a fresh stack slot
//! 3. **Statement emission** - instructions whose results are used become
//!    assignments; instructions with no writes and no dependants become bare
//!    expression statements
//! 4. **Cloning** - nodes, edges, regions, and the entrypoint are re-created
//!    in the output graph at the same offsets with the same structure
//!
//! Variable-merge φs are memoized on the canonical sorted set of
//! `(variable, version)` snapshots, so structurally identical merges share one
//! φ slot regardless of where they occur.
//!
//! The lifter owns all its state for the duration of a single
//! [`lift`](AstLifter::lift) call; independent lifters may run in parallel on
//! disjoint inputs.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::{
    arch::Architecture,
    ast::{AstVariable, Expression, Statement},
    cfg::{BasicBlock, ControlFlowGraph, Region, RegionId},
    dfg::{DataFlowGraph, DataFlowNode, StackSource},
    Error, Result,
};

/// Recreates the region tree of `cfg` inside `output`, returning the 1:1
/// correspondence between old and new region ids.
///
/// Exception handler regions keep their shape: the protected region created by
/// the output graph is populated in place (it is identity-held by its owner),
/// and handlers are appended in their original order.
fn transform_regions<I, S>(
    cfg: &ControlFlowGraph<I>,
    output: &mut ControlFlowGraph<S>,
) -> Result<FxHashMap<RegionId, RegionId>> {
    let mut mapping = FxHashMap::default();
    for &root in cfg.root_regions() {
        transform_region(cfg, root, None, output, &mut mapping)?;
    }
    Ok(mapping)
}

fn transform_region<I, S>(
    cfg: &ControlFlowGraph<I>,
    id: RegionId,
    parent: Option<RegionId>,
    output: &mut ControlFlowGraph<S>,
    mapping: &mut FxHashMap<RegionId, RegionId>,
) -> Result<()> {
    let region = cfg
        .region(id)
        .ok_or(Error::UnsupportedRegionKind { region: id.index() })?;
    match region {
        Region::Basic(basic) => {
            let new_id = output.add_basic_region(parent)?;
            mapping.insert(id, new_id);
            for &child in basic.children() {
                transform_region(cfg, child, Some(new_id), output, mapping)?;
            }
        }
        Region::ExceptionHandler(handler) => {
            let new_id = output.add_exception_handler_region(parent)?;
            mapping.insert(id, new_id);

            let new_protected = output.protected_region(new_id)?;
            mapping.insert(handler.protected(), new_protected);
            transform_basic_children(cfg, handler.protected(), new_protected, output, mapping)?;

            for &old_handler in handler.handlers() {
                let new_handler = output.add_handler_region(new_id)?;
                mapping.insert(old_handler, new_handler);
                transform_basic_children(cfg, old_handler, new_handler, output, mapping)?;
            }
        }
    }
    Ok(())
}

/// Recurses into the children of a basic member region of an exception
/// handler (the protected region or one handler).
fn transform_basic_children<I, S>(
    cfg: &ControlFlowGraph<I>,
    old: RegionId,
    new: RegionId,
    output: &mut ControlFlowGraph<S>,
    mapping: &mut FxHashMap<RegionId, RegionId>,
) -> Result<()> {
    let region = cfg
        .region(old)
        .ok_or(Error::UnsupportedRegionKind { region: old.index() })?;
    match region {
        Region::Basic(basic) => {
            for &child in basic.children() {
                transform_region(cfg, child, Some(new), output, mapping)?;
            }
            Ok(())
        }
        Region::ExceptionHandler(_) => Err(Error::UnsupportedRegionKind {
            region: old.index(),
        }),
    }
}

/// One-shot lifter turning a `ControlFlowGraph<I>` plus a matching
/// `DataFlowGraph<V>` into a `ControlFlowGraph<Statement<I>>`.
///
/// The output mirrors the input's node set, edge set, region tree, and
/// entrypoint; only the per-block content is rewritten. All state lives on the
/// lifter instance and is discarded after a single [`lift`](Self::lift) call.
///
/// # Examples
///
/// ```rust,ignore
/// let lifted = AstLifter::lift(&cfg, &dfg, &isa)?;
/// for block in lifted.nodes() {
///     for statement in block.instructions() {
///         println!("{statement}");
///     }
/// }
/// ```
pub struct AstLifter<'a, A: Architecture> {
    isa: &'a A,
    /// The slot variables each instruction pushes, keyed by instruction offset.
    stack_slots: FxHashMap<i64, Vec<AstVariable>>,
    /// Current SSA version counter per source variable.
    variable_versions: FxHashMap<A::Variable, u32>,
    /// The version each instruction assigned to each variable it wrote.
    written_versions: FxHashMap<(i64, A::Variable), u32>,
    /// Interned versioned AST variables.
    versioned_variables: FxHashMap<(A::Variable, u32), AstVariable>,
    /// φ results memoized by canonical sorted snapshot set.
    phi_slots: BTreeMap<Vec<(A::Variable, u32)>, AstVariable>,
    next_stack_slot: usize,
    next_phi_slot: usize,
    /// Descending id source for synthetic statements and expressions; starts
    /// below every real instruction offset so the id spaces never overlap.
    next_id: i64,
}

impl<'a, A> AstLifter<'a, A>
where
    A: Architecture,
    A::Instruction: Clone,
{
    /// Lifts the given control flow graph into SSA-form statements, using the
    /// data flow graph to resolve every value dependency.
    ///
    /// The data flow graph's instruction node offsets must correspond 1:1 to
    /// the instruction offsets of the control flow graph; external data
    /// sources are exempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentInput`] when the two graphs disagree,
    /// [`Error::InvariantViolation`] when the control flow graph has no
    /// entrypoint, and [`Error::IsaContract`] when the ISA's declared stack
    /// counts contradict the recorded dependencies. No partial output is ever
    /// produced.
    pub fn lift(
        cfg: &ControlFlowGraph<A::Instruction>,
        dfg: &DataFlowGraph<A::Variable>,
        isa: &'a A,
    ) -> Result<ControlFlowGraph<Statement<A::Instruction>>> {
        let minimum_offset = cfg
            .nodes()
            .flat_map(BasicBlock::instructions)
            .map(|instruction| isa.offset(instruction))
            .min()
            .unwrap_or(0);

        let mut lifter = Self {
            isa,
            stack_slots: FxHashMap::default(),
            variable_versions: FxHashMap::default(),
            written_versions: FxHashMap::default(),
            versioned_variables: FxHashMap::default(),
            phi_slots: BTreeMap::new(),
            next_stack_slot: 0,
            next_phi_slot: 0,
            next_id: minimum_offset.min(0) - 1,
        };
        lifter.run(cfg, dfg)
    }

    fn run(
        &mut self,
        cfg: &ControlFlowGraph<A::Instruction>,
        dfg: &DataFlowGraph<A::Variable>,
    ) -> Result<ControlFlowGraph<Statement<A::Instruction>>> {
        self.validate_inputs(cfg, dfg)?;

        // Rewrite block contents first; blocks are visited in ascending offset
        // order and instructions in block order.
        let mut lifted = Vec::with_capacity(cfg.node_count());
        for block in cfg.nodes() {
            lifted.push(self.lift_block(block, dfg)?);
        }

        let mut output = ControlFlowGraph::new();
        let regions = transform_regions(cfg, &mut output)?;

        for block in lifted {
            let offset = block.offset();
            output.add_node(block)?;
            if let Some(region) = cfg.region_of(offset) {
                let mapped = regions.get(&region).copied().ok_or(Error::InconsistentInput {
                    message: "node belongs to a region outside the region tree".to_string(),
                    offset,
                })?;
                output.move_node_to_region(offset, mapped)?;
            }
        }

        for edge in cfg.edges() {
            output.connect(edge.origin(), edge.target(), edge.kind())?;
        }

        if let Some(entry) = cfg.entrypoint() {
            output.set_entrypoint(entry)?;
        }
        Ok(output)
    }

    /// Checks that the data flow graph covers exactly the instructions of the
    /// control flow graph before any output is built.
    fn validate_inputs(
        &self,
        cfg: &ControlFlowGraph<A::Instruction>,
        dfg: &DataFlowGraph<A::Variable>,
    ) -> Result<()> {
        cfg.validate()?;
        dfg.validate()?;

        let mut instruction_offsets = BTreeSet::new();
        for block in cfg.nodes() {
            for instruction in block.instructions() {
                let offset = self.isa.offset(instruction);
                match dfg.node(offset) {
                    None => {
                        return Err(Error::InconsistentInput {
                            message: "no data flow node for instruction".to_string(),
                            offset,
                        })
                    }
                    Some(node) if node.is_external() => {
                        return Err(Error::InconsistentInput {
                            message: "instruction offset resolves to an external data source"
                                .to_string(),
                            offset,
                        })
                    }
                    Some(_) => {}
                }
                instruction_offsets.insert(offset);
            }
        }

        for node in dfg.nodes() {
            if !node.is_external() && !instruction_offsets.contains(&node.offset()) {
                return Err(Error::InconsistentInput {
                    message: "data flow node has no corresponding instruction".to_string(),
                    offset: node.offset(),
                });
            }
        }
        Ok(())
    }

    fn lift_block(
        &mut self,
        block: &BasicBlock<A::Instruction>,
        dfg: &DataFlowGraph<A::Variable>,
    ) -> Result<BasicBlock<Statement<A::Instruction>>> {
        let mut statements = Vec::with_capacity(block.len());
        // Synthesized φ statements accumulate at the front of the block;
        // the cursor tracks how many have been inserted so far.
        let mut phi_cursor = 0usize;

        for instruction in block.instructions() {
            let offset = self.isa.offset(instruction);
            let statement =
                self.lift_instruction(instruction, offset, dfg, &mut statements, &mut phi_cursor)?;
            statements.push(statement);
        }
        Ok(BasicBlock::new(block.offset(), statements))
    }

    fn lift_instruction(
        &mut self,
        instruction: &A::Instruction,
        offset: i64,
        dfg: &DataFlowGraph<A::Variable>,
        statements: &mut Vec<Statement<A::Instruction>>,
        phi_cursor: &mut usize,
    ) -> Result<Statement<A::Instruction>> {
        let node = dfg
            .node(offset)
            .and_then(DataFlowNode::as_instruction)
            .ok_or_else(|| Error::InconsistentInput {
                message: "no data flow node for instruction".to_string(),
                offset,
            })?;

        let pop_count = self.isa.stack_pop_count(instruction);
        if node.stack_dependencies().slot_count() != pop_count {
            return Err(Error::IsaContract {
                message: format!(
                    "declared pop count {} does not match {} recorded stack dependencies",
                    pop_count,
                    node.stack_dependencies().slot_count()
                ),
                offset,
            });
        }

        let mut arguments =
            Vec::with_capacity(node.stack_dependencies().slot_count() + node.variable_dependencies().len());

        for (index, sources) in node.stack_dependencies().iter().enumerate() {
            let variable =
                self.resolve_stack_argument(offset, index, sources, dfg, statements, phi_cursor)?;
            let expression = self.variable_expression(variable);
            arguments.push(expression);
        }

        for (variable, producers) in node.variable_dependencies().iter() {
            let resolved =
                self.resolve_variable_argument(variable, producers, dfg, statements, phi_cursor)?;
            let expression = self.variable_expression(resolved);
            arguments.push(expression);
        }

        let expression = Expression::Instruction {
            id: self.fresh_id(),
            offset,
            instruction: instruction.clone(),
            arguments,
        };

        let written = self.isa.written_variables(instruction);
        if written.is_empty() && !dfg.has_dependants(offset) {
            // The result, if any, is unused.
            return Ok(Statement::Expression {
                id: self.fresh_id(),
                expression,
            });
        }

        let push_count = self.isa.stack_push_count(instruction);
        let mut produced = Vec::with_capacity(push_count);
        for _ in 0..push_count {
            produced.push(self.fresh_stack_slot());
        }
        let mut targets = produced.clone();
        for variable in written {
            let version = self.bump_version(&variable);
            self.written_versions.insert((offset, variable.clone()), version);
            targets.push(self.versioned_variable(&variable, version));
        }
        self.stack_slots.insert(offset, produced);

        Ok(Statement::Assignment {
            id: self.fresh_id(),
            targets,
            expression,
        })
    }

    /// Resolves one consumed stack slot to an AST variable, synthesizing a φ
    /// when several producers converge on it.
    fn resolve_stack_argument(
        &mut self,
        consumer: i64,
        index: usize,
        sources: &BTreeSet<StackSource>,
        dfg: &DataFlowGraph<A::Variable>,
        statements: &mut Vec<Statement<A::Instruction>>,
        phi_cursor: &mut usize,
    ) -> Result<AstVariable> {
        let mut iter = sources.iter();
        match (iter.next(), iter.next()) {
            (None, _) => Err(Error::InconsistentInput {
                message: format!("stack slot {index} has no recorded producer"),
                offset: consumer,
            }),
            (Some(&single), None) => self.resolve_stack_source(consumer, single, dfg),
            _ => {
                let mut phi_sources = Vec::with_capacity(sources.len());
                for &source in sources {
                    let variable = self.resolve_stack_source(consumer, source, dfg)?;
                    let expression = self.variable_expression(variable);
                    phi_sources.push(expression);
                }
                let result = self.fresh_phi_slot();
                let statement = Statement::Phi {
                    id: self.fresh_id(),
                    result: result.clone(),
                    sources: phi_sources,
                };
                statements.insert(*phi_cursor, statement);
                *phi_cursor += 1;
                Ok(result)
            }
        }
    }

    /// Resolves a single stack source: the external's name, or the slot
    /// variable recorded when the producer was lifted.
    fn resolve_stack_source(
        &self,
        consumer: i64,
        source: StackSource,
        dfg: &DataFlowGraph<A::Variable>,
    ) -> Result<AstVariable> {
        match dfg.node(source.producer()) {
            None => Err(Error::InconsistentInput {
                message: "stack dependency references an unknown producer".to_string(),
                offset: consumer,
            }),
            Some(DataFlowNode::External(external)) => {
                Ok(AstVariable::External(external.name().to_string()))
            }
            Some(DataFlowNode::Instruction(_)) => {
                let slots = self.stack_slots.get(&source.producer()).ok_or_else(|| {
                    Error::InconsistentInput {
                        message: "stack value consumed before it is produced".to_string(),
                        offset: consumer,
                    }
                })?;
                slots
                    .get(source.slot())
                    .cloned()
                    .ok_or_else(|| Error::IsaContract {
                        message: format!(
                            "stack slot {} is outside the producer's declared push count",
                            source.slot()
                        ),
                        offset: source.producer(),
                    })
            }
        }
    }

    /// Resolves one variable dependency to an AST variable, synthesizing a
    /// memoized φ when several producers converge on it.
    fn resolve_variable_argument(
        &mut self,
        variable: &A::Variable,
        producers: &BTreeSet<i64>,
        dfg: &DataFlowGraph<A::Variable>,
        statements: &mut Vec<Statement<A::Instruction>>,
        phi_cursor: &mut usize,
    ) -> Result<AstVariable> {
        if producers.len() <= 1 {
            let version = *self.variable_versions.entry(variable.clone()).or_insert(0);
            return Ok(self.versioned_variable(variable, version));
        }

        // Canonical sorted snapshot set: the key to φ sharing. Two merges with
        // identical snapshots must resolve to the same slot.
        let mut snapshot = BTreeSet::new();
        for &producer in producers {
            let version = self.producer_version(variable, producer, dfg)?;
            snapshot.insert((variable.clone(), version));
        }
        let key: Vec<(A::Variable, u32)> = snapshot.into_iter().collect();

        if let Some(slot) = self.phi_slots.get(&key) {
            return Ok(slot.clone());
        }

        let mut sources = Vec::with_capacity(key.len());
        for (merged, version) in &key {
            let variable = self.versioned_variable(merged, *version);
            let expression = self.variable_expression(variable);
            sources.push(expression);
        }
        let result = self.fresh_phi_slot();
        let statement = Statement::Phi {
            id: self.fresh_id(),
            result: result.clone(),
            sources,
        };
        statements.insert(*phi_cursor, statement);
        *phi_cursor += 1;
        self.phi_slots.insert(key, result.clone());
        Ok(result)
    }

    /// Returns the version of `variable` as produced by `producer`.
    ///
    /// Producers that never recorded a write of the variable — external data
    /// sources in particular — contribute the initial version.
    fn producer_version(
        &mut self,
        variable: &A::Variable,
        producer: i64,
        dfg: &DataFlowGraph<A::Variable>,
    ) -> Result<u32> {
        if let Some(&version) = self.written_versions.get(&(producer, variable.clone())) {
            return Ok(version);
        }
        if dfg.node(producer).is_none() {
            return Err(Error::InconsistentInput {
                message: "variable dependency references an unknown producer".to_string(),
                offset: producer,
            });
        }
        self.variable_versions.entry(variable.clone()).or_insert(0);
        Ok(0)
    }

    /// Allocates the next SSA version for a written variable.
    ///
    /// The first write of a variable is version 0; each subsequent write bumps
    /// the counter exactly once.
    fn bump_version(&mut self, variable: &A::Variable) -> u32 {
        use std::collections::hash_map::Entry;
        match self.variable_versions.entry(variable.clone()) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += 1;
                *entry.get()
            }
            Entry::Vacant(entry) => {
                entry.insert(0);
                0
            }
        }
    }

    fn versioned_variable(&mut self, variable: &A::Variable, version: u32) -> AstVariable {
        use crate::arch::SourceVariable;
        self.versioned_variables
            .entry((variable.clone(), version))
            .or_insert_with(|| AstVariable::Versioned {
                name: variable.name().to_string(),
                version,
            })
            .clone()
    }

    fn variable_expression(&mut self, variable: AstVariable) -> Expression<A::Instruction> {
        Expression::Variable {
            id: self.fresh_id(),
            variable,
        }
    }

    fn fresh_stack_slot(&mut self) -> AstVariable {
        let slot = AstVariable::StackSlot(self.next_stack_slot);
        self.next_stack_slot += 1;
        slot
    }

    fn fresh_phi_slot(&mut self) -> AstVariable {
        let slot = AstVariable::PhiSlot(self.next_phi_slot);
        self.next_phi_slot += 1;
        slot
    }

    fn fresh_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id -= 1;
        id
    }
}
