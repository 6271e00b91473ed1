//! AST lifting integration tests.
//!
//! These tests drive the complete lifting pipeline through the public API:
//! 1. Build a control flow graph and a data flow graph by hand
//! 2. Lift them with a miniature stack-machine ISA
//! 3. Verify the SSA properties of the output (slots, versions, φ statements)
//! 4. Verify that topology, regions, and the entrypoint survive unchanged

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use irlift::prelude::*;

/// A variable of the miniature test ISA.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Var(&'static str);

impl SourceVariable for Var {
    fn name(&self) -> &str {
        self.0
    }
}

/// A variable of the lifted form, identified by its rendered name. Used when
/// recomputing a data flow graph over lifted statements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct LiftedVar(String);

impl SourceVariable for LiftedVar {
    fn name(&self) -> &str {
        &self.0
    }
}

/// An instruction of the miniature test ISA, carrying its own effects.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Instr {
    offset: i64,
    mnemonic: &'static str,
    pops: usize,
    pushes: usize,
    reads: Vec<Var>,
    writes: Vec<Var>,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)
    }
}

struct TestIsa;

impl Architecture for TestIsa {
    type Instruction = Instr;
    type Variable = Var;

    fn offset(&self, instruction: &Instr) -> i64 {
        instruction.offset
    }
    fn stack_push_count(&self, instruction: &Instr) -> usize {
        instruction.pushes
    }
    fn stack_pop_count(&self, instruction: &Instr) -> usize {
        instruction.pops
    }
    fn written_variables(&self, instruction: &Instr) -> Vec<Var> {
        instruction.writes.clone()
    }
    fn read_variables(&self, instruction: &Instr) -> Vec<Var> {
        instruction.reads.clone()
    }
}

fn instr(offset: i64, mnemonic: &'static str, pops: usize, pushes: usize) -> Instr {
    Instr {
        offset,
        mnemonic,
        pops,
        pushes,
        reads: Vec::new(),
        writes: Vec::new(),
    }
}

fn push(offset: i64) -> Instr {
    instr(offset, "push", 0, 1)
}

fn add(offset: i64) -> Instr {
    instr(offset, "add", 2, 1)
}

fn pop(offset: i64) -> Instr {
    instr(offset, "pop", 1, 0)
}

fn nop(offset: i64) -> Instr {
    instr(offset, "nop", 0, 0)
}

fn store(offset: i64, variable: Var) -> Instr {
    Instr {
        writes: vec![variable],
        ..instr(offset, "store", 0, 0)
    }
}

fn load(offset: i64, variable: Var) -> Instr {
    Instr {
        reads: vec![variable],
        ..instr(offset, "load", 0, 1)
    }
}

/// Adds one instruction node per instruction of every block.
fn dfg_for(cfg: &ControlFlowGraph<Instr>) -> Result<DataFlowGraph<Var>> {
    let mut dfg = DataFlowGraph::new();
    for block in cfg.nodes() {
        for instruction in block.instructions() {
            dfg.add_instruction_node(instruction.offset)?;
        }
    }
    Ok(dfg)
}

fn rendered(block: &BasicBlock<Statement<Instr>>) -> Vec<String> {
    block.instructions().iter().map(ToString::to_string).collect()
}

/// A diamond: entry branches to two blocks that both flow into a join block.
fn diamond(
    entry_body: Vec<Instr>,
    left_body: Vec<Instr>,
    right_body: Vec<Instr>,
    join_body: Vec<Instr>,
) -> Result<ControlFlowGraph<Instr>> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, entry_body))?;
    cfg.add_node(BasicBlock::new(10, left_body))?;
    cfg.add_node(BasicBlock::new(20, right_body))?;
    cfg.add_node(BasicBlock::new(30, join_body))?;
    cfg.connect(0, 10, ControlEdgeKind::Conditional)?;
    cfg.connect(0, 20, ControlEdgeKind::Conditional)?;
    cfg.connect(10, 30, ControlEdgeKind::Unconditional)?;
    cfg.connect(20, 30, ControlEdgeKind::Unconditional)?;
    cfg.set_entrypoint(0)?;
    Ok(cfg)
}

#[test]
fn straight_line_stack_only() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![push(0), push(1), add(2), pop(3)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(2, 0, StackSource::new(0, 0))?;
    dfg.add_stack_dependency(2, 1, StackSource::new(1, 0))?;
    dfg.add_stack_dependency(3, 0, StackSource::new(2, 0))?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let block = lifted.node(0).expect("lifted block");

    assert_eq!(
        rendered(block),
        vec![
            "stack_slot_0 = push()",
            "stack_slot_1 = push()",
            "stack_slot_2 = add(stack_slot_0, stack_slot_1)",
            "pop(stack_slot_2)",
        ]
    );
    assert!(matches!(block.instructions()[0], Statement::Assignment { .. }));
    assert!(matches!(block.instructions()[3], Statement::Expression { .. }));
    Ok(())
}

#[test]
fn variable_write_then_read() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(
        0,
        vec![store(0, Var("x")), load(1, Var("x"))],
    ))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    dfg.add_variable_dependency(1, Var("x"), 0)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let block = lifted.node(0).expect("lifted block");

    assert_eq!(rendered(block), vec!["x_v0 = store()", "load(x_v0)"]);
    Ok(())
}

#[test]
fn branch_merge_inserts_variable_phi() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y"))],
        vec![store(20, Var("y"))],
        vec![load(30, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_variable_dependency(30, Var("y"), 10)?;
    dfg.add_variable_dependency(30, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let join = lifted.node(30).expect("join block");

    assert_eq!(
        rendered(join),
        vec!["phi_0 = phi(y_v0, y_v1)", "load(phi_0)"]
    );
    assert!(join.instructions()[0].is_phi());

    // Reordering the dependency insertions must not change the output: the
    // snapshot set is canonically sorted.
    let mut reordered = dfg_for(&cfg)?;
    reordered.add_variable_dependency(30, Var("y"), 20)?;
    reordered.add_variable_dependency(30, Var("y"), 10)?;
    let relifted = AstLifter::lift(&cfg, &reordered, &TestIsa)?;
    assert_eq!(
        lifted.node(30).unwrap().instructions(),
        relifted.node(30).unwrap().instructions()
    );
    Ok(())
}

#[test]
fn stack_merge_inserts_phi() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![push(10)],
        vec![push(20)],
        vec![pop(30)],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(30, 0, StackSource::new(10, 0))?;
    dfg.add_stack_dependency(30, 0, StackSource::new(20, 0))?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let join = lifted.node(30).expect("join block");

    assert_eq!(
        rendered(join),
        vec!["phi_0 = phi(stack_slot_0, stack_slot_1)", "pop(phi_0)"]
    );
    Ok(())
}

#[test]
fn external_source_binds_by_name() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![pop(0)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    dfg.add_external_source(-1, "arg0")?;
    dfg.add_stack_dependency(0, 0, StackSource::new(-1, 0))?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let block = lifted.node(0).expect("lifted block");

    assert_eq!(rendered(block), vec!["pop(arg0)"]);
    assert!(!block.instructions().iter().any(Statement::is_phi));
    Ok(())
}

#[test]
fn exception_handler_regions_are_preserved() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![nop(0)]))?;
    cfg.add_node(BasicBlock::new(10, vec![nop(10)]))?;
    cfg.add_node(BasicBlock::new(20, vec![nop(20)]))?;
    cfg.connect(0, 10, ControlEdgeKind::Abnormal)?;
    cfg.connect(0, 20, ControlEdgeKind::Abnormal)?;
    cfg.set_entrypoint(0)?;

    let eh = cfg.add_exception_handler_region(None)?;
    let protected = cfg.protected_region(eh)?;
    let first_handler = cfg.add_handler_region(eh)?;
    let second_handler = cfg.add_handler_region(eh)?;
    cfg.move_node_to_region(0, protected)?;
    cfg.move_node_to_region(10, first_handler)?;
    cfg.move_node_to_region(20, second_handler)?;

    let dfg = dfg_for(&cfg)?;
    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;

    assert_eq!(lifted.region_count(), cfg.region_count());
    assert_eq!(lifted.root_regions().len(), 1);

    let root = lifted.root_regions()[0];
    let handler_region = lifted
        .region(root)
        .and_then(Region::as_exception_handler)
        .expect("root must be an exception handler region");
    assert_eq!(handler_region.handlers().len(), 2);

    let lifted_protected = lifted.region(handler_region.protected()).unwrap();
    assert_eq!(lifted_protected.as_basic().unwrap().node_ids(), vec![0]);

    let handlers: Vec<Vec<i64>> = handler_region
        .handlers()
        .iter()
        .map(|&id| lifted.region(id).unwrap().as_basic().unwrap().node_ids())
        .collect();
    assert_eq!(handlers, vec![vec![10], vec![20]]);
    Ok(())
}

#[test]
fn topology_and_entrypoint_are_preserved() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y"))],
        vec![store(20, Var("y"))],
        vec![load(30, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_variable_dependency(30, Var("y"), 10)?;
    dfg.add_variable_dependency(30, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;

    assert_eq!(lifted.node_ids(), cfg.node_ids());
    assert_eq!(lifted.entrypoint(), cfg.entrypoint());

    let edge_triples = |graph_edges: Vec<(i64, i64, ControlEdgeKind)>| -> BTreeSet<String> {
        graph_edges
            .into_iter()
            .map(|(origin, target, kind)| format!("{origin}->{target}:{kind}"))
            .collect()
    };
    let original = edge_triples(
        cfg.edges()
            .map(|e| (e.origin(), e.target(), e.kind()))
            .collect(),
    );
    let output = edge_triples(
        lifted
            .edges()
            .map(|e| (e.origin(), e.target(), e.kind()))
            .collect(),
    );
    assert_eq!(original, output);
    Ok(())
}

#[test]
fn every_variable_is_defined_exactly_once() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y")), push(11)],
        vec![store(20, Var("y")), push(21)],
        vec![add(30), load(31, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    // The join's first instruction consumes the two pushed values.
    dfg.add_stack_dependency(30, 0, StackSource::new(11, 0))?;
    dfg.add_stack_dependency(30, 0, StackSource::new(21, 0))?;
    dfg.add_stack_dependency(30, 1, StackSource::new(11, 0))?;
    dfg.add_stack_dependency(30, 1, StackSource::new(21, 0))?;
    dfg.add_variable_dependency(31, Var("y"), 10)?;
    dfg.add_variable_dependency(31, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;

    let mut definitions = Vec::new();
    for block in lifted.nodes() {
        for statement in block.instructions() {
            for target in statement.targets() {
                definitions.push(target.name());
            }
        }
    }
    let unique: BTreeSet<&String> = definitions.iter().collect();
    assert_eq!(unique.len(), definitions.len(), "duplicate definition found");
    Ok(())
}

#[test]
fn identical_merge_sets_share_one_phi_slot() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y"))],
        vec![store(20, Var("y"))],
        vec![load(30, Var("y")), load(31, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_variable_dependency(30, Var("y"), 10)?;
    dfg.add_variable_dependency(30, Var("y"), 20)?;
    dfg.add_variable_dependency(31, Var("y"), 10)?;
    dfg.add_variable_dependency(31, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let join = lifted.node(30).expect("join block");

    assert_eq!(
        rendered(join),
        vec!["phi_0 = phi(y_v0, y_v1)", "load(phi_0)", "load(phi_0)"]
    );
    let phi_count = join.instructions().iter().filter(|s| s.is_phi()).count();
    assert_eq!(phi_count, 1);
    Ok(())
}

#[test]
fn lifting_is_deterministic() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y")), push(11)],
        vec![store(20, Var("y")), push(21)],
        vec![pop(30), load(31, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(30, 0, StackSource::new(11, 0))?;
    dfg.add_stack_dependency(30, 0, StackSource::new(21, 0))?;
    dfg.add_variable_dependency(31, Var("y"), 10)?;
    dfg.add_variable_dependency(31, Var("y"), 20)?;

    let first = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let second = AstLifter::lift(&cfg, &dfg, &TestIsa)?;

    let blocks = |graph: &ControlFlowGraph<Statement<Instr>>| -> Vec<BasicBlock<Statement<Instr>>> {
        graph.nodes().cloned().collect()
    };
    assert_eq!(blocks(&first), blocks(&second));
    Ok(())
}

#[test]
fn no_variable_reference_dangles() -> Result<()> {
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y")), push(11)],
        vec![store(20, Var("y")), push(21)],
        vec![pop(30), load(31, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_external_source(-1, "arg0")?;
    dfg.add_stack_dependency(30, 0, StackSource::new(11, 0))?;
    dfg.add_stack_dependency(30, 0, StackSource::new(21, 0))?;
    dfg.add_variable_dependency(31, Var("y"), 10)?;
    dfg.add_variable_dependency(31, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;

    let mut defined: BTreeSet<String> = BTreeSet::new();
    defined.insert("arg0".to_string());
    for block in lifted.nodes() {
        for statement in block.instructions() {
            for target in statement.targets() {
                defined.insert(target.name());
            }
        }
    }

    for block in lifted.nodes() {
        for statement in block.instructions() {
            statement.walk_expressions(&mut |expression| {
                if let Some(variable) = expression.as_variable() {
                    assert!(
                        defined.contains(&variable.name()),
                        "reference to undefined variable {variable}"
                    );
                }
            });
        }
    }
    Ok(())
}

#[test]
fn expression_statements_only_for_unused_results() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    // The second push is never consumed and writes nothing.
    cfg.add_node(BasicBlock::new(0, vec![push(0), push(1), pop(2)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(2, 0, StackSource::new(0, 0))?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let block = lifted.node(0).expect("lifted block");

    assert!(matches!(block.instructions()[0], Statement::Assignment { .. }));
    assert!(
        matches!(block.instructions()[1], Statement::Expression { .. }),
        "an unconsumed push with no writes must not become an assignment"
    );
    assert!(matches!(block.instructions()[2], Statement::Expression { .. }));
    Ok(())
}

#[test]
fn ast_architecture_reads_lifted_statements() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![push(0), push(1), add(2), pop(3)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(2, 0, StackSource::new(0, 0))?;
    dfg.add_stack_dependency(2, 1, StackSource::new(1, 0))?;
    dfg.add_stack_dependency(3, 0, StackSource::new(2, 0))?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let isa = TestIsa;
    let ast_isa = AstArchitecture::new(&isa);

    let block = lifted.node(0).expect("lifted block");
    let statements = block.instructions();

    // Statement ids are unique, negative, and disjoint from real offsets.
    let ids: BTreeSet<i64> = statements.iter().map(|s| ast_isa.offset(s)).collect();
    assert_eq!(ids.len(), statements.len());
    assert!(ids.iter().all(|&id| id < 0));

    // Stack effects delegate to the wrapped ISA.
    let pushes: usize = statements.iter().map(|s| ast_isa.stack_push_count(s)).sum();
    let pops: usize = statements.iter().map(|s| ast_isa.stack_pop_count(s)).sum();
    assert_eq!(pushes, 3);
    assert_eq!(pops, 3);
    Ok(())
}

#[test]
fn recomputed_data_flow_matches_ssa_structure() -> Result<()> {
    // Round trip: lift a graph with both a stack merge and a variable merge,
    // then recompute a data flow graph over the lifted statements (keyed by
    // their decorator offsets). In SSA form every merge is already explicit,
    // so the recomputed graph must have single-producer dependencies
    // everywhere, and its dependants relation must mirror the φ/assignment
    // structure exactly.
    let cfg = diamond(
        vec![nop(0)],
        vec![store(10, Var("y")), push(11)],
        vec![store(20, Var("y")), push(21)],
        vec![pop(30), load(31, Var("y"))],
    )?;
    let mut dfg = dfg_for(&cfg)?;
    dfg.add_stack_dependency(30, 0, StackSource::new(11, 0))?;
    dfg.add_stack_dependency(30, 0, StackSource::new(21, 0))?;
    dfg.add_variable_dependency(31, Var("y"), 10)?;
    dfg.add_variable_dependency(31, Var("y"), 20)?;

    let lifted = AstLifter::lift(&cfg, &dfg, &TestIsa)?;
    let isa = TestIsa;
    let ast_isa = AstArchitecture::new(&isa);

    // Each defined variable maps to exactly one defining statement.
    let mut definitions: BTreeMap<String, i64> = BTreeMap::new();
    for block in lifted.nodes() {
        for statement in block.instructions() {
            for target in statement.targets() {
                let previous = definitions.insert(target.name(), ast_isa.offset(statement));
                assert!(previous.is_none(), "double definition of {target}");
            }
        }
    }

    // Collect every variable reference as (consumer statement, name).
    let mut references: Vec<(i64, String)> = Vec::new();
    for block in lifted.nodes() {
        for statement in block.instructions() {
            let consumer = ast_isa.offset(statement);
            let mut names = Vec::new();
            statement.walk_expressions(&mut |expression| {
                if let Some(variable) = expression.as_variable() {
                    names.push(variable.name());
                }
            });
            for name in names {
                references.push((consumer, name));
            }
        }
    }

    // Recompute the dependencies over the lifted statements.
    let mut recomputed: DataFlowGraph<LiftedVar> = DataFlowGraph::new();
    for block in lifted.nodes() {
        for statement in block.instructions() {
            recomputed.add_instruction_node(ast_isa.offset(statement))?;
        }
    }
    for (consumer, name) in &references {
        let producer = *definitions.get(name).expect("reference to undefined variable");
        recomputed.add_variable_dependency(*consumer, LiftedVar(name.clone()), producer)?;
    }
    recomputed.validate()?;

    // No new merge points: every recomputed dependency has a single producer.
    for node in recomputed.nodes() {
        if let Some(instruction) = node.as_instruction() {
            for (variable, producers) in instruction.variable_dependencies().iter() {
                assert_eq!(
                    producers.len(),
                    1,
                    "merge of {} not made explicit by lifting",
                    variable.name()
                );
            }
        }
    }

    // No missed ones: the dependants of every statement are exactly the
    // statements referencing a variable it defines.
    let mut expected: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for (consumer, name) in &references {
        expected.entry(definitions[name]).or_default().insert(*consumer);
    }
    for block in lifted.nodes() {
        for statement in block.instructions() {
            let id = ast_isa.offset(statement);
            let dependants: BTreeSet<i64> = recomputed.dependants_of(id).collect();
            assert_eq!(dependants, expected.get(&id).cloned().unwrap_or_default());
        }
    }
    Ok(())
}

#[test]
fn missing_data_flow_node_is_rejected() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![nop(0), nop(1)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = DataFlowGraph::new();
    dfg.add_instruction_node(0)?;

    match AstLifter::lift(&cfg, &dfg, &TestIsa) {
        Err(Error::InconsistentInput { offset: 1, .. }) => Ok(()),
        other => panic!("expected inconsistent input for offset 1, got {other:?}"),
    }
}

#[test]
fn stray_data_flow_node_is_rejected() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![nop(0)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = DataFlowGraph::new();
    dfg.add_instruction_node(0)?;
    dfg.add_instruction_node(99)?;

    match AstLifter::lift(&cfg, &dfg, &TestIsa) {
        Err(Error::InconsistentInput { offset: 99, .. }) => Ok(()),
        other => panic!("expected inconsistent input for offset 99, got {other:?}"),
    }
}

#[test]
fn missing_entrypoint_is_rejected() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![nop(0)]))?;

    let mut dfg = DataFlowGraph::new();
    dfg.add_instruction_node(0)?;

    match AstLifter::lift(&cfg, &dfg, &TestIsa) {
        Err(Error::InvariantViolation { .. }) => Ok(()),
        other => panic!("expected invariant violation, got {other:?}"),
    }
}

#[test]
fn pop_count_mismatch_is_an_isa_contract_breach() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![pop(0)]))?;
    cfg.set_entrypoint(0)?;

    // No stack dependency recorded for an instruction that declares one pop.
    let dfg = dfg_for(&cfg)?;

    match AstLifter::lift(&cfg, &dfg, &TestIsa) {
        Err(Error::IsaContract { offset: 0, .. }) => Ok(()),
        other => panic!("expected ISA contract breach, got {other:?}"),
    }
}

#[test]
fn slot_outside_push_count_is_an_isa_contract_breach() -> Result<()> {
    let mut cfg = ControlFlowGraph::new();
    cfg.add_node(BasicBlock::new(0, vec![push(0), pop(1)]))?;
    cfg.set_entrypoint(0)?;

    let mut dfg = dfg_for(&cfg)?;
    // push produces one value; slot index 1 is out of range.
    dfg.add_stack_dependency(1, 0, StackSource::new(0, 1))?;

    match AstLifter::lift(&cfg, &dfg, &TestIsa) {
        Err(Error::IsaContract { offset: 0, .. }) => Ok(()),
        other => panic!("expected ISA contract breach, got {other:?}"),
    }
}
