//! AST model and the lifting stage.
//!
//! This module holds the statement and expression model of the lifted
//! representation and the [`AstLifter`] that produces it. Lifting consumes a
//! completed [`ControlFlowGraph`](crate::cfg::ControlFlowGraph) and
//! [`DataFlowGraph`](crate::dfg::DataFlowGraph) and produces a new control
//! flow graph whose blocks contain [`Statement`]s in SSA form:
//!
//! - Stack traffic becomes named slots (`stack_slot_N`)
//! - Variable writes become versioned definitions (`name_vK`), each assigned
//!   exactly once
//! - Data flow merge points become explicit φ statements (`phi_N`)
//!
//! The output mirrors the input graph's node set, edge set, region tree, and
//! entrypoint exactly; only the per-block content changes. Lifting either
//! produces the complete output graph or fails with a structured
//! [`Error`](crate::Error) naming the offending offset.
//!
//! # Key Components
//!
//! - [`AstLifter`] - The one-shot lifting pipeline
//! - [`Statement`] - Expression, assignment, and φ statements
//! - [`Expression`] - Instruction applications and variable references
//! - [`AstVariable`] - Externals, stack slots, phi slots, versioned variables
//!
//! # Examples
//!
//! ```rust,ignore
//! use irlift::ast::AstLifter;
//!
//! let lifted = AstLifter::lift(&cfg, &dfg, &isa)?;
//! assert_eq!(lifted.entrypoint(), cfg.entrypoint());
//! ```

mod expression;
mod lifter;
mod statement;
mod variable;

pub use expression::Expression;
pub use lifter::AstLifter;
pub use statement::Statement;
pub use variable::AstVariable;
