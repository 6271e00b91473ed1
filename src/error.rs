use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure is fatal to the operation that produced it: the graph models and the AST
/// lifter never return partial output. Each variant carries the offset or identifier of the
/// offending element so callers can report precisely which part of the input was rejected.
///
/// # Error Categories
///
/// ## Input Consistency
/// - [`Error::InconsistentInput`] - The two input graphs disagree with each other (a data
///   flow node is missing for an instruction, an edge endpoint is unknown, a region
///   references a node that is not part of the graph)
///
/// ## Structural Invariants
/// - [`Error::InvariantViolation`] - A graph mutation would break a structural rule
///   (duplicate node offset, a second fall-through or unconditional successor, an
///   entrypoint outside the graph)
///
/// ## Region Model
/// - [`Error::UnsupportedRegionKind`] - A region resolved to a variant that the requested
///   operation cannot work with
///
/// ## ISA Contract
/// - [`Error::IsaContract`] - The instruction set architecture reported values that
///   contradict the dependency information (a stack slot index outside the producer's
///   declared push count)
///
/// # Examples
///
/// ```rust
/// use irlift::{cfg::ControlFlowGraph, Error};
///
/// let mut cfg: ControlFlowGraph<u8> = ControlFlowGraph::new();
/// match cfg.set_entrypoint(0x20) {
///     Err(Error::InvariantViolation { offset, .. }) => assert_eq!(offset, 0x20),
///     other => panic!("expected invariant violation, got {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input graphs are inconsistent with each other.
    ///
    /// Raised when the control flow graph and the data flow graph disagree: an
    /// instruction without a corresponding data flow node, a dependency on a node
    /// that does not exist, or an edge endpoint outside the node set.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the disagreement
    /// * `offset` - The offset of the element that exposed it
    #[error("inconsistent input at {offset}: {message}")]
    InconsistentInput {
        /// Description of the disagreement between the inputs.
        message: String,
        /// The offset of the element that exposed the inconsistency.
        offset: i64,
    },

    /// A structural invariant of a graph would be violated.
    ///
    /// Raised by graph mutators that would otherwise break a rule the model guarantees:
    /// one node per offset, at most one fall-through and one unconditional successor,
    /// no redundant identical edges, the entrypoint being a member of the graph.
    ///
    /// # Fields
    ///
    /// * `message` - The rule that would be broken
    /// * `offset` - The node offset involved in the rejected mutation
    #[error("invariant violation at {offset}: {message}")]
    InvariantViolation {
        /// The rule that would be broken.
        message: String,
        /// The node offset involved in the rejected mutation.
        offset: i64,
    },

    /// A region resolved to a variant the operation cannot work with.
    ///
    /// The region model has exactly two variants (basic and exception handler). This
    /// error is raised when an identifier resolves to the wrong one, for example when
    /// a node is moved into an exception handler region directly instead of into one of
    /// its protected or handler member regions.
    #[error("unsupported region kind for region r{region}")]
    UnsupportedRegionKind {
        /// The raw index of the offending region.
        region: usize,
    },

    /// The instruction set architecture broke its contract.
    ///
    /// Raised when values reported by the ISA contradict the dependency information,
    /// such as a stack dependency referencing a slot index at or beyond the producer's
    /// declared push count.
    #[error("ISA contract breach at {offset}: {message}")]
    IsaContract {
        /// Description of the contradiction.
        message: String,
        /// The offset of the instruction whose ISA answers were contradictory.
        offset: i64,
    },
}
