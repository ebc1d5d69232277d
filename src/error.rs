//! Error type shared by the program arena, cost model and estimator.

use thiserror::Error;

use crate::program::{ComputationId, InstructionId};

/// Errors raised while describing or timing a program.
///
/// Stale copy completions are deliberately absent: completing a transfer
/// that is no longer outstanding costs zero time and is not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Instruction id does not belong to the program.
    #[error("unknown instruction {0:?}")]
    UnknownInstruction(InstructionId),

    /// Computation id does not belong to the program.
    #[error("unknown computation {0:?}")]
    UnknownComputation(ComputationId),

    /// The program has no entry computation to walk.
    #[error("program '{program}' has no entry computation")]
    NoEntryComputation {
        /// Program name.
        program: String,
    },

    /// Operation requires a copy-start instruction.
    #[error("instruction '{name}' is not a copy-start")]
    NotCopyStart {
        /// Offending instruction name.
        name: String,
    },

    /// Operation requires a copy-done instruction.
    #[error("instruction '{name}' is not a copy-done")]
    NotCopyDone {
        /// Offending instruction name.
        name: String,
    },

    /// Instruction lacks an operand the opcode requires.
    #[error("instruction '{name}' has no operand {index}")]
    InvalidOperandIndex {
        /// Offending instruction name.
        name: String,
        /// Requested operand index.
        index: usize,
    },

    /// Dimension index outside an operand's rank.
    #[error("instruction '{name}' has no dimension {dim}")]
    InvalidDimension {
        /// Offending instruction name.
        name: String,
        /// Requested dimension.
        dim: usize,
    },

    /// A device rate is zero, negative or not finite.
    #[error("invalid {what}: {value}")]
    InvalidRate {
        /// Which rate was rejected.
        what: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Control-flow nesting exceeded the configured limit.
    #[error("control-flow nesting exceeds {limit} levels at computation '{computation}'")]
    NestingTooDeep {
        /// Configured limit.
        limit: usize,
        /// Computation being entered when the limit was hit.
        computation: String,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, SimError>;
