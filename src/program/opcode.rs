//! Instruction opcodes.

use super::ComputationId;

/// Operation performed by an instruction.
///
/// Control-flow opcodes name the computations they invoke; everything else
/// is a leaf for the timeline walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// Computation parameter with its index.
    Parameter(usize),
    Constant,
    Tuple,
    /// Extract tuple element at index.
    GetTupleElement(usize),
    Bitcast,

    // Elementwise
    Add,
    Subtract,
    Multiply,
    Divide,
    Maximum,
    Minimum,
    Exp,
    Negate,
    Convert,
    Compare,

    /// Matrix multiply contracting `contracting_dim` of the lhs operand.
    Dot { contracting_dim: usize },

    /// Start of an asynchronous copy between memory spaces.
    CopyStart,
    /// Completion of the copy-start given as operand 0.
    CopyDone,

    /// Loop running `body` while `condition` holds.
    While {
        condition: ComputationId,
        body: ComputationId,
    },
    /// Runs one of `branches`.
    Conditional { branches: Vec<ComputationId> },
    /// Invokes `callee` once.
    Call { callee: ComputationId },
}

impl Opcode {
    /// Elementwise arithmetic, one flop per output element.
    pub fn is_elementwise(&self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Subtract
                | Self::Multiply
                | Self::Divide
                | Self::Maximum
                | Self::Minimum
                | Self::Exp
                | Self::Negate
                | Self::Convert
                | Self::Compare
        )
    }

    /// Computations this instruction invokes, in order.
    pub fn called_computations(&self) -> Vec<ComputationId> {
        match self {
            Self::While { condition, body } => vec![*condition, *body],
            Self::Conditional { branches } => branches.clone(),
            Self::Call { callee } => vec![*callee],
            _ => Vec::new(),
        }
    }

    /// Short lowercase mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Parameter(_) => "parameter",
            Self::Constant => "constant",
            Self::Tuple => "tuple",
            Self::GetTupleElement(_) => "get-tuple-element",
            Self::Bitcast => "bitcast",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::Exp => "exponential",
            Self::Negate => "negate",
            Self::Convert => "convert",
            Self::Compare => "compare",
            Self::Dot { .. } => "dot",
            Self::CopyStart => "copy-start",
            Self::CopyDone => "copy-done",
            Self::While { .. } => "while",
            Self::Conditional { .. } => "conditional",
            Self::Call { .. } => "call",
        }
    }
}
