//! Scheduled program arena.
//!
//! A [`Program`] owns every computation and instruction; callers refer to
//! them through copyable [`InstructionId`] / [`ComputationId`] handles.
//! Instructions are scheduled in the order they are added to their
//! computation, so building a program also fixes its schedule.
//!
//! # Usage
//!
//! ```
//! use msa_sim::program::{Opcode, PrimitiveType, Program, Shape};
//!
//! let mut program = Program::new("module");
//! let entry = program.add_computation("entry");
//! program.set_entry(entry).unwrap();
//!
//! let s32 = Shape::scalar(PrimitiveType::S32);
//! let a = program.add_instruction(entry, "a", Opcode::Parameter(0), s32.clone(), &[]).unwrap();
//! let b = program.add_instruction(entry, "b", Opcode::Add, s32, &[a, a]).unwrap();
//!
//! assert_eq!(program.schedule(entry).unwrap(), &[a, b]);
//! ```

pub mod opcode;
pub mod shape;

pub use opcode::Opcode;
pub use shape::{MemorySpace, PrimitiveType, Shape};

use smallvec::SmallVec;
use std::collections::HashMap;

use crate::error::{Result, SimError};

/// Handle to an instruction inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstructionId(pub u32);

/// Handle to a computation inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(pub u32);

/// One operation in the program graph.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Unique name within the program.
    pub name: String,
    /// What the instruction does.
    pub opcode: Opcode,
    /// Result shape, including memory-space annotation.
    pub shape: Shape,
    /// Operand instructions, in order.
    pub operands: SmallVec<[InstructionId; 2]>,
    /// Computation the instruction is scheduled in.
    pub parent: ComputationId,
}

impl Instruction {
    /// Operand at `index`.
    pub fn operand(&self, index: usize) -> Result<InstructionId> {
        self.operands
            .get(index)
            .copied()
            .ok_or_else(|| SimError::InvalidOperandIndex {
                name: self.name.clone(),
                index,
            })
    }
}

/// A named computation and its instruction schedule.
#[derive(Debug, Clone)]
pub struct Computation {
    /// Computation name.
    pub name: String,
    /// Instructions in schedule order.
    pub sequence: Vec<InstructionId>,
}

/// Arena holding all computations and instructions of a program.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    computations: Vec<Computation>,
    instructions: Vec<Instruction>,
    by_name: HashMap<String, InstructionId>,
    entry: Option<ComputationId>,
}

impl Program {
    /// Create an empty program.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            computations: Vec::new(),
            instructions: Vec::new(),
            by_name: HashMap::new(),
            entry: None,
        }
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an empty computation.
    pub fn add_computation(&mut self, name: impl Into<String>) -> ComputationId {
        let id = ComputationId(self.computations.len() as u32);
        self.computations.push(Computation {
            name: name.into(),
            sequence: Vec::new(),
        });
        id
    }

    /// Mark `computation` as the program entry point.
    pub fn set_entry(&mut self, computation: ComputationId) -> Result<()> {
        self.computation(computation)?;
        self.entry = Some(computation);
        Ok(())
    }

    /// Entry computation.
    pub fn entry(&self) -> Result<ComputationId> {
        self.entry.ok_or_else(|| SimError::NoEntryComputation {
            program: self.name.clone(),
        })
    }

    /// Append an instruction to the schedule of `computation`.
    ///
    /// Operands and any computations named by `opcode` must already exist.
    /// A later instruction with a duplicate name shadows the earlier one in
    /// [`Program::find`].
    pub fn add_instruction(
        &mut self,
        computation: ComputationId,
        name: impl Into<String>,
        opcode: Opcode,
        shape: Shape,
        operands: &[InstructionId],
    ) -> Result<InstructionId> {
        self.computation(computation)?;
        for &operand in operands {
            self.instruction(operand)?;
        }
        for called in opcode.called_computations() {
            self.computation(called)?;
        }

        let id = InstructionId(self.instructions.len() as u32);
        let name = name.into();
        self.by_name.insert(name.clone(), id);
        self.instructions.push(Instruction {
            name,
            opcode,
            shape,
            operands: SmallVec::from_slice(operands),
            parent: computation,
        });
        self.computations[computation.0 as usize].sequence.push(id);
        Ok(id)
    }

    /// Look up an instruction.
    pub fn instruction(&self, id: InstructionId) -> Result<&Instruction> {
        self.instructions
            .get(id.0 as usize)
            .ok_or(SimError::UnknownInstruction(id))
    }

    /// Look up a computation.
    pub fn computation(&self, id: ComputationId) -> Result<&Computation> {
        self.computations
            .get(id.0 as usize)
            .ok_or(SimError::UnknownComputation(id))
    }

    /// Scheduled instruction sequence of a computation.
    pub fn schedule(&self, id: ComputationId) -> Result<&[InstructionId]> {
        Ok(&self.computation(id)?.sequence)
    }

    /// Find an instruction by name.
    pub fn find(&self, name: &str) -> Option<InstructionId> {
        self.by_name.get(name).copied()
    }

    /// Name of an instruction, or a placeholder for unknown ids.
    pub fn name_of(&self, id: InstructionId) -> &str {
        self.instructions
            .get(id.0 as usize)
            .map(|inst| inst.name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Number of instructions across all computations.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Number of computations.
    pub fn computation_count(&self) -> usize {
        self.computations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s32() -> Shape {
        Shape::scalar(PrimitiveType::S32)
    }

    #[test]
    fn test_schedule_follows_insertion_order() {
        let mut program = Program::new("m");
        let entry = program.add_computation("entry");
        let a = program.add_instruction(entry, "a", Opcode::Parameter(0), s32(), &[]).unwrap();
        let b = program.add_instruction(entry, "b", Opcode::Constant, s32(), &[]).unwrap();
        let c = program.add_instruction(entry, "c", Opcode::Add, s32(), &[a, b]).unwrap();

        assert_eq!(program.schedule(entry).unwrap(), &[a, b, c]);
        assert_eq!(program.find("c"), Some(c));
        assert_eq!(program.instruction(c).unwrap().operand(1).unwrap(), b);
        assert_eq!(program.instruction(c).unwrap().parent, entry);
    }

    #[test]
    fn test_unknown_operand_rejected() {
        let mut program = Program::new("m");
        let entry = program.add_computation("entry");
        let err = program
            .add_instruction(entry, "bad", Opcode::Add, s32(), &[InstructionId(7)])
            .unwrap_err();
        assert_eq!(err, SimError::UnknownInstruction(InstructionId(7)));
        assert_eq!(program.instruction_count(), 0);
    }

    #[test]
    fn test_unknown_called_computation_rejected() {
        let mut program = Program::new("m");
        let entry = program.add_computation("entry");
        let err = program
            .add_instruction(entry, "call", Opcode::Call { callee: ComputationId(3) }, s32(), &[])
            .unwrap_err();
        assert_eq!(err, SimError::UnknownComputation(ComputationId(3)));
    }

    #[test]
    fn test_missing_entry() {
        let program = Program::new("m");
        assert!(matches!(program.entry(), Err(SimError::NoEntryComputation { .. })));
    }

    #[test]
    fn test_missing_operand_index() {
        let mut program = Program::new("m");
        let entry = program.add_computation("entry");
        let a = program.add_instruction(entry, "a", Opcode::Parameter(0), s32(), &[]).unwrap();
        let err = program.instruction(a).unwrap().operand(0).unwrap_err();
        assert_eq!(err, SimError::InvalidOperandIndex { name: "a".to_string(), index: 0 });
    }

    #[test]
    fn test_called_computations_and_mnemonics() {
        let mut program = Program::new("m");
        let cond = program.add_computation("cond");
        let body = program.add_computation("body");
        let entry = program.add_computation("entry");
        assert_eq!(program.computation_count(), 3);

        let init = program.add_instruction(entry, "init", Opcode::Constant, s32(), &[]).unwrap();
        let w = program
            .add_instruction(entry, "w", Opcode::While { condition: cond, body }, s32(), &[init])
            .unwrap();
        let opcode = &program.instruction(w).unwrap().opcode;
        assert_eq!(opcode.mnemonic(), "while");
        assert_eq!(opcode.called_computations(), vec![cond, body]);
        assert!(!opcode.is_elementwise());

        assert_eq!(Opcode::Dot { contracting_dim: 0 }.mnemonic(), "dot");
        assert_eq!(Opcode::CopyDone.mnemonic(), "copy-done");
        assert!(Opcode::Compare.is_elementwise());
        assert!(Opcode::CopyStart.called_computations().is_empty());
    }
}
