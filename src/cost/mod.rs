//! Cost collaborators consumed by the estimator.
//!
//! - [`CostModel`]: per-instruction flop counts, copy sizes and device rates
//! - [`TripCountProvider`]: iteration counts for while loops
//!
//! [`AnalyticCostModel`] derives costs from shapes the way a shape-based
//! cost analysis does; [`TripCounts`] is a plain lookup table.

pub mod trip_count;

pub use trip_count::{TripCountProvider, TripCounts};

use std::collections::HashMap;

use crate::config::Config;
use crate::error::{Result, SimError};
use crate::program::{InstructionId, Opcode, Program};

/// Per-instruction cost queries plus device rate constants.
///
/// Values are taken as exact; the estimator never validates or derives them.
pub trait CostModel {
    /// Floating point operations performed by one execution of `id`.
    fn flop_count(&self, program: &Program, id: InstructionId) -> Result<f64>;

    /// Bytes moved by the copy-start `id`.
    fn transfer_bytes(&self, program: &Program, id: InstructionId) -> Result<f64>;

    /// Device compute rate.
    fn flops_per_second(&self) -> f64;

    /// Default-memory transfer rate.
    fn bytes_per_second(&self) -> f64;
}

/// Shape-derived cost model.
#[derive(Debug, Clone)]
pub struct AnalyticCostModel {
    flops_per_second: f64,
    bytes_per_second: f64,
    pointer_size: u64,
    flop_overrides: HashMap<InstructionId, f64>,
}

impl AnalyticCostModel {
    /// Pointer size used for tuple shapes unless configured otherwise.
    pub const DEFAULT_POINTER_SIZE: u64 = 8;

    /// Create a model with the given device rates.
    pub fn new(flops_per_second: f64, bytes_per_second: f64) -> Result<Self> {
        check_rate("flops_per_second", flops_per_second)?;
        check_rate("bytes_per_second", bytes_per_second)?;
        Ok(Self {
            flops_per_second,
            bytes_per_second,
            pointer_size: Self::DEFAULT_POINTER_SIZE,
            flop_overrides: HashMap::new(),
        })
    }

    /// Create a model from configured rates.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.flops_per_second(), config.bytes_per_second())?
            .with_pointer_size(config.pointer_size()))
    }

    /// Use `pointer_size` bytes per tuple element.
    pub fn with_pointer_size(mut self, pointer_size: u64) -> Self {
        self.pointer_size = pointer_size;
        self
    }

    /// Pin the flop count of one instruction.
    pub fn set_flop_count(&mut self, id: InstructionId, flops: f64) {
        self.flop_overrides.insert(id, flops);
    }

    /// Pointer size applied to tuple shapes.
    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }
}

impl CostModel for AnalyticCostModel {
    fn flop_count(&self, program: &Program, id: InstructionId) -> Result<f64> {
        let inst = program.instruction(id)?;
        if let Some(&flops) = self.flop_overrides.get(&id) {
            return Ok(flops);
        }

        let flops = match &inst.opcode {
            op if op.is_elementwise() => inst.shape.element_count() as f64,
            Opcode::Dot { contracting_dim } => {
                let lhs = program.instruction(inst.operand(0)?)?;
                let contracting = lhs.shape.dims().get(*contracting_dim).copied().ok_or_else(|| {
                    SimError::InvalidDimension {
                        name: inst.name.clone(),
                        dim: *contracting_dim,
                    }
                })?;
                2.0 * inst.shape.element_count() as f64 * contracting as f64
            }
            _ => 0.0,
        };
        Ok(flops)
    }

    fn transfer_bytes(&self, program: &Program, id: InstructionId) -> Result<f64> {
        let inst = program.instruction(id)?;
        if inst.opcode != Opcode::CopyStart {
            return Err(SimError::NotCopyStart { name: inst.name.clone() });
        }
        let source = program.instruction(inst.operand(0)?)?;
        Ok(source.shape.byte_size(self.pointer_size) as f64)
    }

    fn flops_per_second(&self) -> f64 {
        self.flops_per_second
    }

    fn bytes_per_second(&self) -> f64 {
        self.bytes_per_second
    }
}

fn check_rate(what: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidRate { what, value })
    }
}
