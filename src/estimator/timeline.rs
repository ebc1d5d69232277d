//! Schedule walk that turns a placement plan into an elapsed time.
//!
//! The walk visits the entry computation in schedule order:
//!
//! | Instruction   | Charge                                              |
//! |---------------|-----------------------------------------------------|
//! | ordinary      | `flops / flops_per_second`                          |
//! | copy-start    | none; queued on the contention tracker              |
//! | copy-done     | time until the copy drains under contention         |
//! | while         | `trip_count * (condition + body)`                   |
//! | conditional   | branches per [`ConditionalPolicy`]                  |
//! | call          | callee                                              |
//!
//! The tracker's queues outlive a single walk, so successive calls on the
//! same estimator continue one timeline.

use std::collections::VecDeque;

use super::allocation::AllocationSequence;
use super::options::{ConditionalPolicy, EstimatorOptions};
use super::tracker::{CopyContentionTracker, OutstandingTransfer, TransferDirection};
use crate::cost::{CostModel, TripCountProvider};
use crate::error::{Result, SimError};
use crate::program::{ComputationId, InstructionId, Opcode, Program};

/// Estimates program run time for a memory placement plan.
///
/// Holds mutable queue state: evaluate candidate plans concurrently with one
/// estimator per evaluation.
pub struct TimelineEstimator<'a> {
    costs: &'a dyn CostModel,
    trip_counts: &'a dyn TripCountProvider,
    options: EstimatorOptions,
    tracker: CopyContentionTracker,
}

impl<'a> TimelineEstimator<'a> {
    /// Create an estimator with no copies in flight.
    pub fn new(
        costs: &'a dyn CostModel,
        trip_counts: &'a dyn TripCountProvider,
        options: EstimatorOptions,
    ) -> Self {
        Self::with_outstanding(costs, trip_counts, options, VecDeque::new(), VecDeque::new())
    }

    /// Create an estimator resuming a timeline with copies already in flight.
    pub fn with_outstanding(
        costs: &'a dyn CostModel,
        trip_counts: &'a dyn TripCountProvider,
        options: EstimatorOptions,
        read_queue: impl Into<VecDeque<OutstandingTransfer>>,
        write_queue: impl Into<VecDeque<OutstandingTransfer>>,
    ) -> Self {
        let tracker = CopyContentionTracker::with_outstanding(
            costs.bytes_per_second(),
            read_queue,
            write_queue,
        );
        Self {
            costs,
            trip_counts,
            options,
            tracker,
        }
    }

    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    pub fn tracker(&self) -> &CopyContentionTracker {
        &self.tracker
    }

    /// Outstanding default-to-alternate copies.
    pub fn outstanding_read_queue(&self) -> &VecDeque<OutstandingTransfer> {
        self.tracker.read_queue()
    }

    /// Outstanding alternate-to-default copies.
    pub fn outstanding_write_queue(&self) -> &VecDeque<OutstandingTransfer> {
        self.tracker.write_queue()
    }

    /// Estimated elapsed time of the whole program.
    ///
    /// `allocations` is not needed for timing: copy instructions already
    /// carry the placement through their memory spaces.
    pub fn compute_estimated_elapsed_time(
        &mut self,
        program: &Program,
        allocations: &AllocationSequence,
    ) -> Result<f64> {
        let entry = program.entry()?;
        log::debug!(
            "estimating '{}' ({} computations, {} instructions, {} allocations, {} in alternate memory)",
            program.name(),
            program.computation_count(),
            program.instruction_count(),
            allocations.len(),
            allocations.count_in(self.options.alternate_memory_space)
        );

        let total = self.computation_elapsed(program, entry, 0)?;
        log::debug!("'{}' estimated at {}", program.name(), total);
        Ok(total)
    }

    /// Direction of a copy-start, or `None` when default memory is not on
    /// exactly one side of the copy.
    pub fn transfer_direction(
        &self,
        program: &Program,
        copy_start: InstructionId,
    ) -> Result<Option<TransferDirection>> {
        let inst = program.instruction(copy_start)?;
        if inst.opcode != Opcode::CopyStart {
            return Err(SimError::NotCopyStart { name: inst.name.clone() });
        }
        let source = program.instruction(inst.operand(0)?)?.shape.memory_space();
        let destination = inst.shape.memory_space();
        let alternate = Some(self.options.alternate_memory_space);

        let direction = if source.is_some_and(|s| s.is_default()) && destination == alternate {
            Some(TransferDirection::DefaultToAlternate)
        } else if source == alternate && destination.is_some_and(|d| d.is_default()) {
            Some(TransferDirection::AlternateToDefault)
        } else {
            None
        };
        Ok(direction)
    }

    /// Queue the transfer issued by a copy-start.
    pub fn register_async_copy_start(
        &mut self,
        program: &Program,
        copy_start: InstructionId,
    ) -> Result<()> {
        match self.transfer_direction(program, copy_start)? {
            Some(direction) => {
                let bytes = self.costs.transfer_bytes(program, copy_start)?;
                self.tracker.register_transfer_start(copy_start, bytes, direction);
            }
            None => log::debug!(
                "'{}' does not cross default memory, not modelled",
                program.name_of(copy_start)
            ),
        }
        Ok(())
    }

    /// Time spent blocked in a copy-done.
    ///
    /// Copies that already finished, or were never queued, cost nothing.
    pub fn simulate_async_copy_done(
        &mut self,
        program: &Program,
        copy_done: InstructionId,
    ) -> Result<f64> {
        let inst = program.instruction(copy_done)?;
        if inst.opcode != Opcode::CopyDone {
            return Err(SimError::NotCopyDone { name: inst.name.clone() });
        }
        let copy_start = inst.operand(0)?;
        Ok(self.tracker.simulate_transfer_done(copy_start))
    }

    fn computation_elapsed(
        &mut self,
        program: &Program,
        computation: ComputationId,
        depth: usize,
    ) -> Result<f64> {
        let comp = program.computation(computation)?;
        if depth > self.options.max_nesting_depth {
            return Err(SimError::NestingTooDeep {
                limit: self.options.max_nesting_depth,
                computation: comp.name.clone(),
            });
        }

        let mut elapsed = 0.0;
        for &id in &comp.sequence {
            elapsed += self.instruction_elapsed(program, id, depth)?;
        }
        Ok(elapsed)
    }

    fn instruction_elapsed(
        &mut self,
        program: &Program,
        id: InstructionId,
        depth: usize,
    ) -> Result<f64> {
        let inst = program.instruction(id)?;
        log::trace!("{} '{}'", inst.opcode.mnemonic(), inst.name);
        match &inst.opcode {
            Opcode::CopyStart => {
                self.register_async_copy_start(program, id)?;
                Ok(0.0)
            }
            Opcode::CopyDone => self.simulate_async_copy_done(program, id),
            Opcode::While { condition, body } => {
                let iterations = match self.trip_counts.trip_count(id) {
                    Some(n) => n,
                    None => {
                        log::warn!(
                            "no trip count for '{}', assuming {}",
                            inst.name,
                            self.options.unknown_trip_count
                        );
                        self.options.unknown_trip_count
                    }
                };
                // A loop that never runs must not issue its copies.
                if iterations == 0 {
                    log::debug!("'{}' runs zero times, skipped", inst.name);
                    return Ok(0.0);
                }
                let per_iteration = self.computation_elapsed(program, *condition, depth + 1)?
                    + self.computation_elapsed(program, *body, depth + 1)?;
                log::debug!(
                    "'{}': {} iterations at {} each",
                    inst.name,
                    iterations,
                    per_iteration
                );
                Ok(iterations as f64 * per_iteration)
            }
            Opcode::Conditional { branches } => self.conditional_elapsed(program, branches, depth),
            Opcode::Call { callee } => self.computation_elapsed(program, *callee, depth + 1),
            _ => {
                let flops = self.costs.flop_count(program, id)?;
                Ok(flops / self.costs.flops_per_second())
            }
        }
    }

    fn conditional_elapsed(
        &mut self,
        program: &Program,
        branches: &[ComputationId],
        depth: usize,
    ) -> Result<f64> {
        match self.options.conditional_policy {
            ConditionalPolicy::AllBranches => {
                let mut elapsed = 0.0;
                for &branch in branches {
                    elapsed += self.computation_elapsed(program, branch, depth + 1)?;
                }
                Ok(elapsed)
            }
            ConditionalPolicy::MostExpensiveBranch => {
                let before = self.tracker.clone();
                let mut slowest: Option<(f64, CopyContentionTracker)> = None;
                for &branch in branches {
                    self.tracker = before.clone();
                    let elapsed = self.computation_elapsed(program, branch, depth + 1)?;
                    if slowest.as_ref().map_or(true, |(t, _)| elapsed > *t) {
                        slowest = Some((elapsed, self.tracker.clone()));
                    }
                }
                match slowest {
                    Some((elapsed, tracker)) => {
                        self.tracker = tracker;
                        Ok(elapsed)
                    }
                    None => {
                        self.tracker = before;
                        Ok(0.0)
                    }
                }
            }
        }
    }
}
