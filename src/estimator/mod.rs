//! Execution-time estimation for memory placement plans.
//!
//! Two pieces cooperate:
//!
//! - [`CopyContentionTracker`]: outstanding copies per direction and their
//!   completion time under shared default-memory bandwidth
//! - [`TimelineEstimator`]: walks the schedule, charges compute, and routes
//!   copy-start / copy-done through the tracker
//!
//! # Usage
//!
//! ```
//! use msa_sim::cost::{AnalyticCostModel, TripCounts};
//! use msa_sim::estimator::{AllocationSequence, EstimatorOptions, TimelineEstimator};
//! use msa_sim::program::{MemorySpace, Opcode, PrimitiveType, Program, Shape};
//!
//! let mut program = Program::new("prefetch");
//! let entry = program.add_computation("entry");
//! program.set_entry(entry)?;
//!
//! let buf = Shape::array(PrimitiveType::F32, &[128]);
//! let fast = buf.clone().in_memory_space(MemorySpace(1));
//! let param = program.add_instruction(entry, "param", Opcode::Parameter(0), buf, &[])?;
//! let start = program.add_instruction(entry, "copy-start", Opcode::CopyStart, fast.clone(), &[param])?;
//! program.add_instruction(entry, "copy-done", Opcode::CopyDone, fast, &[start])?;
//!
//! let costs = AnalyticCostModel::new(1.0, 1.0)?;
//! let trips = TripCounts::new();
//! let mut estimator = TimelineEstimator::new(&costs, &trips, EstimatorOptions::default());
//! let elapsed = estimator.compute_estimated_elapsed_time(&program, &AllocationSequence::new())?;
//! assert_eq!(elapsed, 512.0);
//! # Ok::<(), msa_sim::SimError>(())
//! ```

pub mod allocation;
pub mod options;
pub mod timeline;
pub mod tracker;

pub use allocation::{Allocation, AllocationSequence};
pub use options::{ConditionalPolicy, EstimatorOptions};
pub use timeline::TimelineEstimator;
pub use tracker::{ContentionStats, CopyContentionTracker, OutstandingTransfer, TransferDirection};
