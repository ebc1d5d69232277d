//! Bandwidth contention between outstanding asynchronous copies.
//!
//! Default memory has one transfer rate shared by two directions:
//!
//! - **Read**: default memory to alternate memory (prefetch)
//! - **Write**: alternate memory to default memory (eviction)
//!
//! Each direction keeps a FIFO of outstanding copies and only its head is
//! moving data. When both heads are active they split the bandwidth 50/50;
//! a lone head gets all of it.
//!
//! # Stepping
//!
//! Completing a copy advances simulated time in steps. Each step runs until
//! the first of the two active heads drains, removes it, and re-evaluates
//! the split:
//!
//! ```text
//!   read  512B |=========== 0.5 B/s ===========|-- 1 B/s --|
//!   write 128B |== 0.5 B/s ==| done at t=256
//!              0            256                         640
//! ```
//!
//! # Usage
//!
//! ```
//! use msa_sim::estimator::{CopyContentionTracker, TransferDirection};
//! use msa_sim::program::InstructionId;
//!
//! let mut tracker = CopyContentionTracker::new(1.0);
//! tracker.register_transfer_start(InstructionId(1), 512.0, TransferDirection::DefaultToAlternate);
//! tracker.register_transfer_start(InstructionId(2), 128.0, TransferDirection::AlternateToDefault);
//!
//! assert_eq!(tracker.simulate_transfer_done(InstructionId(2)), 256.0);
//! assert_eq!(tracker.simulate_transfer_done(InstructionId(1)), 384.0);
//! assert_eq!(tracker.simulate_transfer_done(InstructionId(1)), 0.0);
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::program::InstructionId;

/// Bytes at or below this are treated as fully drained.
const DRAINED_EPSILON: f64 = 1e-9;

/// Direction of a copy relative to default memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Read from default memory into alternate memory.
    DefaultToAlternate,
    /// Write from alternate memory back to default memory.
    AlternateToDefault,
}

impl TransferDirection {
    /// The direction competing with this one for bandwidth.
    pub fn opposite(self) -> Self {
        match self {
            Self::DefaultToAlternate => Self::AlternateToDefault,
            Self::AlternateToDefault => Self::DefaultToAlternate,
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultToAlternate => write!(f, "read"),
            Self::AlternateToDefault => write!(f, "write"),
        }
    }
}

/// A registered copy that has not finished yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OutstandingTransfer {
    /// Copy-start instruction that issued the transfer.
    pub instruction: InstructionId,
    /// Bytes still to move.
    pub remaining_bytes: f64,
}

impl OutstandingTransfer {
    pub fn new(instruction: InstructionId, remaining_bytes: f64) -> Self {
        Self { instruction, remaining_bytes }
    }
}

/// Counters accumulated across completions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentionStats {
    /// Reads drained to zero (targets and bystanders).
    pub completed_reads: u64,
    /// Writes drained to zero (targets and bystanders).
    pub completed_writes: u64,
    /// Completion requests for copies that were no longer outstanding.
    pub stale_completions: u64,
    /// Simulated time spent waiting on completions.
    pub transfer_time: f64,
    /// Part of `transfer_time` during which both directions were active.
    pub contended_time: f64,
}

impl ContentionStats {
    fn record_drained(&mut self, direction: TransferDirection) {
        match direction {
            TransferDirection::DefaultToAlternate => self.completed_reads += 1,
            TransferDirection::AlternateToDefault => self.completed_writes += 1,
        }
    }
}

/// Tracks outstanding copies in both directions and times their completion.
///
/// Not synchronised: concurrent evaluations need one tracker each.
#[derive(Debug, Clone)]
pub struct CopyContentionTracker {
    bytes_per_second: f64,
    read_queue: VecDeque<OutstandingTransfer>,
    write_queue: VecDeque<OutstandingTransfer>,
    stats: ContentionStats,
}

impl CopyContentionTracker {
    /// Create a tracker with empty queues.
    pub fn new(bytes_per_second: f64) -> Self {
        Self::with_outstanding(bytes_per_second, VecDeque::new(), VecDeque::new())
    }

    /// Create a tracker resuming from copies already in flight.
    pub fn with_outstanding(
        bytes_per_second: f64,
        read_queue: impl Into<VecDeque<OutstandingTransfer>>,
        write_queue: impl Into<VecDeque<OutstandingTransfer>>,
    ) -> Self {
        debug_assert!(bytes_per_second > 0.0, "bandwidth must be positive");
        Self {
            bytes_per_second,
            read_queue: read_queue.into(),
            write_queue: write_queue.into(),
            stats: ContentionStats::default(),
        }
    }

    /// Configured default-memory bandwidth.
    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_per_second
    }

    /// Outstanding default-to-alternate copies, head first.
    pub fn read_queue(&self) -> &VecDeque<OutstandingTransfer> {
        &self.read_queue
    }

    /// Outstanding alternate-to-default copies, head first.
    pub fn write_queue(&self) -> &VecDeque<OutstandingTransfer> {
        &self.write_queue
    }

    /// Accumulated counters.
    pub fn stats(&self) -> &ContentionStats {
        &self.stats
    }

    /// True when nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.read_queue.is_empty() && self.write_queue.is_empty()
    }

    /// Direction `instruction` is queued in, if it is outstanding.
    pub fn direction_of(&self, instruction: InstructionId) -> Option<TransferDirection> {
        if self.read_queue.iter().any(|t| t.instruction == instruction) {
            Some(TransferDirection::DefaultToAlternate)
        } else if self.write_queue.iter().any(|t| t.instruction == instruction) {
            Some(TransferDirection::AlternateToDefault)
        } else {
            None
        }
    }

    /// Queue a new transfer behind the others in its direction.
    ///
    /// Costs no time; the time is charged when the copy is completed.
    pub fn register_transfer_start(
        &mut self,
        instruction: InstructionId,
        bytes: f64,
        direction: TransferDirection,
    ) {
        debug_assert!(bytes >= 0.0, "negative transfer size");
        debug_assert!(
            self.direction_of(instruction).is_none(),
            "{:?} registered twice",
            instruction
        );
        log::debug!("queue {} of {} bytes for {:?}", direction, bytes, instruction);
        self.queue_mut(direction)
            .push_back(OutstandingTransfer::new(instruction, bytes));
    }

    /// Advance time until the transfer issued by `instruction` finishes.
    ///
    /// Returns the elapsed time. Copies queued ahead of it in the same
    /// direction finish first; copies in the opposite direction progress
    /// concurrently and may finish along the way. A transfer that is not
    /// outstanding completes immediately with zero elapsed time and leaves
    /// both queues untouched.
    pub fn simulate_transfer_done(&mut self, instruction: InstructionId) -> f64 {
        let Some(direction) = self.direction_of(instruction) else {
            log::trace!("{:?} already complete", instruction);
            self.stats.stale_completions += 1;
            return 0.0;
        };

        let mut elapsed = 0.0;
        loop {
            let (step, drained) = self.step(direction);
            elapsed += step;
            if drained == Some(instruction) {
                break;
            }
        }

        self.stats.transfer_time += elapsed;
        log::debug!("{} {:?} done after {}", direction, instruction, elapsed);
        elapsed
    }

    /// Run both active heads until the first of them drains.
    ///
    /// `direction` is the side being waited on; its head must exist.
    /// Returns the time advanced and the instruction of the `direction` head
    /// if it drained during this step.
    fn step(&mut self, direction: TransferDirection) -> (f64, Option<InstructionId>) {
        let opposite = direction.opposite();
        let contended = !self.queue(opposite).is_empty();
        let rate = if contended {
            self.bytes_per_second / 2.0
        } else {
            self.bytes_per_second
        };

        let own_time = self
            .queue(direction)
            .front()
            .map(|head| head.remaining_bytes / rate)
            .unwrap_or(0.0);
        let other_time = self
            .queue(opposite)
            .front()
            .map(|head| head.remaining_bytes / rate)
            .unwrap_or(f64::INFINITY);
        let step = own_time.min(other_time);

        log::trace!(
            "step {}: {} for {} (own {}, other {})",
            direction,
            if contended { "contended" } else { "exclusive" },
            step,
            own_time,
            other_time
        );

        if contended {
            self.stats.contended_time += step;
            self.drain_head(opposite, rate * step, other_time <= step);
        }
        let drained = self.drain_head(direction, rate * step, own_time <= step);
        (step, drained)
    }

    /// Take `bytes` off the head of `direction`, popping it once drained.
    fn drain_head(
        &mut self,
        direction: TransferDirection,
        bytes: f64,
        finished: bool,
    ) -> Option<InstructionId> {
        let queue = self.queue_mut(direction);
        let head = queue.front_mut()?;
        head.remaining_bytes = if finished {
            0.0
        } else {
            (head.remaining_bytes - bytes).max(0.0)
        };
        if head.remaining_bytes > DRAINED_EPSILON {
            return None;
        }

        let done = queue.pop_front().map(|t| t.instruction);
        self.stats.record_drained(direction);
        done
    }

    fn queue(&self, direction: TransferDirection) -> &VecDeque<OutstandingTransfer> {
        match direction {
            TransferDirection::DefaultToAlternate => &self.read_queue,
            TransferDirection::AlternateToDefault => &self.write_queue,
        }
    }

    fn queue_mut(&mut self, direction: TransferDirection) -> &mut VecDeque<OutstandingTransfer> {
        match direction {
            TransferDirection::DefaultToAlternate => &mut self.read_queue,
            TransferDirection::AlternateToDefault => &mut self.write_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ: TransferDirection = TransferDirection::DefaultToAlternate;
    const WRITE: TransferDirection = TransferDirection::AlternateToDefault;

    fn id(n: u32) -> InstructionId {
        InstructionId(n)
    }

    /// Read of 512 bytes and write of 128 bytes, as if already in flight.
    fn seeded() -> CopyContentionTracker {
        CopyContentionTracker::with_outstanding(
            1.0,
            vec![OutstandingTransfer::new(id(1), 512.0)],
            vec![OutstandingTransfer::new(id(2), 128.0)],
        )
    }

    #[test]
    fn test_full_bandwidth() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 128.0 * 4.0, READ);

        assert_eq!(tracker.simulate_transfer_done(id(1)), 512.0);
        assert!(tracker.read_queue().is_empty());
        assert!(tracker.write_queue().is_empty());
    }

    #[test]
    fn test_already_completed_is_free() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 512.0, READ);
        tracker.simulate_transfer_done(id(1));
        assert!(tracker.is_idle());

        assert_eq!(tracker.simulate_transfer_done(id(1)), 0.0);
        assert!(tracker.is_idle());
        assert_eq!(tracker.stats().stale_completions, 1);
    }

    #[test]
    fn test_unknown_completion_leaves_queues() {
        let mut tracker = seeded();
        assert_eq!(tracker.simulate_transfer_done(id(99)), 0.0);
        assert_eq!(tracker.read_queue(), &[OutstandingTransfer::new(id(1), 512.0)]);
        assert_eq!(tracker.write_queue(), &[OutstandingTransfer::new(id(2), 128.0)]);
    }

    #[test]
    fn test_shared_bandwidth() {
        let mut tracker = seeded();

        // 128 bytes at half bandwidth
        assert_eq!(tracker.simulate_transfer_done(id(2)), 256.0);
        assert!(tracker.write_queue().is_empty());
        assert_eq!(tracker.read_queue(), &[OutstandingTransfer::new(id(1), 384.0)]);
    }

    #[test]
    fn test_partial_then_full_bandwidth() {
        let mut tracker = seeded();

        assert_eq!(tracker.simulate_transfer_done(id(2)), 256.0);
        assert_eq!(tracker.simulate_transfer_done(id(1)), 384.0);
        assert!(tracker.is_idle());

        let stats = tracker.stats();
        assert_eq!(stats.completed_reads, 1);
        assert_eq!(stats.completed_writes, 1);
        assert_eq!(stats.transfer_time, 640.0);
        assert_eq!(stats.contended_time, 256.0);
    }

    #[test]
    fn test_opposite_drains_mid_wait() {
        let mut tracker = seeded();

        // Write drains at t=256 leaving 384 read bytes at full rate.
        assert_eq!(tracker.simulate_transfer_done(id(1)), 640.0);
        assert!(tracker.is_idle());
        assert_eq!(tracker.stats().completed_writes, 1);
    }

    #[test]
    fn test_waits_for_same_direction_head() {
        let mut tracker = CopyContentionTracker::new(2.0);
        tracker.register_transfer_start(id(1), 100.0, READ);
        tracker.register_transfer_start(id(2), 50.0, READ);

        assert_eq!(tracker.simulate_transfer_done(id(2)), 75.0);
        assert!(tracker.is_idle());
        assert_eq!(tracker.simulate_transfer_done(id(1)), 0.0);
    }

    #[test]
    fn test_queued_behind_untouched() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 100.0, WRITE);
        tracker.register_transfer_start(id(2), 100.0, WRITE);
        tracker.register_transfer_start(id(3), 40.0, READ);

        assert_eq!(tracker.simulate_transfer_done(id(3)), 80.0);
        assert_eq!(
            tracker.write_queue(),
            &[
                OutstandingTransfer::new(id(1), 60.0),
                OutstandingTransfer::new(id(2), 100.0),
            ]
        );
    }

    #[test]
    fn test_multiple_opposite_heads_drain() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 10.0, WRITE);
        tracker.register_transfer_start(id(2), 10.0, WRITE);
        tracker.register_transfer_start(id(3), 100.0, READ);

        // Two writes at half rate (40 time units), 80 read bytes left at full rate.
        assert_eq!(tracker.simulate_transfer_done(id(3)), 120.0);
        assert!(tracker.is_idle());
        assert_eq!(tracker.stats().completed_writes, 2);
        assert_eq!(tracker.stats().contended_time, 40.0);
    }

    #[test]
    fn test_simultaneous_drain() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 64.0, READ);
        tracker.register_transfer_start(id(2), 64.0, WRITE);

        assert_eq!(tracker.simulate_transfer_done(id(1)), 128.0);
        assert!(tracker.is_idle());
        assert_eq!(tracker.simulate_transfer_done(id(2)), 0.0);
    }

    #[test]
    fn test_zero_byte_transfer() {
        let mut tracker = CopyContentionTracker::new(1.0);
        tracker.register_transfer_start(id(1), 0.0, READ);
        tracker.register_transfer_start(id(2), 64.0, WRITE);

        assert_eq!(tracker.simulate_transfer_done(id(1)), 0.0);
        assert!(tracker.read_queue().is_empty());
        assert_eq!(tracker.write_queue(), &[OutstandingTransfer::new(id(2), 64.0)]);
    }

    #[test]
    fn test_direction_display_and_opposite() {
        assert_eq!(READ.to_string(), "read");
        assert_eq!(WRITE.to_string(), "write");
        assert_eq!(READ.opposite(), WRITE);
        assert_eq!(WRITE.opposite(), READ);
    }
}
