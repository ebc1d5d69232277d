//! Buffer placement decisions handed to the estimator.
//!
//! The timing walk reads placement from the memory-space annotations of
//! copy instructions; the allocation list is carried alongside for callers
//! that want to report on it.

use crate::program::{InstructionId, MemorySpace};

/// One placed buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Instruction defining the buffer.
    pub instruction: InstructionId,
    /// Tier the buffer lives in.
    pub memory_space: MemorySpace,
    /// First schedule position the buffer is live.
    pub start_time: u64,
    /// Last schedule position the buffer is live.
    pub end_time: u64,
    /// True when the buffer is produced by an asynchronous copy.
    pub is_copy: bool,
}

/// Ordered placement decisions of one plan.
#[derive(Debug, Clone, Default)]
pub struct AllocationSequence {
    allocations: Vec<Allocation>,
}

impl AllocationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, allocation: Allocation) {
        self.allocations.push(allocation);
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.iter()
    }

    /// Allocations placed in `space`.
    pub fn count_in(&self, space: MemorySpace) -> usize {
        self.allocations
            .iter()
            .filter(|a| a.memory_space == space)
            .count()
    }
}

impl FromIterator<Allocation> for AllocationSequence {
    fn from_iter<I: IntoIterator<Item = Allocation>>(iter: I) -> Self {
        Self {
            allocations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_in_space() {
        let alt = MemorySpace(1);
        let seq: AllocationSequence = [
            (InstructionId(0), MemorySpace::DEFAULT, false),
            (InstructionId(1), alt, true),
            (InstructionId(2), alt, false),
        ]
        .into_iter()
        .map(|(instruction, memory_space, is_copy)| Allocation {
            instruction,
            memory_space,
            start_time: 0,
            end_time: 1,
            is_copy,
        })
        .collect();

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.count_in(alt), 2);
        assert_eq!(seq.count_in(MemorySpace::DEFAULT), 1);
        assert_eq!(seq.iter().filter(|a| a.is_copy).count(), 1);
    }
}
