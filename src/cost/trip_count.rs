//! Loop trip counts.
//!
//! Trip counts are supplied, never inferred. A missing entry means the
//! count is unknown and the estimator falls back to its configured value.

use std::collections::HashMap;

use crate::program::InstructionId;

/// Source of while-loop iteration counts.
pub trait TripCountProvider {
    /// Iterations of the while loop `id`, if known.
    fn trip_count(&self, id: InstructionId) -> Option<u64>;
}

/// Trip counts keyed by while instruction.
#[derive(Debug, Clone, Default)]
pub struct TripCounts {
    counts: HashMap<InstructionId, u64>,
}

impl TripCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the iteration count of a loop.
    pub fn set(&mut self, id: InstructionId, iterations: u64) {
        self.counts.insert(id, iterations);
    }

    pub fn get(&self, id: InstructionId) -> Option<u64> {
        self.counts.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl TripCountProvider for TripCounts {
    fn trip_count(&self, id: InstructionId) -> Option<u64> {
        self.get(id)
    }
}

impl TripCountProvider for HashMap<InstructionId, u64> {
    fn trip_count(&self, id: InstructionId) -> Option<u64> {
        self.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_counts_lookup() {
        let mut counts = TripCounts::new();
        assert!(counts.is_empty());
        counts.set(InstructionId(3), 42);
        assert_eq!(counts.trip_count(InstructionId(3)), Some(42));
        assert_eq!(counts.trip_count(InstructionId(4)), None);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_hash_map_provider() {
        let map: HashMap<InstructionId, u64> = [(InstructionId(1), 7)].into_iter().collect();
        assert_eq!(map.trip_count(InstructionId(1)), Some(7));
    }
}
