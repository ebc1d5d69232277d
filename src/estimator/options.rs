//! Estimator tuning knobs.

use serde::{Deserialize, Serialize};

use crate::program::MemorySpace;

/// How conditionals are charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalPolicy {
    /// Sum every branch, as if all of them ran in sequence.
    #[default]
    AllBranches,
    /// Charge only the slowest branch and keep its copy-queue effects.
    MostExpensiveBranch,
}

/// Options fixed for the lifetime of a [`TimelineEstimator`](super::TimelineEstimator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    /// Memory space id of the fast tier.
    pub alternate_memory_space: MemorySpace,
    /// Iterations assumed for loops without a known trip count.
    pub unknown_trip_count: u64,
    /// Maximum depth of nested loops, conditionals and calls.
    pub max_nesting_depth: usize,
    /// Conditional charging policy.
    pub conditional_policy: ConditionalPolicy,
}

impl EstimatorOptions {
    pub const DEFAULT_ALTERNATE_MEMORY_SPACE: MemorySpace = MemorySpace(1);
    pub const DEFAULT_UNKNOWN_TRIP_COUNT: u64 = 5;
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

    pub fn with_alternate_memory_space(mut self, space: MemorySpace) -> Self {
        self.alternate_memory_space = space;
        self
    }

    pub fn with_unknown_trip_count(mut self, iterations: u64) -> Self {
        self.unknown_trip_count = iterations;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_conditional_policy(mut self, policy: ConditionalPolicy) -> Self {
        self.conditional_policy = policy;
        self
    }
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            alternate_memory_space: Self::DEFAULT_ALTERNATE_MEMORY_SPACE,
            unknown_trip_count: Self::DEFAULT_UNKNOWN_TRIP_COUNT,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
            conditional_policy: ConditionalPolicy::AllBranches,
        }
    }
}
