//! Configuration management for msa-sim.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (MSA_SIM_BYTES_PER_SECOND, etc.)
//! 2. Project-local config file (`./msa-sim.toml`)
//! 3. User config file (`~/.config/msa-sim/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # msa-sim.toml
//!
//! # Device compute rate
//! flops_per_second = 1.0e12
//!
//! # Default-memory bandwidth shared by prefetches and evictions
//! bytes_per_second = 1.0e11
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::estimator::{ConditionalPolicy, EstimatorOptions};
use crate::program::MemorySpace;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// msa-sim configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Device compute rate in flop/s.
    pub flops_per_second: Option<f64>,

    /// Default-memory transfer rate in bytes/s.
    pub bytes_per_second: Option<f64>,

    /// Memory space id of the alternate (fast) tier.
    pub alternate_memory_space: Option<i64>,

    /// Bytes per tuple element.
    pub pointer_size: Option<u64>,

    /// Iterations assumed for loops without a known trip count.
    pub unknown_trip_count: Option<u64>,

    /// Maximum nesting of loops, conditionals and calls.
    pub max_nesting_depth: Option<usize>,

    /// How conditionals are charged.
    pub conditional_policy: Option<ConditionalPolicy>,
}

impl Config {
    pub const DEFAULT_FLOPS_PER_SECOND: f64 = 1.0e12;
    pub const DEFAULT_BYTES_PER_SECOND: f64 = 1.0e11;
    pub const DEFAULT_POINTER_SIZE: u64 = 8;

    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `msa-sim.toml`
    /// 3. User config `~/.config/msa-sim/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    pub fn flops_per_second(&self) -> f64 {
        self.flops_per_second.unwrap_or(Self::DEFAULT_FLOPS_PER_SECOND)
    }

    pub fn bytes_per_second(&self) -> f64 {
        self.bytes_per_second.unwrap_or(Self::DEFAULT_BYTES_PER_SECOND)
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size.unwrap_or(Self::DEFAULT_POINTER_SIZE)
    }

    /// Estimator options with unset fields taken from the defaults.
    pub fn estimator_options(&self) -> EstimatorOptions {
        let defaults = EstimatorOptions::default();
        EstimatorOptions {
            alternate_memory_space: self
                .alternate_memory_space
                .map(MemorySpace)
                .unwrap_or(defaults.alternate_memory_space),
            unknown_trip_count: self.unknown_trip_count.unwrap_or(defaults.unknown_trip_count),
            max_nesting_depth: self.max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
            conditional_policy: self.conditional_policy.unwrap_or(defaults.conditional_policy),
        }
    }

    /// Load user configuration from ~/.config/msa-sim/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./msa-sim.toml
    fn load_local_config() -> Option<Self> {
        let local_path = Path::new("msa-sim.toml");
        if let Some(config) = Self::load_from_file(local_path) {
            return Some(config);
        }

        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let project_path = Path::new(&manifest_dir).join("msa-sim.toml");
            if let Some(config) = Self::load_from_file(&project_path) {
                return Some(config);
            }
        }

        None
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.flops_per_second.is_some() {
            self.flops_per_second = other.flops_per_second;
        }
        if other.bytes_per_second.is_some() {
            self.bytes_per_second = other.bytes_per_second;
        }
        if other.alternate_memory_space.is_some() {
            self.alternate_memory_space = other.alternate_memory_space;
        }
        if other.pointer_size.is_some() {
            self.pointer_size = other.pointer_size;
        }
        if other.unknown_trip_count.is_some() {
            self.unknown_trip_count = other.unknown_trip_count;
        }
        if other.max_nesting_depth.is_some() {
            self.max_nesting_depth = other.max_nesting_depth;
        }
        if other.conditional_policy.is_some() {
            self.conditional_policy = other.conditional_policy;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("MSA_SIM_FLOPS_PER_SECOND") {
            self.flops_per_second = Some(v);
        }
        if let Some(v) = env_parse("MSA_SIM_BYTES_PER_SECOND") {
            self.bytes_per_second = Some(v);
        }
        if let Some(v) = env_parse("MSA_SIM_ALTERNATE_MEMORY_SPACE") {
            self.alternate_memory_space = Some(v);
        }
        if let Some(v) = env_parse("MSA_SIM_UNKNOWN_TRIP_COUNT") {
            self.unknown_trip_count = Some(v);
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("msa-sim").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# msa-sim configuration
# Place this file at ~/.config/msa-sim/config.toml or ./msa-sim.toml

# Device compute rate (flop/s)
flops_per_second = 1.0e12

# Default-memory bandwidth (bytes/s), split evenly when reads and writes overlap
bytes_per_second = 1.0e11

# Memory space id of the fast tier
# alternate_memory_space = 1

# Bytes per tuple element when sizing tuple copies
# pointer_size = 8

# Iterations assumed for loops without a known trip count
# unknown_trip_count = 5

# Deepest while/conditional/call nesting walked before giving up
# max_nesting_depth = 64

# "all_branches" or "most_expensive_branch"
# conditional_policy = "all_branches"
"#
        .to_string()
    }
}

/// Parse an environment variable, ignoring it with a warning if malformed.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => {
            log::info!("Using {} from environment: {}", name, raw);
            Some(v)
        }
        Err(_) => {
            log::warn!("Ignoring malformed {}: {}", name, raw);
            None
        }
    }
}
