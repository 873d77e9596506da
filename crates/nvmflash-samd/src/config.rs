//! Driver configuration
//!
//! The defaults match SAMD20/SAMD21 parts. Everything here can be overridden
//! with the builder methods or, with the `std` feature, loaded from RON:
//!
//! ```ron
//! (
//!     nvmctrl_base: 0x41004000,
//!     poll_delay_us: 10,
//!     erase_timeout_us: 500000,
//!     write_timeout_us: 100000,
//!     erase_weight: 0.048,
//!     program_weight: 0.130,
//! )
//! ```

use crate::regs::NVMCTRL_BASE;
use nvmflash_core::{DEFAULT_PAGE_ERASE_WEIGHT, DEFAULT_PAGE_PROGRAM_WEIGHT};

/// Default interval between READY polls
pub const DEFAULT_POLL_DELAY_US: u32 = 10;
/// Default bound for a row erase (typical is a few ms)
pub const DEFAULT_ERASE_TIMEOUT_US: u32 = 500_000;
/// Default bound for a page write and the other commands
pub const DEFAULT_WRITE_TIMEOUT_US: u32 = 100_000;

/// Configuration for [`SamdFlash`](crate::SamdFlash)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct SamdConfig {
    /// NVMCTRL register block base address
    pub nvmctrl_base: u32,
    /// Delay between READY polls in microseconds
    pub poll_delay_us: u32,
    /// Maximum time to wait for a row erase in microseconds
    pub erase_timeout_us: u32,
    /// Maximum time to wait for any other command in microseconds
    pub write_timeout_us: u32,
    /// Relative cost of erasing one row
    pub erase_weight: f32,
    /// Relative cost of programming one row
    pub program_weight: f32,
}

impl Default for SamdConfig {
    fn default() -> Self {
        Self {
            nvmctrl_base: NVMCTRL_BASE,
            poll_delay_us: DEFAULT_POLL_DELAY_US,
            erase_timeout_us: DEFAULT_ERASE_TIMEOUT_US,
            write_timeout_us: DEFAULT_WRITE_TIMEOUT_US,
            erase_weight: DEFAULT_PAGE_ERASE_WEIGHT,
            program_weight: DEFAULT_PAGE_PROGRAM_WEIGHT,
        }
    }
}

impl SamdConfig {
    /// Set the NVMCTRL base address
    pub fn with_base(mut self, base: u32) -> Self {
        self.nvmctrl_base = base;
        self
    }

    /// Set the READY poll interval
    pub fn with_poll_delay_us(mut self, us: u32) -> Self {
        self.poll_delay_us = us;
        self
    }

    /// Set both command timeouts
    pub fn with_timeouts_us(mut self, erase: u32, write: u32) -> Self {
        self.erase_timeout_us = erase;
        self.write_timeout_us = write;
        self
    }

    /// Override the cost hints reported to the orchestrator
    pub fn with_weights(mut self, erase: f32, program: f32) -> Self {
        self.erase_weight = erase;
        self.program_weight = program;
        self
    }
}

#[cfg(feature = "std")]
mod load {
    use super::SamdConfig;
    use std::path::Path;
    use thiserror::Error;

    /// Errors loading a [`SamdConfig`]
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Failed to read the file
        #[error("Failed to read {path}: {source}")]
        Io {
            path: String,
            #[source]
            source: std::io::Error,
        },

        /// RON syntax or type error
        #[error("Failed to parse config: {0}")]
        Parse(#[from] ron::error::SpannedError),

        /// Parsed but unusable values
        #[error("Invalid config: {0}")]
        Invalid(&'static str),
    }

    impl SamdConfig {
        /// Parse a config from RON text; missing fields take their defaults
        pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
            let config: SamdConfig = ron::from_str(content)?;
            config.validate()?;
            Ok(config)
        }

        /// Load a config from a RON file
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_ron(&content)
        }

        fn validate(&self) -> Result<(), ConfigError> {
            if self.nvmctrl_base % 4 != 0 {
                return Err(ConfigError::Invalid("nvmctrl_base must be word aligned"));
            }
            if self.poll_delay_us == 0 {
                return Err(ConfigError::Invalid("poll_delay_us must be non-zero"));
            }
            if self.erase_timeout_us == 0 || self.write_timeout_us == 0 {
                return Err(ConfigError::Invalid("timeouts must be non-zero"));
            }
            if self.erase_weight < 0.0 || self.program_weight < 0.0 {
                return Err(ConfigError::Invalid("weights must not be negative"));
            }
            Ok(())
        }
    }
}

#[cfg(feature = "std")]
pub use load::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = SamdConfig::default()
            .with_base(0x4100_8000)
            .with_poll_delay_us(0)
            .with_timeouts_us(1_000, 500)
            .with_weights(1.0, 2.0);
        assert_eq!(config.nvmctrl_base, 0x4100_8000);
        assert_eq!(config.poll_delay_us, 0);
        assert_eq!(config.erase_timeout_us, 1_000);
        assert_eq!(config.write_timeout_us, 500);
        assert_eq!(config.erase_weight, 1.0);
        assert_eq!(config.program_weight, 2.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_ron_partial() {
        let config = SamdConfig::from_ron("(poll_delay_us: 50, erase_weight: 0.5)").unwrap();
        assert_eq!(config.poll_delay_us, 50);
        assert_eq!(config.erase_weight, 0.5);
        assert_eq!(config.nvmctrl_base, NVMCTRL_BASE);
        assert_eq!(config.write_timeout_us, DEFAULT_WRITE_TIMEOUT_US);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_ron_rejects_bad_values() {
        assert!(matches!(
            SamdConfig::from_ron("(nvmctrl_base: 0x41004002)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SamdConfig::from_ron("(erase_timeout_us: 0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SamdConfig::from_ron("(poll_delay_us: 0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SamdConfig::from_ron("(bogus"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_file_missing() {
        let err = SamdConfig::from_file("/nonexistent/samd.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
