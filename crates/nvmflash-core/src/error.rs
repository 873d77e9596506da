//! Error types for nvmflash-core
//!
//! This module provides a no_std compatible error type shared by the target
//! abstraction and every flash algorithm.

use core::fmt;

/// A caller-side contract violation
///
/// These are never retried: they indicate a bug in the caller or a target
/// that cannot be brought into a state where programming is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The algorithm was used before `init()` discovered the flash geometry
    NotInitialized,
    /// Program address is not aligned to the page size
    Misaligned {
        /// Address passed by the caller
        addr: u32,
        /// Required alignment in bytes
        align: u32,
    },
    /// Operation extends beyond the end of flash
    OutOfBounds {
        /// Start address of the operation
        addr: u32,
        /// Length of the operation in bytes
        len: u32,
    },
    /// The target refused to halt
    HaltFailed,
    /// The target could not be switched into the programming state
    ProgramStateFailed,
    /// The controller reported a flash geometry that cannot be used
    InvalidGeometry {
        /// Raw value of the parameter register
        param: u32,
    },
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Contract violation, see [`Precondition`]
    Precondition(Precondition),
    /// The controller never reported ready within the configured bound
    HardwareTimeout {
        /// Flash address of the operation that timed out
        addr: u32,
    },
    /// The controller completed a command but flagged a fault
    ControllerError {
        /// Flash address of the failing operation
        addr: u32,
        /// Raw error bits from the status register
        status: u8,
    },
    /// The debug target failed a memory access
    TargetAccess {
        /// Address of the failed access
        addr: u32,
    },
}

impl Error {
    /// Whether the caller may reasonably retry the whole operation
    ///
    /// Only hardware-side failures qualify; precondition violations will fail
    /// the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HardwareTimeout { .. } | Self::ControllerError { .. } | Self::TargetAccess { .. }
        )
    }

    /// Address associated with the failure, if any
    pub fn addr(&self) -> Option<u32> {
        match self {
            Self::Precondition(Precondition::Misaligned { addr, .. })
            | Self::Precondition(Precondition::OutOfBounds { addr, .. })
            | Self::HardwareTimeout { addr }
            | Self::ControllerError { addr, .. }
            | Self::TargetAccess { addr } => Some(*addr),
            Self::Precondition(_) => None,
        }
    }
}

impl From<Precondition> for Error {
    fn from(p: Precondition) -> Self {
        Self::Precondition(p)
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "flash algorithm not initialized"),
            Self::Misaligned { addr, align } => {
                write!(f, "address 0x{:08X} is not aligned to {} bytes", addr, align)
            }
            Self::OutOfBounds { addr, len } => {
                write!(
                    f,
                    "range 0x{:08X}+0x{:X} is beyond the end of flash",
                    addr, len
                )
            }
            Self::HaltFailed => write!(f, "target could not be halted"),
            Self::ProgramStateFailed => write!(f, "target could not enter programming state"),
            Self::InvalidGeometry { param } => {
                write!(f, "invalid flash geometry (PARAM = 0x{:08X})", param)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition(p) => write!(f, "precondition violated: {}", p),
            Self::HardwareTimeout { addr } => {
                write!(f, "controller timed out at address 0x{:08X}", addr)
            }
            Self::ControllerError { addr, status } => {
                write!(
                    f,
                    "controller error at address 0x{:08X}: status 0x{:02X}",
                    addr, status
                )
            }
            Self::TargetAccess { addr } => {
                write!(f, "target memory access failed at 0x{:08X}", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(Error::HardwareTimeout { addr: 0 }.is_retryable());
        assert!(Error::ControllerError { addr: 0, status: 0x04 }.is_retryable());
        assert!(!Error::from(Precondition::NotInitialized).is_retryable());
        assert!(!Error::from(Precondition::Misaligned { addr: 1, align: 64 }).is_retryable());
    }

    #[test]
    fn test_addr() {
        assert_eq!(Error::HardwareTimeout { addr: 0x100 }.addr(), Some(0x100));
        assert_eq!(
            Error::from(Precondition::Misaligned { addr: 0x21, align: 32 }).addr(),
            Some(0x21)
        );
        assert_eq!(Error::from(Precondition::HaltFailed).addr(), None);
    }
}
