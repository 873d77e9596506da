//! NVMCTRL command/status protocol
//!
//! Every operation follows the same handshake: optionally load ADDR, write
//! the command together with the execution key to CTRLA, poll INTFLAG.READY,
//! then check STATUS. Only one command is ever in flight.
//!
//! Uses `maybe_async` to support both sync and async modes.

use crate::regs::*;
use maybe_async::maybe_async;
use nvmflash_core::{Error, Result, Target};

/// Handle to an NVMCTRL register block on a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nvmctrl {
    base: u32,
}

/// How long and how often to poll for READY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between polls in microseconds
    pub poll_delay_us: u32,
    /// Maximum time to wait in microseconds
    pub timeout_us: u32,
}

impl WaitPolicy {
    /// Number of READY reads allowed before giving up
    ///
    /// With a zero poll delay nothing measures time, so `timeout_us` bounds
    /// the number of back-to-back reads instead.
    pub fn max_polls(&self) -> u32 {
        if self.poll_delay_us > 0 {
            // One read at t=0 plus one after every full delay
            self.timeout_us / self.poll_delay_us + 1
        } else {
            // No delay between reads: the timeout is taken as a read count
            self.timeout_us.max(1)
        }
    }
}

impl Nvmctrl {
    /// Create a handle for the register block at `base`
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    /// Base address of the register block
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Absolute address of a register
    pub const fn reg(&self, offset: u32) -> u32 {
        self.base + offset
    }

    /// Read the raw PARAM register
    #[maybe_async]
    pub async fn read_param<T: Target + ?Sized>(&self, target: &mut T) -> Result<u32> {
        target.read32(self.reg(NVMCTRL_PARAM)).await
    }

    /// Read CTRLB
    #[maybe_async]
    pub async fn read_ctrlb<T: Target + ?Sized>(&self, target: &mut T) -> Result<CtrlB> {
        let raw = target.read32(self.reg(NVMCTRL_CTRLB)).await?;
        Ok(CtrlB::from_bits_truncate(raw))
    }

    /// Load ADDR with the half-word address of `addr`
    #[maybe_async]
    pub async fn set_addr<T: Target + ?Sized>(&self, target: &mut T, addr: u32) -> Result<()> {
        log::trace!("NVMCTRL: ADDR <- 0x{:08X} (0x{:08X})", addr >> 1, addr);
        target.write32(self.reg(NVMCTRL_ADDR), addr >> 1).await
    }

    /// Issue `cmd` and wait for it to complete
    ///
    /// `addr` is the flash address the command acts on and is only used to
    /// annotate errors.
    #[maybe_async]
    pub async fn execute<T: Target + ?Sized>(
        &self,
        target: &mut T,
        cmd: NvmCommand,
        addr: u32,
        policy: WaitPolicy,
    ) -> Result<()> {
        log::trace!("NVMCTRL: CTRLA <- 0x{:04X} ({:?})", ctrla_exec(cmd), cmd);
        target.write16(self.reg(NVMCTRL_CTRLA), ctrla_exec(cmd)).await?;
        self.wait(target, addr, policy).await
    }

    /// Wait for READY, then check STATUS for errors
    ///
    /// Used on its own after the page buffer was filled completely, in which
    /// case the controller starts the page write by itself.
    #[maybe_async]
    pub async fn wait<T: Target + ?Sized>(
        &self,
        target: &mut T,
        addr: u32,
        policy: WaitPolicy,
    ) -> Result<()> {
        self.wait_ready(target, addr, policy).await?;
        self.check_status(target, addr).await
    }

    /// Poll INTFLAG.READY until set or the policy runs out
    #[maybe_async]
    pub async fn wait_ready<T: Target + ?Sized>(
        &self,
        target: &mut T,
        addr: u32,
        policy: WaitPolicy,
    ) -> Result<()> {
        let max_polls = policy.max_polls();

        for poll in 0..max_polls {
            let flags = IntFlag::from_bits_truncate(target.read8(self.reg(NVMCTRL_INTFLAG)).await?);
            if flags.contains(IntFlag::READY) {
                return Ok(());
            }
            if poll + 1 < max_polls && policy.poll_delay_us > 0 {
                target.delay_us(policy.poll_delay_us).await;
            }
        }

        log::error!(
            "NVMCTRL: not ready after {} us (address 0x{:08X})",
            policy.timeout_us,
            addr
        );
        Err(Error::HardwareTimeout { addr })
    }

    /// Read STATUS and turn any error bit into [`Error::ControllerError`]
    ///
    /// The sticky error bits are written back to clear them so the next
    /// command starts from a clean STATUS.
    #[maybe_async]
    pub async fn check_status<T: Target + ?Sized>(&self, target: &mut T, addr: u32) -> Result<()> {
        let status = target.read8(self.reg(NVMCTRL_STATUS)).await? & STATUS_ERROR_MASK;
        if status != 0 {
            log::error!(
                "NVMCTRL: status 0x{:02X} ({:?}) at address 0x{:08X}",
                status,
                Status::from_bits_truncate(status),
                addr
            );
            if let Err(e) = target
                .write16(self.reg(NVMCTRL_STATUS), status as u16)
                .await
            {
                log::warn!("NVMCTRL: failed to clear status bits: {}", e);
            }
            return Err(Error::ControllerError { addr, status });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_polls() {
        let policy = WaitPolicy {
            poll_delay_us: 10,
            timeout_us: 100,
        };
        assert_eq!(policy.max_polls(), 11);

        let policy = WaitPolicy {
            poll_delay_us: 0,
            timeout_us: 0,
        };
        assert_eq!(policy.max_polls(), 1);
    }

    #[test]
    fn test_reg_addresses() {
        let nvm = Nvmctrl::new(NVMCTRL_BASE);
        assert_eq!(nvm.reg(NVMCTRL_CTRLA), 0x4100_4000);
        assert_eq!(nvm.reg(NVMCTRL_CTRLB), 0x4100_4004);
        assert_eq!(nvm.reg(NVMCTRL_PARAM), 0x4100_4008);
        assert_eq!(nvm.reg(NVMCTRL_INTFLAG), 0x4100_4014);
        assert_eq!(nvm.reg(NVMCTRL_STATUS), 0x4100_4018);
        assert_eq!(nvm.reg(NVMCTRL_ADDR), 0x4100_401C);
    }
}
