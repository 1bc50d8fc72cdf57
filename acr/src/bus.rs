// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register access layer.
//!
//! The falcon running the ACR can only issue loads and stores to its own
//! local register space; that is the whole of [`RegisterBus`]. Registers in
//! the indirect space (the rest of the chip) are reached through the local
//! bus-master registers: program the target address, trigger a command,
//! wait for the master to go idle, then check its error bit.
//! [`RegisterAccess`] implements that protocol, plus error-status checking
//! of local accesses, on top of a `RegisterBus`.
//!
//! All waits here are bounded by the [`PollBudget`]. Running out of polls is
//! reported as [`AcrError::RegisterAccessFault`]; whether that halts the
//! boot is the caller's decision.

use log::{error, trace};
use tock_registers::fields::FieldValue;
use tock_registers::{LocalRegisterCopy, RegisterLongName};

use crate::config::PollBudget;
use crate::regs::{self, BusCsrVal, BUS_CSR, ERR_STAT};
use crate::AcrError;

/// The two register address spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterSpace {
    /// The falcon's own registers, accessed directly.
    Local,
    /// Chip registers, routed through the bus master.
    Indirect,
}

/// Raw loads and stores to the local register space.
///
/// On hardware this is a pair of volatile accesses. Implementations must not
/// cache or buffer.
pub trait RegisterBus {
    fn load(&self, offset: u32) -> u32;
    fn store(&self, offset: u32, value: u32);
}

/// Typed, error-checked access to both register spaces.
pub struct RegisterAccess<'a> {
    bus: &'a dyn RegisterBus,
    budget: PollBudget,
    trace_writes: bool,
}

impl<'a> RegisterAccess<'a> {
    pub fn new(bus: &'a dyn RegisterBus, budget: PollBudget) -> Self {
        RegisterAccess {
            bus,
            budget,
            trace_writes: false,
        }
    }

    /// Logs every write at `trace` level.
    pub fn with_write_tracing(mut self, enabled: bool) -> Self {
        self.trace_writes = enabled;
        self
    }

    pub fn budget(&self) -> PollBudget {
        self.budget
    }

    /// Reads a register.
    ///
    /// Every access is followed by a check of the matching error status, so
    /// a fault is never returned as data.
    pub fn read(&self, space: RegisterSpace, offset: u32) -> Result<u32, AcrError> {
        match space {
            RegisterSpace::Local => {
                let value = self.bus.load(offset);
                self.check_local_error(offset)?;
                Ok(value)
            }
            RegisterSpace::Indirect => {
                self.bus.store(regs::local::BUS_ADDR, offset);
                self.trigger(BUS_CSR::CMD::Read)?;
                self.wait_bus_idle(offset)?;
                Ok(self.bus.load(regs::local::BUS_DATA))
            }
        }
    }

    /// Writes a register and waits until the write has landed.
    pub fn write_blocking(
        &self,
        space: RegisterSpace,
        offset: u32,
        value: u32,
    ) -> Result<(), AcrError> {
        if self.trace_writes {
            trace!("write {:?} {:#08x} <- {:#010x}", space, offset, value);
        }
        match space {
            RegisterSpace::Local => {
                self.bus.store(offset, value);
                self.check_local_error(offset)
            }
            RegisterSpace::Indirect => {
                self.bus.store(regs::local::BUS_ADDR, offset);
                self.bus.store(regs::local::BUS_DATA, value);
                self.trigger(BUS_CSR::CMD::Write)?;
                self.wait_bus_idle(offset)
            }
        }
    }

    /// Posts a write without checking its completion.
    ///
    /// The bus status is sampled once so the master sees the command
    /// retired, but neither busy nor error is acted upon. Only for posted
    /// write patterns where skipping the status check is known to be safe,
    /// such as broadcasts to a cluster of sub-engines.
    pub fn write_nonblocking(
        &self,
        space: RegisterSpace,
        offset: u32,
        value: u32,
    ) -> Result<(), AcrError> {
        if self.trace_writes {
            trace!("posted write {:?} {:#08x} <- {:#010x}", space, offset, value);
        }
        match space {
            RegisterSpace::Local => self.bus.store(offset, value),
            RegisterSpace::Indirect => {
                self.bus.store(regs::local::BUS_ADDR, offset);
                self.bus.store(regs::local::BUS_DATA, value);
                self.trigger(BUS_CSR::CMD::Write)?;
                let _ = self.bus.load(regs::local::BUS_CSR);
            }
        }
        Ok(())
    }

    /// Reads a register as a typed local copy.
    pub fn read_reg<R: RegisterLongName>(
        &self,
        space: RegisterSpace,
        offset: u32,
    ) -> Result<LocalRegisterCopy<u32, R>, AcrError> {
        self.read(space, offset).map(LocalRegisterCopy::new)
    }

    /// Read-modify-write of the given fields, with a blocking write.
    pub fn modify<R: RegisterLongName>(
        &self,
        space: RegisterSpace,
        offset: u32,
        field: FieldValue<u32, R>,
    ) -> Result<(), AcrError> {
        let mut reg = self.read_reg::<R>(space, offset)?;
        reg.modify(field);
        self.write_blocking(space, offset, reg.get())
    }

    /// Polls `offset` until `done` holds, for at most `polls` reads.
    pub fn poll_until<R: RegisterLongName>(
        &self,
        space: RegisterSpace,
        offset: u32,
        polls: u32,
        done: impl Fn(&LocalRegisterCopy<u32, R>) -> bool,
    ) -> Result<LocalRegisterCopy<u32, R>, AcrError> {
        for _ in 0..polls {
            let reg = self.read_reg::<R>(space, offset)?;
            if done(&reg) {
                return Ok(reg);
            }
        }
        error!("timed out polling {:?} {:#08x}", space, offset);
        Err(AcrError::RegisterAccessFault)
    }

    fn trigger(&self, cmd: FieldValue<u32, BUS_CSR::Register>) -> Result<(), AcrError> {
        let mut csr = BusCsrVal::new(0);
        csr.modify(cmd + BUS_CSR::BYTE_ENABLE.val(0xf) + BUS_CSR::TRIGGER::SET);
        self.bus.store(regs::local::BUS_CSR, csr.get());
        self.check_local_error(regs::local::BUS_CSR)
    }

    fn wait_bus_idle(&self, target: u32) -> Result<(), AcrError> {
        for _ in 0..self.budget.register_idle_polls {
            let csr = BusCsrVal::new(self.bus.load(regs::local::BUS_CSR));
            if csr.is_set(BUS_CSR::BUSY) {
                continue;
            }
            if csr.is_set(BUS_CSR::ERROR) {
                error!("bus error accessing {:#08x}", target);
                return Err(AcrError::RegisterAccessFault);
            }
            return Ok(());
        }
        error!("bus master stuck busy accessing {:#08x}", target);
        Err(AcrError::RegisterAccessFault)
    }

    fn check_local_error(&self, offset: u32) -> Result<(), AcrError> {
        let stat = LocalRegisterCopy::<u32, ERR_STAT::Register>::new(
            self.bus.load(regs::local::ERR_STAT),
        );
        if stat.is_set(ERR_STAT::VALID) {
            self.bus.store(regs::local::ERR_STAT, 0);
            error!("local access fault at {:#06x}", offset);
            return Err(AcrError::RegisterAccessFault);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Access, SimBus};

    #[test]
    fn indirect_read_returns_register_value() {
        let sim = SimBus::new();
        sim.poke(0x1234, 0xdead_beef);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        assert_eq!(access.read(RegisterSpace::Indirect, 0x1234), Ok(0xdead_beef));
        assert_eq!(sim.trace(), vec![Access::Read(0x1234, 0xdead_beef)]);
    }

    #[test]
    fn indirect_write_lands() {
        let sim = SimBus::new();
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        access
            .write_blocking(RegisterSpace::Indirect, 0x40, 7)
            .unwrap();
        assert_eq!(sim.peek(0x40), 7);
        assert_eq!(sim.writes(), vec![(0x40, 7)]);
    }

    #[test]
    fn indirect_fault_is_reported() {
        let sim = SimBus::new();
        sim.fail_at(0x40);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        assert_eq!(
            access.write_blocking(RegisterSpace::Indirect, 0x40, 7),
            Err(AcrError::RegisterAccessFault)
        );
        assert_eq!(
            access.read(RegisterSpace::Indirect, 0x40),
            Err(AcrError::RegisterAccessFault)
        );
    }

    #[test]
    fn posted_write_ignores_fault() {
        let sim = SimBus::new();
        sim.fail_at(0x40);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        assert_eq!(
            access.write_nonblocking(RegisterSpace::Indirect, 0x40, 7),
            Ok(())
        );
    }

    #[test]
    fn stuck_bus_master_times_out() {
        let sim = SimBus::new();
        sim.set_bus_busy_polls(10);
        let budget = PollBudget {
            register_idle_polls: 4,
            ..PollBudget::DEFAULT
        };
        let access = RegisterAccess::new(&sim, budget);
        assert_eq!(
            access.read(RegisterSpace::Indirect, 0x40),
            Err(AcrError::RegisterAccessFault)
        );
    }

    #[test]
    fn slow_bus_master_within_budget() {
        let sim = SimBus::new();
        sim.set_bus_busy_polls(3);
        sim.poke(0x40, 9);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        assert_eq!(access.read(RegisterSpace::Indirect, 0x40), Ok(9));
    }

    #[test]
    fn local_fault_is_reported_and_cleared() {
        let sim = SimBus::new();
        sim.fail_local_at(0x200);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        assert_eq!(
            access.write_blocking(RegisterSpace::Local, 0x200, 1),
            Err(AcrError::RegisterAccessFault)
        );
        assert_eq!(sim.local_peek(regs::local::ERR_STAT), 0);
        assert_eq!(access.read(RegisterSpace::Local, 0x204), Ok(0));
    }

    #[test]
    fn modify_preserves_other_fields() {
        use crate::regs::WPR_ALLOW;

        let sim = SimBus::new();
        sim.poke(0x80, 0b0110);
        let access = RegisterAccess::new(&sim, PollBudget::DEFAULT);
        access
            .modify(RegisterSpace::Indirect, 0x80, WPR_ALLOW::WPR1::CLEAR)
            .unwrap();
        assert_eq!(sim.peek(0x80), 0b0100);
    }
}
