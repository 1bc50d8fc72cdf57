// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Falcon engine reset.
//!
//! A reset brings a falcon back to a known state that the next boot stage
//! (or a caller reclaiming a hardware mutex the engine still holds) can rely
//! on: the engine is pulsed through reset, its IMEM/DMEM auto-scrub is
//! allowed to finish, and on dual-core engines the expected core is selected
//! again.

use log::{debug, warn};
use tock_registers::fields::FieldValue;

use crate::bus::{RegisterAccess, RegisterSpace};
use crate::falcon::{CoreType, FalconDescriptor, FalconKind};
use crate::regs::{self, BcrCtrlVal, BCR_CTRL, COUNT, ENGINE, FBIF_TRANSCFG, HWCFG2};
use crate::resolver::ChipResolver;
use crate::AcrError;

/// Outcome of [`ResetSequencer::reset_all_instances`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Instances a reset was attempted on.
    pub attempted: u8,
    /// Instances skipped because they are floorswept.
    pub skipped: u8,
    /// Attempted instances whose reset failed.
    pub failed: u8,
}

impl SweepReport {
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct ResetSequencer<'r, 'a> {
    access: &'r RegisterAccess<'a>,
    resolver: &'r ChipResolver,
}

impl<'r, 'a> ResetSequencer<'r, 'a> {
    pub fn new(access: &'r RegisterAccess<'a>, resolver: &'r ChipResolver) -> Self {
        ResetSequencer { access, resolver }
    }

    /// Resets one falcon instance.
    ///
    /// The first failing step aborts the sequence.
    pub fn reset_one(&self, kind: FalconKind, instance: u8) -> Result<(), AcrError> {
        let desc = self.resolver.resolve(kind, instance)?;
        self.pulse_reset(&desc)?;
        self.wait_mem_scrubbing(&desc)?;
        self.select_core(&desc)?;
        debug!("{}:{} reset", kind, instance);
        Ok(())
    }

    /// Resets every active instance of `kind`.
    ///
    /// Only a failure to read the instance count is returned as an error.
    /// A failing instance is logged and counted, and the sweep moves on to
    /// the next one.
    pub fn reset_all_instances(&self, kind: FalconKind) -> Result<SweepReport, AcrError> {
        let count = self.instance_count(kind)?;
        let mut report = SweepReport::default();

        for instance in 0..count {
            // Logical numbering already leaves disabled units out.
            if !kind.is_logically_addressed() {
                match self.is_floorswept(kind, instance) {
                    Ok(true) => {
                        debug!("{}:{} floorswept, skipped", kind, instance);
                        report.skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("{}:{} status unreadable: {}", kind, instance, e);
                        report.attempted += 1;
                        report.failed += 1;
                        continue;
                    }
                }
            }

            report.attempted += 1;
            if let Err(e) = self.reset_one(kind, instance) {
                warn!("{}:{} reset failed: {}", kind, instance, e);
                report.failed += 1;
            }
        }

        debug!("{} sweep: {:?}", kind, report);
        Ok(report)
    }

    /// Points the falcon's own DMA context at physical local memory.
    pub fn setup_dma_context(&self, desc: &FalconDescriptor) -> Result<(), AcrError> {
        self.access.modify(
            RegisterSpace::Indirect,
            desc.bus_interface_base + regs::fbif_transcfg(desc.dma_context),
            FBIF_TRANSCFG::TARGET::LocalFb + FBIF_TRANSCFG::MEM_TYPE::Physical,
        )
    }

    fn instance_count(&self, kind: FalconKind) -> Result<u8, AcrError> {
        let reg = if kind.is_logically_addressed() {
            regs::topology::GPC_LOGICAL_COUNT
        } else {
            regs::topology::engine_count(kind.index())
        };
        let count = self
            .access
            .read_reg::<COUNT::Register>(RegisterSpace::Indirect, reg)?
            .read(COUNT::VALUE);
        Ok(count as u8)
    }

    fn is_floorswept(&self, kind: FalconKind, instance: u8) -> Result<bool, AcrError> {
        let mask = self.access.read(
            RegisterSpace::Indirect,
            regs::topology::engine_disable_mask(kind.index()),
        )?;
        Ok(mask & (1 << instance) != 0)
    }

    fn pulse_reset(&self, desc: &FalconDescriptor) -> Result<(), AcrError> {
        match desc.engine_reset_register {
            Some(reg) => {
                self.access
                    .modify(RegisterSpace::Indirect, reg, ENGINE::RESET::SET)?;
                self.access
                    .modify(RegisterSpace::Indirect, reg, ENGINE::RESET::CLEAR)
            }
            // Hardware ignores reset for these falcons, and so do we.
            None => {
                debug!("{}:{} has no engine reset", desc.kind, desc.instance);
                Ok(())
            }
        }
    }

    fn wait_mem_scrubbing(&self, desc: &FalconDescriptor) -> Result<(), AcrError> {
        self.access
            .poll_until::<HWCFG2::Register>(
                RegisterSpace::Indirect,
                desc.register_base + regs::falcon::HWCFG2,
                self.access.budget().engine_settle_polls,
                |hwcfg| !hwcfg.is_set(HWCFG2::MEM_SCRUBBING),
            )
            .map(|_| ())
    }

    fn select_core(&self, desc: &FalconDescriptor) -> Result<(), AcrError> {
        let riscv = match desc.riscv_register_base {
            Some(base) => base,
            None => return Ok(()),
        };
        let core: FieldValue<u32, BCR_CTRL::Register> = match desc.core {
            CoreType::Falcon => BCR_CTRL::CORE_SELECT::Falcon,
            CoreType::RiscV => BCR_CTRL::CORE_SELECT::RiscV,
        };
        let mut bcr = BcrCtrlVal::new(0);
        bcr.modify(core);

        let reg = riscv + regs::riscv::BCR_CTRL;
        self.access
            .write_blocking(RegisterSpace::Indirect, reg, bcr.get())?;
        self.access
            .poll_until::<BCR_CTRL::Register>(
                RegisterSpace::Indirect,
                reg,
                self.access.budget().engine_settle_polls,
                |bcr| bcr.is_set(BCR_CTRL::VALID),
            )
            .map(|_| ())
    }
}
