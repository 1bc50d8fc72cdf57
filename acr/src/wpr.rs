// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Write-protected region management.
//!
//! Regions are established earlier in boot. What lives here is the teardown
//! of a live region, [`WprManager::revoke`], and the primitives it is built
//! from. The teardown order is the security property of the whole ACR:
//!
//! 1. every sub-WPR grant inside the region is stripped,
//! 2. the region memory is scrubbed, and the scrub is waited on with no
//!    timeout,
//! 3. only then are the region bounds collapsed and its allow masks cleared.
//!
//! Stripping after scrubbing would leave grants pointing at scrubbed but
//! still-protected memory; collapsing before the scrub completes would
//! expose memory that still holds secrets.
//!
//! Regions are assumed never to overlap. Nothing here checks whether a
//! sub-WPR of another region still covers the range being released.

use log::{debug, info, warn};
use tock_registers::fields::Field;
use tock_registers::LocalRegisterCopy;

use crate::bus::{RegisterAccess, RegisterSpace};
use crate::falcon::FalconDescriptor;
use crate::mutex::{MutexGuard, MutexId};
use crate::regs::{
    self, SubWprCfgaVal, SubWprCfgbVal, WprAllowVal, SCRUB_STATUS, SCRUB_TRIGGER, SUB_WPR_CFGA,
    SUB_WPR_CFGB, WPR_ADDR, WPR_ALLOW,
};
use crate::resolver::ChipResolver;
use crate::subwpr::{self, SubWpr, SubWprTable};
use crate::AcrError;

/// The concurrently live regions supported by the memory controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WprId {
    Primary = 1,
    Secondary = 2,
}

impl WprId {
    pub const ALL: [WprId; 2] = [WprId::Primary, WprId::Secondary];

    const fn bound_registers(self) -> (u32, u32) {
        match self {
            WprId::Primary => (regs::wpr::WPR1_ADDR_LO, regs::wpr::WPR1_ADDR_HI),
            WprId::Secondary => (regs::wpr::WPR2_ADDR_LO, regs::wpr::WPR2_ADDR_HI),
        }
    }

    fn allow_field(self) -> Field<u32, WPR_ALLOW::Register> {
        match self {
            WprId::Primary => WPR_ALLOW::WPR1,
            WprId::Secondary => WPR_ALLOW::WPR2,
        }
    }
}

impl TryFrom<u8> for WprId {
    type Error = AcrError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            1 => Ok(WprId::Primary),
            2 => Ok(WprId::Secondary),
            _ => Err(AcrError::InvalidArgument),
        }
    }
}

/// Snapshot of a region's configuration.
///
/// `base` and `end` are 4 KiB page numbers with `end` exclusive. Equal or
/// inverted bounds mean the region is not allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WprRegion {
    pub id: WprId,
    pub base: u32,
    pub end: u32,
    /// Raw global read-allow mask, one bit per region id.
    pub read_allow_mask: u32,
    /// Raw global write-allow mask, one bit per region id.
    pub write_allow_mask: u32,
}

impl WprRegion {
    pub const fn is_allocated(&self) -> bool {
        self.base < self.end
    }

    /// First byte of the region.
    pub const fn base_addr(&self) -> u64 {
        (self.base as u64) << regs::wpr::ADDR_SHIFT
    }

    /// One past the last byte of the region.
    pub const fn end_addr(&self) -> u64 {
        (self.end as u64) << regs::wpr::ADDR_SHIFT
    }

    pub fn readable(&self) -> bool {
        WprAllowVal::new(self.read_allow_mask).is_set(self.id.allow_field())
    }

    pub fn writable(&self) -> bool {
        WprAllowVal::new(self.write_allow_mask).is_set(self.id.allow_field())
    }
}

/// What [`WprManager::revoke`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revocation {
    /// The region was not allocated; nothing was written.
    NotAllocated,
    /// The region was torn down after stripping `stripped` sub-WPRs.
    Revoked { stripped: usize },
}

/// Owner of the region lifecycle on one chip.
pub struct WprManager<'r, 'a> {
    access: &'r RegisterAccess<'a>,
    resolver: &'r ChipResolver,
    table: SubWprTable,
}

impl<'r, 'a> WprManager<'r, 'a> {
    pub fn new(access: &'r RegisterAccess<'a>, resolver: &'r ChipResolver) -> Self {
        WprManager {
            access,
            resolver,
            table: SubWprTable::new(resolver.kinds()),
        }
    }

    pub fn table(&self) -> &SubWprTable {
        &self.table
    }

    /// Reads a region's bounds and allow masks.
    pub fn region(&self, id: WprId) -> Result<WprRegion, AcrError> {
        let (base, end) = self.bounds(id)?;
        let read_allow_mask = self
            .access
            .read(RegisterSpace::Indirect, regs::wpr::ALLOW_READ)?;
        let write_allow_mask = self
            .access
            .read(RegisterSpace::Indirect, regs::wpr::ALLOW_WRITE)?;
        Ok(WprRegion {
            id,
            base,
            end,
            read_allow_mask,
            write_allow_mask,
        })
    }

    /// Tears down region `id`.
    ///
    /// A region that was never allocated is left alone and reported as
    /// [`Revocation::NotAllocated`]. Any failure is returned as soon as it
    /// happens. A failed teardown leaves the region in an unknown state and
    /// must not be retried.
    pub fn revoke(&self, id: WprId) -> Result<Revocation, AcrError> {
        let (base, end) = self.bounds(id)?;
        if base >= end {
            debug!("{:?} WPR not allocated, nothing to revoke", id);
            return Ok(Revocation::NotAllocated);
        }
        info!("revoking {:?} WPR, pages {:#x}..{:#x}", id, base, end);

        let stripped = self.strip_sub_wprs(id)?;
        self.scrub(base, end)?;
        self.collapse_bounds(id)?;
        self.revoke_allow_masks(id)?;

        info!("{:?} WPR revoked", id);
        Ok(Revocation::Revoked { stripped })
    }

    /// Strips every hardware-backed catalog slot that lies inside `id`, on
    /// every instance the resolver knows of each participating kind.
    ///
    /// Instances sharing instance 0's table (broadcast tables) are stripped
    /// once. Returns the number of slots stripped.
    pub fn strip_sub_wprs(&self, id: WprId) -> Result<usize, AcrError> {
        let mut stripped = 0;
        for kind in self.table.kinds_in(id) {
            let first = self.resolver.resolve(kind, 0)?;
            stripped += self.strip_instance(id, &first)?;

            for instance in 1..=u8::MAX {
                let desc = match self.resolver.resolve(kind, instance) {
                    Ok(desc) => desc,
                    // Past the last instance of this kind.
                    Err(AcrError::UnknownFalcon) => break,
                    Err(e) => return Err(e),
                };
                if desc.sub_wpr_table_base == first.sub_wpr_table_base {
                    continue;
                }
                stripped += self.strip_instance(id, &desc)?;
            }
        }
        debug!("stripped {} sub-WPRs of {:?} WPR", stripped, id);
        Ok(stripped)
    }

    fn strip_instance(&self, id: WprId, desc: &FalconDescriptor) -> Result<usize, AcrError> {
        let mut stripped = 0;
        for entry in subwpr::slots_of(desc.kind).iter().filter(|s| s.region == id) {
            if subwpr::check_slot(desc, entry.slot).is_err() {
                // Beyond this instance's capacity; it cannot hold a grant.
                warn!(
                    "{}:{} sub-WPR {} not backed by hardware, skipped",
                    desc.kind, desc.instance, entry.slot
                );
                continue;
            }
            self.program_sub_wpr(desc, entry.slot, &SubWpr::STRIPPED)?;
            stripped += 1;
        }
        Ok(stripped)
    }

    /// Programs one sub-WPR slot of the falcon described by `desc`.
    pub fn program_sub_wpr(
        &self,
        desc: &FalconDescriptor,
        slot: u8,
        sub_wpr: &SubWpr,
    ) -> Result<(), AcrError> {
        subwpr::check_slot(desc, slot)?;
        sub_wpr.check()?;

        let mut cfga = SubWprCfgaVal::new(0);
        cfga.modify(
            SUB_WPR_CFGA::ADDR_LO.val(sub_wpr.low)
                + SUB_WPR_CFGA::ALLOW_READ.val(sub_wpr.read_mask as u32),
        );
        let mut cfgb = SubWprCfgbVal::new(0);
        cfgb.modify(
            SUB_WPR_CFGB::ADDR_HI.val(sub_wpr.high)
                + SUB_WPR_CFGB::ALLOW_WRITE.val(sub_wpr.write_mask as u32),
        );

        self.access
            .write_blocking(RegisterSpace::Indirect, desc.sub_wpr_cfga(slot), cfga.get())?;
        self.access
            .write_blocking(RegisterSpace::Indirect, desc.sub_wpr_cfgb(slot), cfgb.get())
    }

    /// Reads back one sub-WPR slot.
    pub fn read_sub_wpr(&self, desc: &FalconDescriptor, slot: u8) -> Result<SubWpr, AcrError> {
        subwpr::check_slot(desc, slot)?;
        let cfga = self
            .access
            .read_reg::<SUB_WPR_CFGA::Register>(RegisterSpace::Indirect, desc.sub_wpr_cfga(slot))?;
        let cfgb = self
            .access
            .read_reg::<SUB_WPR_CFGB::Register>(RegisterSpace::Indirect, desc.sub_wpr_cfgb(slot))?;
        Ok(SubWpr {
            low: cfga.read(SUB_WPR_CFGA::ADDR_LO),
            high: cfgb.read(SUB_WPR_CFGB::ADDR_HI),
            read_mask: cfga.read(SUB_WPR_CFGA::ALLOW_READ) as u8,
            write_mask: cfgb.read(SUB_WPR_CFGB::ALLOW_WRITE) as u8,
        })
    }

    fn bounds(&self, id: WprId) -> Result<(u32, u32), AcrError> {
        let (lo, hi) = id.bound_registers();
        let base = self
            .access
            .read_reg::<WPR_ADDR::Register>(RegisterSpace::Indirect, lo)?
            .read(WPR_ADDR::VAL);
        let end = self
            .access
            .read_reg::<WPR_ADDR::Register>(RegisterSpace::Indirect, hi)?
            .read(WPR_ADDR::VAL);
        Ok((base, end))
    }

    /// Scrubs pages `base..end` under the scrubber mutex.
    ///
    /// The mutex is released on every path, and a release failure is only
    /// reported if the scrub itself succeeded.
    fn scrub(&self, base: u32, end: u32) -> Result<(), AcrError> {
        let guard = MutexGuard::acquire(self.access, MutexId::Scrubber)?;
        let scrubbed = self.scrub_locked(base, end);
        let released = guard.release();
        scrubbed.and(released)
    }

    fn scrub_locked(&self, base: u32, end: u32) -> Result<(), AcrError> {
        let access = self.access;
        // The scrubber takes an inclusive range of 4 KiB pages.
        access.write_blocking(RegisterSpace::Indirect, regs::scrub::START, base)?;
        access.write_blocking(RegisterSpace::Indirect, regs::scrub::END, end - 1)?;
        access.write_blocking(
            RegisterSpace::Indirect,
            regs::scrub::PATTERN,
            regs::scrub::FILL_PATTERN,
        )?;
        let mut trigger = LocalRegisterCopy::<u32, SCRUB_TRIGGER::Register>::new(0);
        trigger.modify(SCRUB_TRIGGER::GO::SET);
        access.write_blocking(RegisterSpace::Indirect, regs::scrub::TRIGGER, trigger.get())?;

        // No timeout. The region must not be released before the scrubber
        // reports completion.
        loop {
            let status = access
                .read_reg::<SCRUB_STATUS::Register>(RegisterSpace::Indirect, regs::scrub::STATUS)?;
            if !status.is_set(SCRUB_STATUS::PENDING) {
                break;
            }
        }
        debug!("scrubbed pages {:#x}..={:#x}", base, end - 1);
        Ok(())
    }

    fn collapse_bounds(&self, id: WprId) -> Result<(), AcrError> {
        let (lo, hi) = id.bound_registers();
        self.access
            .write_blocking(RegisterSpace::Indirect, lo, regs::wpr::INVALID_ADDR_LO)?;
        self.access
            .write_blocking(RegisterSpace::Indirect, hi, regs::wpr::INVALID_ADDR_HI)
    }

    fn revoke_allow_masks(&self, id: WprId) -> Result<(), AcrError> {
        let field = id.allow_field();
        self.access.modify(
            RegisterSpace::Indirect,
            regs::wpr::ALLOW_READ,
            field.val(0),
        )?;
        self.access.modify(
            RegisterSpace::Indirect,
            regs::wpr::ALLOW_WRITE,
            field.val(0),
        )
    }
}
