// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Catalog of sub-WPR slots.
//!
//! Every falcon kind has a small, fixed table of sub-WPR slots, each with a
//! documented role inside one of the protected regions. The catalog is what
//! tells the region manager which slots to strip when a region goes away.
//!
//! The catalog is logical. How many of a kind's slots are actually backed by
//! hardware depends on the instance, see
//! [`FalconDescriptor::max_sub_wprs`](crate::falcon::FalconDescriptor).

use crate::falcon::{FalconDescriptor, FalconKind, FalconSet};
use crate::wpr::WprId;
use crate::AcrError;

/// What a sub-WPR slot grants access to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubWprRole {
    /// Code section of the falcon's LS ucode.
    UcodeCode,
    /// Data section of the falcon's LS ucode.
    UcodeData,
    /// Data shared with other LS falcons.
    SharedData,
    /// Private data of the falcon.
    PrivateData,
    /// The whole region, for the falcon running the ACR library.
    FullRegion,
    /// Firmware runtime security area.
    Frts,
}

/// One catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubWprSlot {
    pub kind: FalconKind,
    pub slot: u8,
    pub role: SubWprRole,
    pub region: WprId,
}

const fn slot(kind: FalconKind, slot: u8, role: SubWprRole, region: WprId) -> SubWprSlot {
    SubWprSlot {
        kind,
        slot,
        role,
        region,
    }
}

use self::SubWprRole::*;
use crate::wpr::WprId::{Primary, Secondary};

const PMU: &[SubWprSlot] = &[
    slot(FalconKind::Pmu, 0, UcodeCode, Primary),
    slot(FalconKind::Pmu, 1, UcodeData, Primary),
    slot(FalconKind::Pmu, 2, SharedData, Secondary),
    slot(FalconKind::Pmu, 3, Frts, Secondary),
    slot(FalconKind::Pmu, 4, PrivateData, Secondary),
];

const FECS: &[SubWprSlot] = &[
    slot(FalconKind::Fecs, 0, UcodeCode, Primary),
    slot(FalconKind::Fecs, 1, UcodeData, Primary),
];

const GPCCS: &[SubWprSlot] = &[
    slot(FalconKind::Gpccs, 0, UcodeCode, Primary),
    slot(FalconKind::Gpccs, 1, UcodeData, Primary),
];

const SEC2: &[SubWprSlot] = &[
    slot(FalconKind::Sec2, 0, UcodeCode, Primary),
    slot(FalconKind::Sec2, 1, UcodeData, Primary),
    slot(FalconKind::Sec2, 2, FullRegion, Primary),
    slot(FalconKind::Sec2, 3, SharedData, Secondary),
];

const GSP: &[SubWprSlot] = &[
    slot(FalconKind::Gsp, 0, FullRegion, Primary),
    slot(FalconKind::Gsp, 1, UcodeCode, Primary),
    slot(FalconKind::Gsp, 2, UcodeData, Primary),
    slot(FalconKind::Gsp, 3, SharedData, Secondary),
];

const NVDEC: &[SubWprSlot] = &[
    slot(FalconKind::Nvdec, 0, UcodeCode, Primary),
    slot(FalconKind::Nvdec, 1, UcodeData, Primary),
];

const NVENC: &[SubWprSlot] = &[
    slot(FalconKind::Nvenc, 0, UcodeCode, Primary),
    slot(FalconKind::Nvenc, 1, UcodeData, Primary),
];

const NVJPG: &[SubWprSlot] = &[
    slot(FalconKind::Nvjpg, 0, UcodeCode, Primary),
    slot(FalconKind::Nvjpg, 1, UcodeData, Primary),
];

const OFA: &[SubWprSlot] = &[
    slot(FalconKind::Ofa, 0, UcodeCode, Primary),
    slot(FalconKind::Ofa, 1, UcodeData, Primary),
];

const FBFALCON: &[SubWprSlot] = &[
    slot(FalconKind::Fbfalcon, 0, UcodeCode, Primary),
    slot(FalconKind::Fbfalcon, 1, UcodeData, Primary),
];

/// Catalog entries of one falcon kind, in slot order.
pub const fn slots_of(kind: FalconKind) -> &'static [SubWprSlot] {
    match kind {
        FalconKind::Pmu => PMU,
        FalconKind::Fecs => FECS,
        FalconKind::Gpccs => GPCCS,
        FalconKind::Sec2 => SEC2,
        FalconKind::Gsp => GSP,
        FalconKind::Nvdec => NVDEC,
        FalconKind::Nvenc => NVENC,
        FalconKind::Nvjpg => NVJPG,
        FalconKind::Ofa => OFA,
        FalconKind::Fbfalcon => FBFALCON,
    }
}

/// The sub-WPR catalog of one build.
///
/// Falcon kinds left out of the build contribute no entries.
#[derive(Clone, Copy, Debug)]
pub struct SubWprTable {
    available: FalconSet,
}

impl SubWprTable {
    pub const fn new(available: FalconSet) -> Self {
        SubWprTable { available }
    }

    /// All catalog entries of the build.
    pub fn slots(&self) -> impl Iterator<Item = &'static SubWprSlot> {
        self.available.iter().flat_map(|kind| slots_of(kind).iter())
    }

    /// Kinds of the build with at least one entry inside `region`.
    pub fn kinds_in(&self, region: WprId) -> impl Iterator<Item = FalconKind> {
        self.available
            .iter()
            .filter(move |kind| slots_of(*kind).iter().any(|s| s.region == region))
    }

    /// Entries whose role lies inside `region`.
    pub fn slots_in(&self, region: WprId) -> impl Iterator<Item = &'static SubWprSlot> {
        self.slots().filter(move |s| s.region == region)
    }

    /// Looks up the role of `slot` for `kind`.
    pub fn role(&self, kind: FalconKind, slot: u8) -> Option<SubWprRole> {
        if !self.available.contains(kind) {
            return None;
        }
        slots_of(kind)
            .iter()
            .find(|s| s.slot == slot)
            .map(|s| s.role)
    }
}

/// Checks that `slot` is hardware-backed on the falcon described by `desc`.
pub fn check_slot(desc: &FalconDescriptor, slot: u8) -> Result<(), AcrError> {
    if slot >= desc.max_sub_wprs {
        return Err(AcrError::SlotOutOfRange);
    }
    Ok(())
}

/// Contents of one sub-WPR slot.
///
/// Bounds are 4 KiB page numbers, `low` and `high` inclusive. Masks are
/// priv level masks: bit `n` lets level `n` read (or write) the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubWpr {
    pub low: u32,
    pub high: u32,
    pub read_mask: u8,
    pub write_mask: u8,
}

impl SubWpr {
    /// Read mask of a stripped slot. Firmware expects a torn-down slot to be
    /// fully open with inverted bounds, not closed over stale bounds.
    pub const UNLOCK_READ_MASK: u8 = 0xf;
    pub const UNLOCK_WRITE_MASK: u8 = 0xf;

    /// Value a slot holds once stripped.
    pub const STRIPPED: SubWpr = SubWpr {
        low: crate::regs::wpr::INVALID_ADDR_LO,
        high: crate::regs::wpr::INVALID_ADDR_HI,
        read_mask: SubWpr::UNLOCK_READ_MASK,
        write_mask: SubWpr::UNLOCK_WRITE_MASK,
    };

    /// Rejects bounds or masks wider than their register fields.
    pub fn check(&self) -> Result<(), AcrError> {
        if self.low > crate::regs::wpr::MAX_PAGE
            || self.high > crate::regs::wpr::MAX_PAGE
            || self.read_mask > SubWpr::UNLOCK_READ_MASK
            || self.write_mask > SubWpr::UNLOCK_WRITE_MASK
        {
            return Err(AcrError::InvalidArgument);
        }
        Ok(())
    }

    /// Whether the bounds describe a non-empty range.
    pub const fn is_live(&self) -> bool {
        self.low <= self.high
    }
}
