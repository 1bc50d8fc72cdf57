// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Falcon identities and their resolved hardware descriptors.
//!
//! A falcon is named abstractly by a [`FalconKind`] and an instance number.
//! Where it actually lives on a given chip (register apertures, reset
//! register, sub-WPR table, ...) is only known once a generation resolver
//! (see [`crate::resolver`]) has produced a [`FalconDescriptor`] for it.
//! Descriptors are plain values computed per call and owned by the caller;
//! nothing caches them.

use core::fmt;

/// The closed set of falcon engine kinds the ACR knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum FalconKind {
    /// Power management unit.
    Pmu = 0,
    /// Front-end context switch controller of the graphics engine.
    Fecs = 1,
    /// Per-GPC context switch controller. Instances are addressed logically,
    /// one per active GPC.
    Gpccs = 2,
    /// Security coprocessor.
    Sec2 = 3,
    /// GPU system processor.
    Gsp = 4,
    /// Video decoder.
    Nvdec = 5,
    /// Video encoder.
    Nvenc = 6,
    /// JPEG engine.
    Nvjpg = 7,
    /// Optical flow accelerator.
    Ofa = 8,
    /// Frame buffer falcon.
    Fbfalcon = 9,
}

impl FalconKind {
    pub const ALL: [FalconKind; 10] = [
        FalconKind::Pmu,
        FalconKind::Fecs,
        FalconKind::Gpccs,
        FalconKind::Sec2,
        FalconKind::Gsp,
        FalconKind::Nvdec,
        FalconKind::Nvenc,
        FalconKind::Nvjpg,
        FalconKind::Ofa,
        FalconKind::Fbfalcon,
    ];

    /// Dense index of this kind, usable for per-kind register arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this kind's instances are exposed through a logical mask that
    /// may change between boots, rather than as fixed physical units.
    pub const fn is_logically_addressed(self) -> bool {
        matches!(self, FalconKind::Gpccs)
    }
}

impl TryFrom<u8> for FalconKind {
    type Error = crate::AcrError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FalconKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(crate::AcrError::InvalidArgument)
    }
}

impl fmt::Display for FalconKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FalconKind::Pmu => "PMU",
            FalconKind::Fecs => "FECS",
            FalconKind::Gpccs => "GPCCS",
            FalconKind::Sec2 => "SEC2",
            FalconKind::Gsp => "GSP",
            FalconKind::Nvdec => "NVDEC",
            FalconKind::Nvenc => "NVENC",
            FalconKind::Nvjpg => "NVJPG",
            FalconKind::Ofa => "OFA",
            FalconKind::Fbfalcon => "FBFALCON",
        };
        f.write_str(name)
    }
}

/// Set of falcon kinds, e.g. the engines present in a particular build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FalconSet(u16);

impl FalconSet {
    pub const EMPTY: FalconSet = FalconSet(0);
    pub const ALL: FalconSet = FalconSet((1 << FalconKind::ALL.len()) - 1);

    pub const fn with(self, kind: FalconKind) -> FalconSet {
        FalconSet(self.0 | (1 << kind as u16))
    }

    pub const fn without(self, kind: FalconKind) -> FalconSet {
        FalconSet(self.0 & !(1 << kind as u16))
    }

    pub const fn intersect(self, other: FalconSet) -> FalconSet {
        FalconSet(self.0 & other.0)
    }

    pub const fn contains(self, kind: FalconKind) -> bool {
        self.0 & (1 << kind as u16) != 0
    }

    pub fn from_kinds(kinds: &[FalconKind]) -> FalconSet {
        kinds.iter().fold(FalconSet::EMPTY, |set, k| set.with(*k))
    }

    /// Iterates the member kinds in [`FalconKind::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = FalconKind> {
        FalconKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// Execution core a falcon boots on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreType {
    /// Classic falcon microcontroller core.
    Falcon,
    /// RISC-V core (Peregrine), on engines that carry both.
    RiscV,
}

/// Resolved hardware identity of one falcon instance.
///
/// All addresses are offsets into the indirect (bus-routed) register space.
/// A descriptor handed out by [`crate::resolver::ResolverChain`] always has a
/// non-zero `register_base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FalconDescriptor {
    pub kind: FalconKind,
    pub instance: u8,
    pub core: CoreType,
    /// This falcon bootstraps the rest of the secure-boot chain.
    pub is_bootstrap_owner: bool,
    /// Base of the falcon register aperture.
    pub register_base: u32,
    /// Base of the falcon's bus interface (FBIF) block.
    pub bus_interface_base: u32,
    /// Base of the RISC-V core registers, on dual-core engines.
    pub riscv_register_base: Option<u32>,
    /// Register used to put the engine into and out of reset. Falcons without
    /// one ignore reset requests in hardware.
    pub engine_reset_register: Option<u32>,
    /// DMA context used for the falcon's own ucode fetch.
    pub dma_context: u8,
    /// First CFGA register of the falcon's sub-WPR table.
    pub sub_wpr_table_base: u32,
    /// Priv level mask guarding the sub-WPR table.
    pub sub_wpr_plm_register: u32,
    /// Number of hardware-backed sub-WPR slots.
    pub max_sub_wprs: u8,
    /// Bit index in the lock-down target mask. Only present from the
    /// generation that introduced target masks.
    pub target_mask_index: Option<u8>,
}

impl FalconDescriptor {
    /// Starts a descriptor for a classic-core falcon with no optional
    /// registers. Resolvers refine it with the `with_*` methods.
    pub const fn new(
        kind: FalconKind,
        instance: u8,
        register_base: u32,
        bus_interface_base: u32,
        sub_wpr_table_base: u32,
        max_sub_wprs: u8,
    ) -> Self {
        FalconDescriptor {
            kind,
            instance,
            core: CoreType::Falcon,
            is_bootstrap_owner: false,
            register_base,
            bus_interface_base,
            riscv_register_base: None,
            engine_reset_register: None,
            dma_context: 0,
            sub_wpr_table_base,
            sub_wpr_plm_register: sub_wpr_table_base - 4,
            max_sub_wprs,
            target_mask_index: None,
        }
    }

    pub const fn with_riscv(mut self, riscv_register_base: u32, core: CoreType) -> Self {
        self.riscv_register_base = Some(riscv_register_base);
        self.core = core;
        self
    }

    pub const fn with_engine_reset(mut self, register: u32) -> Self {
        self.engine_reset_register = Some(register);
        self
    }

    pub const fn with_dma_context(mut self, ctx: u8) -> Self {
        self.dma_context = ctx;
        self
    }

    pub const fn with_target_mask_index(mut self, index: u8) -> Self {
        self.target_mask_index = Some(index);
        self
    }

    pub const fn with_bootstrap_owner(mut self, owner: bool) -> Self {
        self.is_bootstrap_owner = owner;
        self
    }

    /// Address of the CFGA register of sub-WPR `slot`.
    ///
    /// CFGA holds the low bound and read mask, the CFGB register directly
    /// after it the high bound and write mask.
    pub const fn sub_wpr_cfga(&self, slot: u8) -> u32 {
        self.sub_wpr_table_base + (slot as u32) * 8
    }

    pub const fn sub_wpr_cfgb(&self, slot: u8) -> u32 {
        self.sub_wpr_cfga(slot) + 4
    }
}
