// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Falcon layout of the generation that added RISC-V cores and lock-down
//! target masks.
//!
//! Graphics falcons, NVENC and FBFALCON did not move on this generation and
//! are deferred to [`super::Tu10x`].

use crate::config::BuildFlavor;
use crate::falcon::{CoreType, FalconDescriptor, FalconKind, FalconSet};
use crate::AcrError;

use super::{is_bootstrap_owner, sub_wpr_table, FalconConfigResolver, Generation};

const FALCON_ENGINE: u32 = 0x3c0;
const FALCON_FBIF: u32 = 0x600;
const RISCV_OFFSET: u32 = 0x1000;

/// Lock-down target mask bit of each kind on this generation.
const fn target_mask_index(kind: FalconKind) -> u8 {
    match kind {
        FalconKind::Pmu => 0,
        FalconKind::Sec2 => 1,
        FalconKind::Gsp => 2,
        FalconKind::Nvdec => 3,
        FalconKind::Nvjpg => 5,
        FalconKind::Ofa => 6,
        FalconKind::Fecs => 7,
        FalconKind::Gpccs => 8,
        FalconKind::Nvenc => 9,
        FalconKind::Fbfalcon => 10,
    }
}

const fn falcon(kind: FalconKind, instance: u8, base: u32, max_sub_wprs: u8) -> FalconDescriptor {
    FalconDescriptor::new(
        kind,
        instance,
        base,
        base + FALCON_FBIF,
        sub_wpr_table(kind, instance),
        max_sub_wprs,
    )
    .with_engine_reset(base + FALCON_ENGINE)
    .with_target_mask_index(target_mask_index(kind))
}

/// Physical NVDEC apertures wired up on this generation.
fn nvdec_base(instance: u8) -> Result<u32, AcrError> {
    match instance {
        0 => Ok(0x848000),
        1 => Ok(0x84c000),
        _ => Err(AcrError::UnknownFalcon),
    }
}

pub struct Ga10x {
    flavor: BuildFlavor,
}

impl Ga10x {
    pub const fn new(flavor: BuildFlavor) -> Self {
        Ga10x { flavor }
    }

    fn owned(&self, desc: FalconDescriptor) -> FalconDescriptor {
        desc.with_bootstrap_owner(is_bootstrap_owner(self.flavor, desc.kind))
    }
}

impl FalconConfigResolver for Ga10x {
    fn generation(&self) -> Generation {
        Generation::Ga10x
    }

    fn kinds(&self) -> FalconSet {
        match self.flavor {
            BuildFlavor::Standard => FalconSet::ALL,
            BuildFlavor::BootFromHs => FalconSet::ALL.without(FalconKind::Pmu),
        }
    }

    fn resolve(
        &self,
        kind: FalconKind,
        instance: u8,
    ) -> Result<Option<FalconDescriptor>, AcrError> {
        let desc = match (kind, instance) {
            // The reduced boot-from-HS image does not manage the PMU.
            (FalconKind::Pmu, _) if self.flavor == BuildFlavor::BootFromHs => {
                return Err(AcrError::UnknownFalcon)
            }
            (FalconKind::Pmu, 0) => falcon(kind, 0, 0x10a000, 5)
                .with_riscv(0x10a000 + RISCV_OFFSET, CoreType::Falcon)
                .with_dma_context(4),
            (FalconKind::Sec2, 0) => falcon(kind, 0, 0x840000, 8)
                .with_riscv(0x840000 + RISCV_OFFSET, CoreType::Falcon)
                .with_dma_context(6),
            (FalconKind::Gsp, 0) => falcon(kind, 0, 0x110000, 8)
                .with_riscv(0x110000 + RISCV_OFFSET, CoreType::RiscV)
                .with_dma_context(6),
            (FalconKind::Nvdec, _) => {
                let base = nvdec_base(instance)?;
                falcon(kind, instance, base, 2).with_riscv(base + RISCV_OFFSET, CoreType::Falcon)
            }
            (FalconKind::Nvjpg, 0) => falcon(kind, 0, 0x842000, 2),
            (FalconKind::Ofa, 0) => falcon(kind, 0, 0x844000, 2),
            (FalconKind::Fecs | FalconKind::Gpccs | FalconKind::Nvenc | FalconKind::Fbfalcon, _) => {
                return Ok(None)
            }
            _ => return Err(AcrError::UnknownFalcon),
        };
        Ok(Some(self.owned(desc)))
    }
}
