// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Base generation falcon layout.

use crate::config::BuildFlavor;
use crate::falcon::{CoreType, FalconDescriptor, FalconKind, FalconSet};
use crate::AcrError;

use super::{is_bootstrap_owner, sub_wpr_table, FalconConfigResolver, Generation};

/// GPCs addressable in logical numbering on this generation.
const MAX_GPCS: u8 = 6;
/// Logical stride between two GPCCS apertures.
const GPC_STRIDE: u32 = 0x8000;

/// Falcon engine reset register, relative to the falcon base.
const FALCON_ENGINE: u32 = 0x3c0;
/// FBIF block, relative to the falcon base.
const FALCON_FBIF: u32 = 0x600;

const fn falcon(kind: FalconKind, instance: u8, base: u32, max_sub_wprs: u8) -> FalconDescriptor {
    FalconDescriptor::new(
        kind,
        instance,
        base,
        base + FALCON_FBIF,
        sub_wpr_table(kind, instance),
        max_sub_wprs,
    )
}

pub struct Tu10x {
    flavor: BuildFlavor,
}

impl Tu10x {
    pub const fn new(flavor: BuildFlavor) -> Self {
        Tu10x { flavor }
    }

    fn single(
        &self,
        instance: u8,
        desc: FalconDescriptor,
    ) -> Result<Option<FalconDescriptor>, AcrError> {
        if instance != 0 {
            return Err(AcrError::UnknownFalcon);
        }
        Ok(Some(desc.with_bootstrap_owner(is_bootstrap_owner(self.flavor, desc.kind))))
    }
}

impl FalconConfigResolver for Tu10x {
    fn generation(&self) -> Generation {
        Generation::Tu10x
    }

    fn kinds(&self) -> FalconSet {
        FalconSet::ALL
            .without(FalconKind::Nvjpg)
            .without(FalconKind::Ofa)
    }

    fn resolve(
        &self,
        kind: FalconKind,
        instance: u8,
    ) -> Result<Option<FalconDescriptor>, AcrError> {
        match kind {
            FalconKind::Pmu => self.single(
                instance,
                falcon(kind, 0, 0x10a000, 4)
                    .with_engine_reset(0x10a000 + FALCON_ENGINE)
                    .with_dma_context(4),
            ),
            // Graphics falcons are reset with the graphics engine, they have
            // no reset register of their own.
            FalconKind::Fecs => self.single(instance, falcon(kind, 0, 0x409000, 2)),
            FalconKind::Gpccs => {
                if instance >= MAX_GPCS {
                    return Err(AcrError::UnknownFalcon);
                }
                // All GPCCS share the broadcast sub-WPR table.
                let mut desc = falcon(kind, instance, 0x502000 + instance as u32 * GPC_STRIDE, 2);
                desc.sub_wpr_table_base = sub_wpr_table(kind, 0);
                desc.sub_wpr_plm_register = desc.sub_wpr_table_base - 4;
                Ok(Some(desc))
            }
            FalconKind::Sec2 => self.single(
                instance,
                falcon(kind, 0, 0x840000, 4)
                    .with_engine_reset(0x840000 + FALCON_ENGINE)
                    .with_dma_context(6),
            ),
            FalconKind::Gsp => self.single(
                instance,
                falcon(kind, 0, 0x110000, 4)
                    .with_riscv(0x111000, CoreType::Falcon)
                    .with_engine_reset(0x110000 + FALCON_ENGINE)
                    .with_dma_context(6),
            ),
            FalconKind::Nvdec => self.single(
                instance,
                falcon(kind, 0, 0x084000, 2).with_engine_reset(0x084000 + FALCON_ENGINE),
            ),
            FalconKind::Nvenc => match instance {
                0 | 1 => Ok(Some(
                    falcon(kind, instance, 0x1c2000 + instance as u32 * 0x4000, 2)
                        .with_engine_reset(0x1c2000 + instance as u32 * 0x4000 + FALCON_ENGINE),
                )),
                _ => Err(AcrError::UnknownFalcon),
            },
            FalconKind::Fbfalcon => self.single(instance, falcon(kind, 0, 0x9a4000, 2)),
            FalconKind::Nvjpg | FalconKind::Ofa => Err(AcrError::UnknownFalcon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_kinds_resolve_directly() {
        let tu = Tu10x::new(BuildFlavor::Standard);
        for kind in tu.kinds().iter() {
            let desc = tu.resolve(kind, 0).unwrap().unwrap();
            assert_ne!(desc.register_base, 0);
            assert_eq!(desc.kind, kind);
            assert_eq!(desc.target_mask_index, None);
        }
    }

    #[test]
    fn undeclared_kinds_are_unknown() {
        let tu = Tu10x::new(BuildFlavor::Standard);
        assert_eq!(tu.resolve(FalconKind::Ofa, 0), Err(AcrError::UnknownFalcon));
        assert_eq!(tu.resolve(FalconKind::Nvjpg, 0), Err(AcrError::UnknownFalcon));
        assert_eq!(tu.resolve(FalconKind::Pmu, 1), Err(AcrError::UnknownFalcon));
        assert_eq!(tu.resolve(FalconKind::Nvenc, 2), Err(AcrError::UnknownFalcon));
        assert_eq!(
            tu.resolve(FalconKind::Gpccs, MAX_GPCS),
            Err(AcrError::UnknownFalcon)
        );
    }

    #[test]
    fn gpccs_instances_share_sub_wpr_table() {
        let tu = Tu10x::new(BuildFlavor::Standard);
        let g0 = tu.resolve(FalconKind::Gpccs, 0).unwrap().unwrap();
        let g3 = tu.resolve(FalconKind::Gpccs, 3).unwrap().unwrap();
        assert_eq!(g3.register_base, g0.register_base + 3 * GPC_STRIDE);
        assert_eq!(g3.sub_wpr_table_base, g0.sub_wpr_table_base);
    }

    #[test]
    fn bootstrap_owner_follows_flavor() {
        let std = Tu10x::new(BuildFlavor::Standard);
        let bfhs = Tu10x::new(BuildFlavor::BootFromHs);
        let owner = |r: &Tu10x, k| r.resolve(k, 0).unwrap().unwrap().is_bootstrap_owner;
        assert!(owner(&std, FalconKind::Sec2));
        assert!(!owner(&std, FalconKind::Gsp));
        assert!(!owner(&bfhs, FalconKind::Sec2));
        assert!(owner(&bfhs, FalconKind::Gsp));
    }
}
