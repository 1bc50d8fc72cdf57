// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Top-level ACR object for one chip.

use log::{error, info};

use crate::bus::{RegisterAccess, RegisterBus};
use crate::config::AcrConfig;
use crate::falcon::{FalconDescriptor, FalconKind};
use crate::hil::{BootStageController, Halt};
use crate::lockdown;
use crate::reset::{ResetSequencer, SweepReport};
use crate::resolver::ChipResolver;
use crate::wpr::{Revocation, WprId, WprManager, WprRegion};
use crate::AcrError;

/// Access control region manager.
///
/// Owns the register access layer and the resolver of the configured chip.
/// Falcon descriptors are resolved afresh on every call and never cached.
pub struct Acr<'a> {
    config: AcrConfig,
    access: RegisterAccess<'a>,
    resolver: ChipResolver,
}

impl<'a> Acr<'a> {
    pub fn new(bus: &'a dyn RegisterBus, config: AcrConfig) -> Self {
        Acr {
            config,
            access: RegisterAccess::new(bus, config.budget)
                .with_write_tracing(config.trace_register_writes),
            resolver: ChipResolver::new(&config),
        }
    }

    pub fn config(&self) -> &AcrConfig {
        &self.config
    }

    pub fn resolve(&self, kind: FalconKind, instance: u8) -> Result<FalconDescriptor, AcrError> {
        self.resolver.resolve(kind, instance)
    }

    pub fn region(&self, id: WprId) -> Result<WprRegion, AcrError> {
        self.wpr().region(id)
    }

    pub fn revoke(&self, id: WprId) -> Result<Revocation, AcrError> {
        self.wpr().revoke(id)
    }

    pub fn reset_one(&self, kind: FalconKind, instance: u8) -> Result<(), AcrError> {
        self.sequencer().reset_one(kind, instance)
    }

    pub fn reset_all_instances(&self, kind: FalconKind) -> Result<SweepReport, AcrError> {
        self.sequencer().reset_all_instances(kind)
    }

    pub fn setup_dma_context(&self, kind: FalconKind, instance: u8) -> Result<(), AcrError> {
        let desc = self.resolve(kind, instance)?;
        self.sequencer().setup_dma_context(&desc)
    }

    pub fn lock_target_mask(&self, kind: FalconKind, instance: u8) -> Result<(), AcrError> {
        let desc = self.resolve(kind, instance)?;
        lockdown::lock_target_mask(&self.access, &desc)
    }

    /// Revokes every region the boot stage established, in its order.
    ///
    /// Stops at the first failure. Returns how many regions were actually
    /// torn down, unallocated ones not counted.
    pub fn teardown_all(&self, stage: &dyn BootStageController) -> Result<usize, AcrError> {
        let mut revoked = 0;
        for &id in stage.wpr_regions() {
            if let Revocation::Revoked { .. } = self.revoke(id)? {
                revoked += 1;
            }
        }
        info!("boot stage teardown complete, {} regions revoked", revoked);
        Ok(revoked)
    }

    /// Revokes `id`, halting the platform if that fails.
    pub fn teardown_or_halt(&self, id: WprId, halt: &dyn Halt) -> Revocation {
        match self.revoke(id) {
            Ok(revocation) => revocation,
            Err(e) => {
                error!("{:?} WPR teardown failed: {}, halting", id, e);
                halt.halt(e.into())
            }
        }
    }

    fn wpr(&self) -> WprManager<'_, 'a> {
        WprManager::new(&self.access, &self.resolver)
    }

    fn sequencer(&self) -> ResetSequencer<'_, 'a> {
        ResetSequencer::new(&self.access, &self.resolver)
    }
}
