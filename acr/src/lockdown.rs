// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Priv lock-down of falcon register targets.

use log::debug;

use crate::bus::{RegisterAccess, RegisterSpace};
use crate::falcon::FalconDescriptor;
use crate::regs;
use crate::AcrError;

/// Sets the falcon's bit in the lock-down target mask.
///
/// Generations without target masks leave `target_mask_index` empty, and
/// then nothing is accessed at all.
pub fn lock_target_mask(access: &RegisterAccess, desc: &FalconDescriptor) -> Result<(), AcrError> {
    let index = match desc.target_mask_index {
        Some(index) => index,
        None => {
            debug!("{}:{} has no lock-down target", desc.kind, desc.instance);
            return Ok(());
        }
    };
    let mask = access.read(RegisterSpace::Indirect, regs::lockdown::TARGET_MASK)?;
    access.write_blocking(
        RegisterSpace::Indirect,
        regs::lockdown::TARGET_MASK,
        mask | (1 << index),
    )
}
