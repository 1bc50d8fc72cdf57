// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces to the rest of the firmware image.

use crate::wpr::WprId;

/// The boot-stage controller that established the protected regions.
pub trait BootStageController {
    /// Regions established for the current boot stage, in the order they
    /// should be torn down.
    fn wpr_regions(&self) -> &[WprId];
}

/// Platform stop.
///
/// Called when carrying on would leave a protected region in an unknown
/// state. `status` is the coded status reported to whatever launched this
/// firmware stage.
pub trait Halt {
    fn halt(&self, status: u32) -> !;
}
