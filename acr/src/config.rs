// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Compile-time and runtime configuration of the ACR.
//!
//! Compile-time options live in the `CONFIG` constant, seeded from Cargo
//! features. This is the only place in the crate where `cfg!(feature = ..)`
//! may be used. Everything that differs between chips or build flavors is
//! carried at runtime in an [`AcrConfig`], so every flavor is type-checked
//! and testable from a single build.

use crate::falcon::{FalconKind, FalconSet};
use crate::resolver::Generation;

/// Data structure holding compile-time configuration options.
pub(crate) struct Config {
    /// Whether this image is the reduced boot-from-HS build.
    pub(crate) boot_from_hs: bool,

    /// Whether every indirect-bus write is logged at `trace` level.
    pub(crate) trace_register_writes: bool,
}

pub(crate) const CONFIG: Config = Config {
    boot_from_hs: cfg!(feature = "boot_from_hs"),
    trace_register_writes: cfg!(feature = "trace_register_writes"),
};

/// Build flavor of the firmware image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildFlavor {
    /// Regular build. SEC2 owns the bootstrap of the LS chain.
    Standard,
    /// Reduced boot-from-HS build. GSP owns the bootstrap and the PMU is not
    /// managed by the ACR.
    BootFromHs,
}

impl BuildFlavor {
    /// The falcon kind that bootstraps the rest of the chain in this flavor.
    pub const fn bootstrap_owner(self) -> FalconKind {
        match self {
            BuildFlavor::Standard => FalconKind::Sec2,
            BuildFlavor::BootFromHs => FalconKind::Gsp,
        }
    }
}

/// Retry budgets for every bounded busy-wait.
///
/// The scrub-completion wait is deliberately absent: it has no budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollBudget {
    /// Polls of a bus status register before an access is declared faulty.
    pub register_idle_polls: u32,
    /// Attempts at taking a hardware mutex before `MutexTimeout`.
    pub mutex_retries: u32,
    /// Polls for a core switch or post-reset memory scrub to settle.
    pub engine_settle_polls: u32,
}

impl PollBudget {
    pub const DEFAULT: PollBudget = PollBudget {
        register_idle_polls: 0x1000,
        mutex_retries: 0x100,
        engine_settle_polls: 0x4000,
    };
}

/// Runtime configuration of one ACR instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcrConfig {
    pub generation: Generation,
    pub flavor: BuildFlavor,
    /// Falcon kinds compiled into this build.
    pub available: FalconSet,
    pub budget: PollBudget,
    pub(crate) trace_register_writes: bool,
}

impl AcrConfig {
    pub const fn new(generation: Generation) -> Self {
        AcrConfig {
            generation,
            flavor: if CONFIG.boot_from_hs {
                BuildFlavor::BootFromHs
            } else {
                BuildFlavor::Standard
            },
            available: FalconSet::ALL,
            budget: PollBudget::DEFAULT,
            trace_register_writes: CONFIG.trace_register_writes,
        }
    }

    pub const fn with_flavor(mut self, flavor: BuildFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub const fn with_available(mut self, available: FalconSet) -> Self {
        self.available = available;
        self
    }

    pub const fn with_budget(mut self, budget: PollBudget) -> Self {
        self.budget = budget;
        self
    }
}
