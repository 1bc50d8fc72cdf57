// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Falcon configuration resolvers.
//!
//! Each hardware generation has a [`FalconConfigResolver`] that knows where
//! the falcons of that generation live. A newer generation only describes
//! the falcons whose layout changed; for the rest it answers `Ok(None)` and
//! resolution falls back to the next older generation. [`ResolverChain`]
//! is that fallback, and [`ChipResolver`] builds the right chain for the
//! configured generation.
//!
//! Descriptors are never merged across generations. The first resolver that
//! produces a descriptor wins outright.

use log::{debug, error};

use crate::config::{AcrConfig, BuildFlavor};
use crate::falcon::{FalconDescriptor, FalconKind, FalconSet};
use crate::AcrError;

mod ga10x;
mod tu10x;

pub use self::ga10x::Ga10x;
pub use self::tu10x::Tu10x;

/// Hardware generations, oldest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    /// Base generation. Every other generation falls back to it.
    Tu10x,
    Ga10x,
}

/// Generation-specific falcon lookup.
pub trait FalconConfigResolver {
    fn generation(&self) -> Generation;

    /// Falcon kinds this generation declares, whether it describes them
    /// itself or defers them to an older generation.
    fn kinds(&self) -> FalconSet;

    /// Looks up `kind`/`instance`.
    ///
    /// Returns `Ok(None)` when this generation did not change the falcon's
    /// layout and the next older generation must be asked. Kinds or
    /// instances that do not exist on this generation are
    /// [`AcrError::UnknownFalcon`], never a zeroed descriptor.
    fn resolve(
        &self,
        kind: FalconKind,
        instance: u8,
    ) -> Result<Option<FalconDescriptor>, AcrError>;
}

/// Newest-first list of resolvers, tried in order.
pub struct ResolverChain<'r> {
    resolvers: &'r [&'r dyn FalconConfigResolver],
}

impl<'r> ResolverChain<'r> {
    pub const fn new(resolvers: &'r [&'r dyn FalconConfigResolver]) -> Self {
        ResolverChain { resolvers }
    }

    pub fn resolve(&self, kind: FalconKind, instance: u8) -> Result<FalconDescriptor, AcrError> {
        for resolver in self.resolvers {
            match resolver.resolve(kind, instance)? {
                Some(desc) if desc.register_base != 0 => {
                    debug!(
                        "{}:{} resolved by {:?} at {:#08x}",
                        kind,
                        instance,
                        resolver.generation(),
                        desc.register_base
                    );
                    return Ok(desc);
                }
                // Layout unchanged in this generation.
                _ => continue,
            }
        }
        error!("no resolver entry for {}:{}", kind, instance);
        Err(AcrError::UnknownFalcon)
    }

    /// Kinds declared by the newest generation of the chain.
    pub fn kinds(&self) -> FalconSet {
        self.resolvers
            .first()
            .map_or(FalconSet::EMPTY, |r| r.kinds())
    }
}

/// Resolver for the configured chip: picks the generation chain and filters
/// out falcon kinds that are not part of this build.
pub struct ChipResolver {
    generation: Generation,
    available: FalconSet,
    ga10x: Ga10x,
    tu10x: Tu10x,
}

impl ChipResolver {
    pub const fn new(config: &AcrConfig) -> Self {
        ChipResolver {
            generation: config.generation,
            available: config.available,
            ga10x: Ga10x::new(config.flavor),
            tu10x: Tu10x::new(config.flavor),
        }
    }

    /// Resolves a falcon into a descriptor for the configured chip.
    pub fn resolve(&self, kind: FalconKind, instance: u8) -> Result<FalconDescriptor, AcrError> {
        if !self.available.contains(kind) {
            error!("{} is not part of this build", kind);
            return Err(AcrError::UnknownFalcon);
        }
        self.with_chain(|chain| chain.resolve(kind, instance))
    }

    /// Falcon kinds that this build may resolve.
    pub fn kinds(&self) -> FalconSet {
        self.with_chain(|chain| chain.kinds())
            .intersect(self.available)
    }

    fn with_chain<T>(&self, f: impl FnOnce(&ResolverChain) -> T) -> T {
        let newest_first: [&dyn FalconConfigResolver; 2] = [&self.ga10x, &self.tu10x];
        let resolvers = match self.generation {
            Generation::Ga10x => &newest_first[..],
            Generation::Tu10x => &newest_first[1..],
        };
        f(&ResolverChain::new(resolvers))
    }
}

/// Whether `kind` bootstraps the LS chain in `flavor`.
pub(crate) const fn is_bootstrap_owner(flavor: BuildFlavor, kind: FalconKind) -> bool {
    flavor.bootstrap_owner() as u8 == kind as u8
}

/// Location of a falcon instance's sub-WPR table in the memory controller.
pub(crate) const fn sub_wpr_table(kind: FalconKind, instance: u8) -> u32 {
    0x1fa910 + (kind as u32) * 0x50 + (instance as u32) * 0x400
}
