// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Access Control Region manager for GPU secure-boot firmware.
//!
//! The ACR owns the hardware memory-protection regions (WPRs) that keep
//! light-secure falcon firmware and its data out of reach of everything
//! else on the chip. This crate covers:
//!
//! - resolving a falcon kind and instance into a [`FalconDescriptor`]
//!   through a chain of per-generation resolvers ([`resolver`]),
//! - the static catalog of sub-WPR slots per falcon kind ([`subwpr`]),
//! - tearing a region down in the only safe order ([`wpr`]),
//! - resetting falcon engines ([`reset`]),
//! - and the register access layer everything funnels through ([`bus`]).
//!
//! [`Acr`] ties these together for one configured chip.
//!
//! The crate is `no_std` and single-threaded. Waiting on hardware is always
//! a busy-wait; every wait is bounded except the wait for a region scrub
//! to complete.

#![cfg_attr(not(test), no_std)]

pub mod acr;
pub mod bus;
pub mod config;
pub mod error;
pub mod falcon;
pub mod hil;
pub mod lockdown;
pub mod mutex;
pub mod regs;
pub mod reset;
pub mod resolver;
pub mod subwpr;
pub mod wpr;

#[cfg(test)]
mod testing;

pub use crate::acr::Acr;
pub use crate::bus::{RegisterAccess, RegisterBus, RegisterSpace};
pub use crate::config::{AcrConfig, BuildFlavor, PollBudget};
pub use crate::error::{status_of, AcrError, STATUS_OK};
pub use crate::falcon::{CoreType, FalconDescriptor, FalconKind, FalconSet};
pub use crate::resolver::Generation;
pub use crate::wpr::{Revocation, WprId, WprRegion};
