// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Hardware mutexes.
//!
//! Taking a mutex is a three step dance with the mutex unit: allocate an
//! owner id, write it into the mutex register, then read the register back.
//! If the read-back matches, the mutex is ours. Otherwise somebody else owns
//! it, the id is handed back and the attempt is repeated, up to the mutex
//! retry budget.
//!
//! [`MutexGuard`] ties a held mutex to a scope. It should be released with
//! [`MutexGuard::release`] so the result can be checked, but if it is
//! dropped on an early return it still releases.

use log::{debug, error, warn};

use crate::bus::{RegisterAccess, RegisterSpace};
use crate::regs::{self, MUTEX};
use crate::AcrError;

/// Hardware mutexes used by the ACR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MutexId {
    /// Serializes use of the shared memory scrubber.
    Scrubber = 5,
}

const ID_NOT_AVAILABLE: u32 = 0xff;
const ID_INVALID: u32 = 0x00;

/// Proof of ownership of a hardware mutex.
///
/// Not `Clone`: exactly one release may follow each acquire.
#[derive(Debug, PartialEq, Eq)]
pub struct MutexToken {
    id: MutexId,
    owner: u8,
}

impl MutexToken {
    pub fn mutex(&self) -> MutexId {
        self.id
    }
}

/// Acquires mutex `id`, retrying up to the configured budget.
pub fn acquire(access: &RegisterAccess, id: MutexId) -> Result<MutexToken, AcrError> {
    let reg = regs::mutex::mutex(id as u8);

    for _ in 0..access.budget().mutex_retries {
        let owner = access
            .read_reg::<MUTEX::Register>(RegisterSpace::Indirect, regs::mutex::ID)?
            .read(MUTEX::VALUE);
        if owner == ID_NOT_AVAILABLE || owner == ID_INVALID {
            continue;
        }

        let held = match claim(access, reg, owner) {
            Ok(held) => held,
            Err(e) => {
                abandon(access, reg, owner);
                return Err(e);
            }
        };
        if held == owner {
            debug!("acquired mutex {:?} as owner {}", id, owner);
            return Ok(MutexToken {
                id,
                owner: owner as u8,
            });
        }

        access.write_blocking(RegisterSpace::Indirect, regs::mutex::ID_RELEASE, owner)?;
    }

    error!("mutex {:?} not acquired", id);
    Err(AcrError::MutexTimeout)
}

/// Writes `owner` into the mutex register and reads back who holds it.
fn claim(access: &RegisterAccess, reg: u32, owner: u32) -> Result<u32, AcrError> {
    access.write_blocking(RegisterSpace::Indirect, reg, owner)?;
    Ok(access
        .read_reg::<MUTEX::Register>(RegisterSpace::Indirect, reg)?
        .read(MUTEX::VALUE))
}

/// Undoes a claim that failed partway.
///
/// The write may have landed even though it reported an error, so the
/// register is cleared unless it is known to hold another owner. The owner
/// id is always handed back.
fn abandon(access: &RegisterAccess, reg: u32, owner: u32) {
    let ours = access
        .read_reg::<MUTEX::Register>(RegisterSpace::Indirect, reg)
        .map_or(true, |held| held.read(MUTEX::VALUE) == owner);
    if ours && access.write_blocking(RegisterSpace::Indirect, reg, ID_INVALID).is_err() {
        error!("failed to clear mutex register {:#x}", reg);
    }
    if access
        .write_blocking(RegisterSpace::Indirect, regs::mutex::ID_RELEASE, owner)
        .is_err()
    {
        error!("failed to return mutex owner id {}", owner);
    }
}

/// Releases a mutex taken with [`acquire`].
///
/// The owner id is returned to the allocator even if clearing the mutex
/// register failed; the first error is reported.
pub fn release(access: &RegisterAccess, token: MutexToken) -> Result<(), AcrError> {
    let reg = regs::mutex::mutex(token.id as u8);
    let cleared = access.write_blocking(RegisterSpace::Indirect, reg, ID_INVALID);
    let returned =
        access.write_blocking(RegisterSpace::Indirect, regs::mutex::ID_RELEASE, token.owner as u32);
    debug!("released mutex {:?}", token.id);
    cleared.and(returned)
}

/// Scope guard over a held mutex.
pub struct MutexGuard<'r, 'a> {
    access: &'r RegisterAccess<'a>,
    token: Option<MutexToken>,
}

impl<'r, 'a> MutexGuard<'r, 'a> {
    pub fn acquire(access: &'r RegisterAccess<'a>, id: MutexId) -> Result<Self, AcrError> {
        let token = acquire(access, id)?;
        Ok(MutexGuard {
            access,
            token: Some(token),
        })
    }

    /// Releases the mutex and reports whether that succeeded.
    pub fn release(mut self) -> Result<(), AcrError> {
        match self.token.take() {
            Some(token) => release(self.access, token),
            None => Ok(()),
        }
    }
}

impl Drop for MutexGuard<'_, '_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            warn!("mutex {:?} released on unwind path", token.id);
            if release(self.access, token).is_err() {
                error!("failed to release mutex on unwind path");
            }
        }
    }
}
