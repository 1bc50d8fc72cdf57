// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Error types for the access control region manager.

use core::fmt;

/// Failures reported by ACR operations.
///
/// None of these are retried internally. A failure surfaced while a region
/// is being torn down leaves the protection state unknown, and the caller is
/// expected to stop the boot rather than try again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcrError {
    /// No generation resolver knows this falcon kind or instance.
    UnknownFalcon,

    /// A register transaction reported an error status, or a bounded
    /// idle-wait ran out of polls.
    RegisterAccessFault,

    /// The scrub engine mutex could not be acquired within the retry budget.
    MutexTimeout,

    /// Sub-WPR slot is beyond the falcon's hardware-reported capacity.
    SlotOutOfRange,

    /// An argument was outside of its domain.
    InvalidArgument,
}

impl AcrError {
    /// Status code reported upward to whatever launched this firmware stage.
    pub const fn status_code(self) -> u32 {
        match self {
            AcrError::UnknownFalcon => 0x01,
            AcrError::RegisterAccessFault => 0x02,
            AcrError::MutexTimeout => 0x03,
            AcrError::SlotOutOfRange => 0x04,
            AcrError::InvalidArgument => 0x05,
        }
    }
}

impl From<AcrError> for u32 {
    fn from(err: AcrError) -> u32 {
        err.status_code()
    }
}

impl fmt::Display for AcrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            AcrError::UnknownFalcon => "falcon has no resolver entry",
            AcrError::RegisterAccessFault => "register access fault",
            AcrError::MutexTimeout => "timed out acquiring hardware mutex",
            AcrError::SlotOutOfRange => "sub-WPR slot beyond hardware capacity",
            AcrError::InvalidArgument => "invalid argument",
        };
        f.write_str(msg)
    }
}

/// Success status code; never produced by an [`AcrError`].
pub const STATUS_OK: u32 = 0;

/// Collapses an operation result into the coded status reported upward.
pub fn status_of<T>(result: &Result<T, AcrError>) -> u32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}
