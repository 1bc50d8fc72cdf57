// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register offsets and bitfields used by the ACR.
//!
//! Offsets in [`local`] are in the falcon's own (fast) register space. All
//! others are in the indirect, bus-routed space. Falcon-relative offsets are
//! added to the base addresses found in a
//! [`FalconDescriptor`](crate::falcon::FalconDescriptor).

use tock_registers::{register_bitfields, LocalRegisterCopy};

/// Falcon-local registers of the falcon running this code.
pub mod local {
    /// Indirect bus master: target address.
    pub const BUS_ADDR: u32 = 0x0080;
    /// Indirect bus master: write data / read result.
    pub const BUS_DATA: u32 = 0x0084;
    /// Indirect bus master: command, trigger and status.
    pub const BUS_CSR: u32 = 0x0088;
    /// Error status of the last local register access.
    pub const ERR_STAT: u32 = 0x00a0;
}

/// Write-protected region configuration in the memory controller.
pub mod wpr {
    pub const WPR1_ADDR_LO: u32 = 0x1fa824;
    pub const WPR1_ADDR_HI: u32 = 0x1fa828;
    pub const WPR2_ADDR_LO: u32 = 0x1fa82c;
    pub const WPR2_ADDR_HI: u32 = 0x1fa830;
    pub const ALLOW_READ: u32 = 0x1fa834;
    pub const ALLOW_WRITE: u32 = 0x1fa838;

    /// Region bound registers hold 4 KiB page numbers.
    pub const ADDR_SHIFT: u32 = 12;
    /// Largest page number a bound register can hold.
    pub const MAX_PAGE: u32 = 0x0fff_ffff;
    /// Regions are carved at 128 KiB granularity.
    pub const REGION_ALIGNMENT: u64 = 128 * 1024;

    /// Low bound written when a region or sub-WPR is collapsed. Together with
    /// [`INVALID_ADDR_HI`] it forms an inverted, hence empty, range.
    pub const INVALID_ADDR_LO: u32 = 0x0fff_ffff;
    pub const INVALID_ADDR_HI: u32 = 0x0000_0000;
}

/// Hardware memory scrubber shared by every engine.
pub mod scrub {
    pub const START: u32 = 0x100b20;
    pub const END: u32 = 0x100b24;
    pub const PATTERN: u32 = 0x100b28;
    pub const TRIGGER: u32 = 0x100b2c;
    pub const STATUS: u32 = 0x100b30;

    /// Fill value written over a released region.
    pub const FILL_PATTERN: u32 = 0x0000_0000;
}

/// Hardware mutex unit.
pub mod mutex {
    /// Reading allocates a fresh owner id.
    pub const ID: u32 = 0x10a488;
    /// Writing returns an owner id to the allocator.
    pub const ID_RELEASE: u32 = 0x10a48c;
    const MUTEX_BASE: u32 = 0x10a580;

    pub const fn mutex(index: u8) -> u32 {
        MUTEX_BASE + (index as u32) * 4
    }
}

/// Priv lock-down target mask.
pub mod lockdown {
    pub const TARGET_MASK: u32 = 0x122400;
}

/// Engine inventory reported by the chip topology block.
pub mod topology {
    const ENGINE_COUNT_BASE: u32 = 0x022430;
    const ENGINE_DISABLE_BASE: u32 = 0x022470;
    /// Number of active GPCs, in logical numbering.
    pub const GPC_LOGICAL_COUNT: u32 = 0x0224b0;

    pub const fn engine_count(kind_index: usize) -> u32 {
        ENGINE_COUNT_BASE + (kind_index as u32) * 4
    }

    /// Bit `i` set means physical instance `i` is floorswept.
    pub const fn engine_disable_mask(kind_index: usize) -> u32 {
        ENGINE_DISABLE_BASE + (kind_index as u32) * 4
    }
}

/// Offsets relative to a falcon's `register_base`.
pub mod falcon {
    pub const HWCFG2: u32 = 0x0f4;
}

/// Offsets relative to a falcon's `riscv_register_base`.
pub mod riscv {
    pub const BCR_CTRL: u32 = 0x668;
}

/// Offset of the transfer config for DMA context `ctx`, relative to a
/// falcon's `bus_interface_base`.
pub const fn fbif_transcfg(ctx: u8) -> u32 {
    (ctx as u32) * 4
}

register_bitfields![u32,
    pub BUS_CSR [
        CMD OFFSET(0) NUMBITS(2) [
            Read = 0,
            Write = 1
        ],
        BYTE_ENABLE OFFSET(4) NUMBITS(4) [],
        BUSY OFFSET(12) NUMBITS(1) [],
        ERROR OFFSET(13) NUMBITS(1) [],
        TRIGGER OFFSET(31) NUMBITS(1) []
    ],

    pub ERR_STAT [
        VALID OFFSET(31) NUMBITS(1) []
    ],

    pub WPR_ADDR [
        /// 4 KiB page number
        VAL OFFSET(0) NUMBITS(28) []
    ],

    /// One bit per region id
    pub WPR_ALLOW [
        WPR1 OFFSET(1) NUMBITS(1) [],
        WPR2 OFFSET(2) NUMBITS(1) []
    ],

    pub SUB_WPR_CFGA [
        ALLOW_READ OFFSET(0) NUMBITS(4) [],
        ADDR_LO OFFSET(4) NUMBITS(28) []
    ],

    pub SUB_WPR_CFGB [
        ALLOW_WRITE OFFSET(0) NUMBITS(4) [],
        ADDR_HI OFFSET(4) NUMBITS(28) []
    ],

    pub SCRUB_TRIGGER [
        GO OFFSET(0) NUMBITS(1) []
    ],

    pub SCRUB_STATUS [
        PENDING OFFSET(0) NUMBITS(1) []
    ],

    pub MUTEX [
        VALUE OFFSET(0) NUMBITS(8) []
    ],

    pub COUNT [
        VALUE OFFSET(0) NUMBITS(5) []
    ],

    pub ENGINE [
        RESET OFFSET(0) NUMBITS(1) []
    ],

    pub HWCFG2 [
        /// Set while the falcon auto-scrubs its IMEM/DMEM after reset
        MEM_SCRUBBING OFFSET(12) NUMBITS(1) []
    ],

    pub BCR_CTRL [
        VALID OFFSET(0) NUMBITS(1) [],
        CORE_SELECT OFFSET(4) NUMBITS(1) [
            Falcon = 0,
            RiscV = 1
        ]
    ],

    pub FBIF_TRANSCFG [
        TARGET OFFSET(0) NUMBITS(2) [
            LocalFb = 0,
            CoherentSysmem = 1,
            NoncoherentSysmem = 2
        ],
        MEM_TYPE OFFSET(2) NUMBITS(1) [
            Virtual = 0,
            Physical = 1
        ]
    ]
];

pub type BusCsrVal = LocalRegisterCopy<u32, BUS_CSR::Register>;
pub type WprAddrVal = LocalRegisterCopy<u32, WPR_ADDR::Register>;
pub type WprAllowVal = LocalRegisterCopy<u32, WPR_ALLOW::Register>;
pub type SubWprCfgaVal = LocalRegisterCopy<u32, SUB_WPR_CFGA::Register>;
pub type SubWprCfgbVal = LocalRegisterCopy<u32, SUB_WPR_CFGB::Register>;
pub type BcrCtrlVal = LocalRegisterCopy<u32, BCR_CTRL::Register>;
