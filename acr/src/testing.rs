// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Simulated register file for tests.
//!
//! [`SimBus`] stands in for the falcon's local register space. It emulates
//! the indirect bus master, the hardware mutex unit and the memory scrubber
//! well enough for the ACR to run against it, and records every indirect
//! access in order so tests can assert on the sequence of operations.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use crate::bus::RegisterBus;
use crate::regs;

const CSR_TRIGGER: u32 = 1 << 31;
const CSR_CMD_WRITE: u32 = 1;
const CSR_BUSY: u32 = 1 << 12;
const CSR_ERROR: u32 = 1 << 13;
const ERR_STAT_VALID: u32 = 1 << 31;
const MUTEX_COUNT: u8 = 32;

/// One indirect bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Read(u32, u32),
    Write(u32, u32),
    /// The transaction targeted an address set up to fault.
    Fault(u32),
}

#[derive(Default)]
struct State {
    local: BTreeMap<u32, u32>,
    indirect: BTreeMap<u32, u32>,
    trace: Vec<Access>,

    faults: BTreeSet<u32>,
    faults_after_write: BTreeSet<u32>,
    local_faults: BTreeSet<u32>,
    set_on_write: BTreeMap<u32, u32>,

    bus_busy_polls: u32,
    bus_busy_remaining: u32,

    scrub_polls: u32,
    scrub_remaining: u32,
    scrubs: Vec<(u32, u32, u32)>,

    last_mutex_id: u32,
    mutex_ids: BTreeSet<u32>,
    mutex_ids_exhausted: bool,
}

pub(crate) struct SimBus {
    state: RefCell<State>,
}

impl SimBus {
    pub(crate) fn new() -> Self {
        SimBus {
            state: RefCell::new(State::default()),
        }
    }

    /// Sets an indirect register without recording an access.
    pub(crate) fn poke(&self, addr: u32, value: u32) {
        self.state.borrow_mut().indirect.insert(addr, value);
    }

    /// Reads an indirect register without recording an access.
    pub(crate) fn peek(&self, addr: u32) -> u32 {
        self.state
            .borrow()
            .indirect
            .get(&addr)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn local_peek(&self, offset: u32) -> u32 {
        self.state
            .borrow()
            .local
            .get(&offset)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn trace(&self) -> Vec<Access> {
        self.state.borrow().trace.clone()
    }

    /// Completed indirect writes, in order.
    pub(crate) fn writes(&self) -> Vec<(u32, u32)> {
        self.state
            .borrow()
            .trace
            .iter()
            .filter_map(|a| match a {
                Access::Write(addr, value) => Some((*addr, *value)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn writes_to(&self, addr: u32) -> usize {
        self.writes().iter().filter(|(a, _)| *a == addr).count()
    }

    /// Trace position of the first write to `addr`.
    pub(crate) fn first_write(&self, addr: u32) -> Option<usize> {
        self.trace()
            .iter()
            .position(|a| matches!(a, Access::Write(w, _) if *w == addr))
    }

    /// Trace position of the last write to `addr`.
    pub(crate) fn last_write(&self, addr: u32) -> Option<usize> {
        self.trace()
            .iter()
            .rposition(|a| matches!(a, Access::Write(w, _) if *w == addr))
    }

    /// Trace position of the last read of `addr`.
    pub(crate) fn last_read(&self, addr: u32) -> Option<usize> {
        self.trace()
            .iter()
            .rposition(|a| matches!(a, Access::Read(r, _) if *r == addr))
    }

    /// Makes every bus transaction to `addr` report an error.
    pub(crate) fn fail_at(&self, addr: u32) {
        self.state.borrow_mut().faults.insert(addr);
    }

    /// Makes the next write to `addr` take effect but report an error.
    pub(crate) fn fail_after_write(&self, addr: u32) {
        self.state.borrow_mut().faults_after_write.insert(addr);
    }

    /// Makes every local access to `offset` raise the local error status.
    pub(crate) fn fail_local_at(&self, offset: u32) {
        self.state.borrow_mut().local_faults.insert(offset);
    }

    /// ORs `bits` into whatever is written to `addr`, like a status bit the
    /// hardware sets in response to a command.
    pub(crate) fn on_write_set_bits(&self, addr: u32, bits: u32) {
        self.state.borrow_mut().set_on_write.insert(addr, bits);
    }

    /// Keeps the bus master busy for `polls` status reads per transaction.
    pub(crate) fn set_bus_busy_polls(&self, polls: u32) {
        self.state.borrow_mut().bus_busy_polls = polls;
    }

    /// Keeps the scrubber pending for `polls` status reads per scrub.
    pub(crate) fn set_scrub_polls(&self, polls: u32) {
        self.state.borrow_mut().scrub_polls = polls;
    }

    /// Scrubs started so far as `(start, end, pattern)`.
    pub(crate) fn scrubs(&self) -> Vec<(u32, u32, u32)> {
        self.state.borrow().scrubs.clone()
    }

    /// Marks mutex `index` as held by another owner.
    pub(crate) fn hold_mutex(&self, index: u8, owner: u32) {
        self.poke(regs::mutex::mutex(index), owner);
    }

    pub(crate) fn exhaust_mutex_ids(&self) {
        self.state.borrow_mut().mutex_ids_exhausted = true;
    }

    /// Mutex owner ids handed out and not yet returned.
    pub(crate) fn mutex_ids_outstanding(&self) -> usize {
        self.state.borrow().mutex_ids.len()
    }
}

impl State {
    fn is_mutex(addr: u32) -> bool {
        addr >= regs::mutex::mutex(0) && addr < regs::mutex::mutex(MUTEX_COUNT)
    }

    fn indirect_read(&mut self, addr: u32) -> u32 {
        match addr {
            regs::mutex::ID => {
                if self.mutex_ids_exhausted {
                    return 0xff;
                }
                self.last_mutex_id = self.last_mutex_id % 0xfe + 1;
                self.mutex_ids.insert(self.last_mutex_id);
                self.last_mutex_id
            }
            regs::scrub::STATUS => {
                if self.scrub_remaining > 0 {
                    self.scrub_remaining -= 1;
                    1
                } else {
                    0
                }
            }
            _ => self.indirect.get(&addr).copied().unwrap_or(0),
        }
    }

    fn indirect_write(&mut self, addr: u32, value: u32) {
        match addr {
            regs::mutex::ID_RELEASE => {
                self.mutex_ids.remove(&value);
            }
            regs::scrub::TRIGGER if value & 1 != 0 => {
                self.scrub_remaining = self.scrub_polls;
                let start = self.indirect_read(regs::scrub::START);
                let end = self.indirect_read(regs::scrub::END);
                let pattern = self.indirect_read(regs::scrub::PATTERN);
                self.scrubs.push((start, end, pattern));
            }
            _ if Self::is_mutex(addr) => {
                let held = self.indirect.get(&addr).copied().unwrap_or(0);
                if value == 0 || held == 0 {
                    self.indirect.insert(addr, value);
                }
            }
            _ => {
                let bits = self.set_on_write.get(&addr).copied().unwrap_or(0);
                self.indirect.insert(addr, value | bits);
            }
        }
    }

    fn bus_transaction(&mut self, csr: u32) {
        let addr = self.local.get(&regs::local::BUS_ADDR).copied().unwrap_or(0);
        let mut status = 0;
        if self.faults.contains(&addr) {
            self.trace.push(Access::Fault(addr));
            status |= CSR_ERROR;
        } else if csr & 0x3 == CSR_CMD_WRITE {
            let value = self.local.get(&regs::local::BUS_DATA).copied().unwrap_or(0);
            self.indirect_write(addr, value);
            self.trace.push(Access::Write(addr, value));
            if self.faults_after_write.remove(&addr) {
                status |= CSR_ERROR;
            }
        } else {
            let value = self.indirect_read(addr);
            self.local.insert(regs::local::BUS_DATA, value);
            self.trace.push(Access::Read(addr, value));
        }
        self.bus_busy_remaining = self.bus_busy_polls;
        self.local.insert(regs::local::BUS_CSR, status);
    }

    fn raise_local_fault(&mut self) {
        self.local.insert(regs::local::ERR_STAT, ERR_STAT_VALID);
    }
}

impl RegisterBus for SimBus {
    fn load(&self, offset: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        if state.local_faults.contains(&offset) {
            state.raise_local_fault();
            return 0;
        }
        let value = state.local.get(&offset).copied().unwrap_or(0);
        if offset == regs::local::BUS_CSR && state.bus_busy_remaining > 0 {
            state.bus_busy_remaining -= 1;
            return value | CSR_BUSY;
        }
        value
    }

    fn store(&self, offset: u32, value: u32) {
        let mut state = self.state.borrow_mut();
        if state.local_faults.contains(&offset) {
            state.raise_local_fault();
            return;
        }
        if offset == regs::local::BUS_CSR && value & CSR_TRIGGER != 0 {
            state.bus_transaction(value);
        } else {
            state.local.insert(offset, value);
        }
    }
}
