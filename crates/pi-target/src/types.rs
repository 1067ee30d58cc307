//! Session, device-target and counter value types.

use std::fmt;

bitflags::bitflags! {
    /// Counter units a [`CounterData`] carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CounterUnits: u32 {
        /// The `packets` value is meaningful.
        const PACKETS = 1 << 0;
        /// The `bytes` value is meaningful.
        const BYTES = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags for counter reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CounterReadFlags: u32 {
        /// Synchronize with hardware before returning the value.
        const HW_SYNC = 1 << 0;
    }
}

/// Client session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u32);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {}", self.0)
    }
}

/// Device and pipes an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevTgt {
    pub device_id: u64,
    pub pipe_mask: u16,
}

impl DevTgt {
    /// All pipes of the device.
    pub const ALL_PIPES: u16 = 0xffff;

    /// Targets every pipe of `device_id`.
    pub fn all_pipes(device_id: u64) -> Self {
        Self {
            device_id,
            pipe_mask: Self::ALL_PIPES,
        }
    }
}

impl fmt::Display for DevTgt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev {} pipes {:#06x}", self.device_id, self.pipe_mask)
    }
}

/// Handle of an installed table entry, used to address direct counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHandle(pub u64);

impl fmt::Display for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry {:#x}", self.0)
    }
}

/// A counter value.
///
/// Only the units flagged in `valid` are meaningful; writes leave the
/// other units of the stored counter untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterData {
    pub valid: CounterUnits,
    pub packets: u64,
    pub bytes: u64,
}

impl CounterData {
    /// A value with both units valid.
    pub fn new(packets: u64, bytes: u64) -> Self {
        Self {
            valid: CounterUnits::PACKETS | CounterUnits::BYTES,
            packets,
            bytes,
        }
    }

    /// A value carrying only the packet count.
    pub fn packets(packets: u64) -> Self {
        Self {
            valid: CounterUnits::PACKETS,
            packets,
            bytes: 0,
        }
    }

    /// A value carrying only the byte count.
    pub fn bytes(bytes: u64) -> Self {
        Self {
            valid: CounterUnits::BYTES,
            packets: 0,
            bytes,
        }
    }

    /// Overwrites the units of `self` that `update` flags valid.
    pub fn apply(&mut self, update: &CounterData) {
        if update.valid.contains(CounterUnits::PACKETS) {
            self.packets = update.packets;
        }
        if update.valid.contains(CounterUnits::BYTES) {
            self.bytes = update.bytes;
        }
        self.valid |= update.valid;
    }
}
