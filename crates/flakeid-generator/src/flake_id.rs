use crate::error::Error;
use crate::generator::{from_units, to_units};
use jiff::Timestamp;
use modular_bitfield::prelude::*;
use std::cmp::Ordering;
use std::fmt;

/// Bit width of the per-unit sequence counter.
pub const BIT_LEN_SEQUENCE: u32 = 14;
/// Bit width of the machine id.
pub const BIT_LEN_MACHINE_ID: u32 = 10;
/// Bit width of the elapsed-time field.
pub const BIT_LEN_TIME: u32 = 39;

pub const MAX_SEQUENCE: u16 = (1 << BIT_LEN_SEQUENCE) - 1;
pub const MAX_MACHINE_ID: u16 = (1 << BIT_LEN_MACHINE_ID) - 1;
pub const MAX_TIME: i64 = (1 << BIT_LEN_TIME) - 1;

const MACHINE_ID_SHIFT: u32 = BIT_LEN_SEQUENCE;
const TIME_SHIFT: u32 = BIT_LEN_MACHINE_ID + BIT_LEN_SEQUENCE;

/// A packed 64-bit identifier.
///
/// Fields are laid out from the least significant bit upwards:
/// `time << 24 | machine_id << 14 | sequence`, with the top bit reserved
/// and always zero.
#[bitfield]
#[repr(u64)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlakeId {
    /// 14 bits for the sequence number (resets every time unit).
    pub sequence: B14,
    /// 10 bits for the machine id (allows up to 1024 machines).
    pub machine_id: B10,
    /// 39 bits for elapsed 10 ms units since the start epoch.
    pub time: B39,
    #[skip]
    __: B1,
}

impl FlakeId {
    /// Packs the three components, rejecting any that overflow their field.
    pub fn pack(time: i64, machine_id: u16, sequence: u16) -> Result<Self, Error> {
        if !(0..=MAX_TIME).contains(&time) {
            return Err(Error::TimeOverflow);
        }
        if sequence > MAX_SEQUENCE {
            return Err(Error::SequenceOverflow);
        }
        if machine_id > MAX_MACHINE_ID {
            return Err(Error::InvalidMachineId {
                machine_id,
                max_machine_id: MAX_MACHINE_ID,
            });
        }

        Ok(Self::new()
            .with_sequence(sequence)
            .with_machine_id(machine_id)
            .with_time(time as u64))
    }

    pub fn as_u64(self) -> u64 {
        self.into()
    }

    pub fn decompose(self) -> DecomposedId {
        decompose(self.as_u64())
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakeId")
            .field("time", &self.time())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u64())
    }
}

impl Ord for FlakeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u64().cmp(&other.as_u64())
    }
}

impl PartialOrd for FlakeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Read-only view of the fields packed into an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecomposedId {
    pub time: i64,
    pub machine_id: u16,
    pub sequence: u16,
}

impl DecomposedId {
    /// Wall-clock instant at which this id's time unit began, given the
    /// start time of the generator that minted it.
    pub fn timestamp(&self, start_time: Timestamp) -> Option<Timestamp> {
        from_units(to_units(start_time).checked_add(self.time)?)
    }
}

impl From<FlakeId> for DecomposedId {
    fn from(id: FlakeId) -> Self {
        id.decompose()
    }
}

/// Splits a raw identifier into its fields.
///
/// Any `u64` is accepted. A value with the reserved top bit set comes back
/// with a `time` beyond [`MAX_TIME`]; callers that need strictness check the
/// ranges themselves.
pub fn decompose(id: u64) -> DecomposedId {
    DecomposedId {
        time: (id >> TIME_SHIFT) as i64,
        machine_id: ((id >> MACHINE_ID_SHIFT) & MAX_MACHINE_ID as u64) as u16,
        sequence: (id & MAX_SEQUENCE as u64) as u16,
    }
}
