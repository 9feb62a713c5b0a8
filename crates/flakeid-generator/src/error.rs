use jiff::Timestamp;
use thiserror::Error;

/// Errors returned by generator construction and ID generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("start time is ahead of current clock time: start_time={start_time}, now={now}")]
    StartTimeAhead { start_time: Timestamp, now: Timestamp },
    #[error("machine id provider not configured")]
    NoMachineIdProvider,
    #[error("invalid machine id {machine_id}; expected 0..={max_machine_id}")]
    InvalidMachineId { machine_id: u16, max_machine_id: u16 },
    #[error(transparent)]
    MachineIdProvider(#[from] MachineIdError),
    #[error("elapsed time exceeds the 39-bit time field")]
    TimeOverflow,
    #[error("sequence exceeds the 14-bit sequence field")]
    SequenceOverflow,
    #[error("generator state lock is poisoned")]
    StatePoisoned,
}

/// Failure reported by a [`MachineIdProvider`](crate::MachineIdProvider).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineIdError {
    #[error("machine id source unavailable: {0}")]
    Unavailable(String),
    #[error("machine id source returned a malformed value: {0}")]
    Malformed(String),
}
