//! Sonyflake-style 64-bit identifiers.
//!
//! An id packs 39 bits of elapsed 10 ms units since a start epoch, a 10-bit
//! machine id and a 14-bit per-unit sequence:
//!
//! ```text
//! | 0 | time (39) | machine id (10) | sequence (14) |
//! ```
//!
//! ```
//! use std::sync::Arc;
//! use flakeid_generator::{decompose, Generator, Settings, StaticMachineId};
//!
//! let settings = Settings::builder()
//!     .machine_id(Arc::new(StaticMachineId(42)))
//!     .build();
//! let generator = Generator::new(settings).unwrap();
//!
//! let id = generator.next_id().unwrap();
//! assert_eq!(decompose(id.as_u64()).machine_id, 42);
//! ```

mod clock;
pub mod error;
mod flake_id;
mod generator;
mod machine_id;

pub use clock::{Clock, SystemClock};
pub use error::{Error, MachineIdError};
pub use flake_id::{
    decompose, DecomposedId, FlakeId, BIT_LEN_MACHINE_ID, BIT_LEN_SEQUENCE, BIT_LEN_TIME,
    MAX_MACHINE_ID, MAX_SEQUENCE, MAX_TIME,
};
pub use generator::{Generator, MachineIdCheck, Settings, DEFAULT_START_TIME, TIME_UNIT};
pub use machine_id::{HostnameMachineId, MachineIdProvider, StaticMachineId};
