use crate::{
    clock::{Clock, SystemClock},
    error::Error,
    flake_id::{FlakeId, MAX_MACHINE_ID, MAX_SEQUENCE, MAX_TIME},
    machine_id::MachineIdProvider,
};
use jiff::{SignedDuration, Timestamp};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// Resolution of the time field.
pub const TIME_UNIT: SignedDuration = SignedDuration::from_millis(TIME_UNIT_MILLIS);
const TIME_UNIT_MILLIS: i64 = 10;

/// Epoch used when [`Settings::start_time`] is not set: 2014-09-01T00:00:00Z.
pub const DEFAULT_START_TIME: Timestamp = Timestamp::constant(1_409_529_600, 0);

/// Predicate applied to the machine id after range checking.
pub type MachineIdCheck = dyn Fn(u16) -> bool + Send + Sync;

/// Configures a [`Generator`].
#[derive(Clone, TypedBuilder)]
pub struct Settings {
    /// Zero point of the 39-bit time field. Must not be in the future.
    ///
    /// Only whole 10 ms units are significant; finer detail is truncated.
    #[builder(default, setter(strip_option))]
    pub start_time: Option<Timestamp>,
    /// Supplies the machine id. Construction fails without one.
    #[builder(default, setter(strip_option))]
    pub machine_id: Option<Arc<dyn MachineIdProvider>>,
    /// Optional extra validation of the machine id.
    #[builder(default, setter(strip_option))]
    pub check_machine_id: Option<Arc<MachineIdCheck>>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("start_time", &self.start_time)
            .field("machine_id", &self.machine_id.is_some())
            .field("check_machine_id", &self.check_machine_id.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct GeneratorState {
    elapsed_units: i64,
    sequence: u16,
}

/// Sonyflake-style ID generator.
///
/// Each call to [`Generator::next_id`] runs under a single lock, including
/// any wait for the clock to catch up, so concurrent callers queue behind a
/// stalled one. Waits are bounded to whole time units.
#[derive(Debug)]
pub struct Generator<C: Clock = SystemClock> {
    start_time: Timestamp,
    start_epoch: i64,
    machine_id: u16,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Generator<SystemClock> {
    /// Creates a generator backed by the real system clock.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Generator<C> {
    /// Creates a generator that reads time from `clock`.
    pub fn with_clock(settings: Settings, clock: C) -> Result<Self, Error> {
        let now = clock.now();
        let start_time = match settings.start_time {
            Some(start_time) if start_time > now => {
                return Err(Error::StartTimeAhead { start_time, now });
            }
            Some(start_time) => start_time,
            None => DEFAULT_START_TIME,
        };

        let provider = settings.machine_id.ok_or(Error::NoMachineIdProvider)?;
        let machine_id = provider.machine_id()?;
        if machine_id > MAX_MACHINE_ID {
            return Err(Error::InvalidMachineId {
                machine_id,
                max_machine_id: MAX_MACHINE_ID,
            });
        }
        if let Some(check) = &settings.check_machine_id {
            if !check(machine_id) {
                return Err(Error::InvalidMachineId {
                    machine_id,
                    max_machine_id: MAX_MACHINE_ID,
                });
            }
        }

        let start_epoch = to_units(start_time);
        let elapsed_units = to_units(now) - start_epoch;

        debug!(machine_id, %start_time, elapsed_units, "id generator initialized");

        Ok(Self {
            start_time,
            start_epoch,
            machine_id,
            clock,
            state: Mutex::new(GeneratorState {
                elapsed_units,
                sequence: 0,
            }),
        })
    }

    pub fn machine_id(&self) -> u16 {
        self.machine_id
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Wall-clock instant at which the time unit of `id` began.
    pub fn to_timestamp(&self, id: FlakeId) -> Option<Timestamp> {
        id.decompose().timestamp(self.start_time)
    }

    /// Generates the next unique id.
    ///
    /// - if the clock is behind the last unit used, wait until it catches up
    /// - if the per-unit sequence is exhausted, move to the next unit and
    ///   wait for the clock to reach it
    pub fn next_id(&self) -> Result<FlakeId, Error> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;

        let current = self.current_units();
        if current > state.elapsed_units {
            state.elapsed_units = current;
            state.sequence = 0;
        } else if current < state.elapsed_units {
            debug!(
                current,
                elapsed_units = state.elapsed_units,
                "clock is behind the generator; waiting"
            );
            self.wait_for_unit(state.elapsed_units)?;
            // Re-read after the wait. The unit never moves backwards, and the
            // sequence only resets when it actually advanced.
            let caught_up = self.current_units().max(state.elapsed_units);
            if caught_up > state.elapsed_units {
                state.elapsed_units = caught_up;
                state.sequence = 0;
            }
        }

        if state.sequence >= MAX_SEQUENCE {
            state.elapsed_units += 1;
            if state.elapsed_units > self.current_units() {
                self.wait_for_unit(state.elapsed_units)?;
            }
            state.sequence = 0;
        }

        state.sequence += 1;

        FlakeId::pack(state.elapsed_units, self.machine_id, state.sequence)
    }

    fn current_units(&self) -> i64 {
        to_units(self.clock.now()) - self.start_epoch
    }

    /// Blocks until the clock reaches the first instant of `units`.
    fn wait_for_unit(&self, units: i64) -> Result<(), Error> {
        if units > MAX_TIME {
            return Err(Error::TimeOverflow);
        }
        let target = from_units(self.start_epoch + units).ok_or(Error::TimeOverflow)?;
        trace!(units, %target, "waiting for clock");
        self.clock.wait_until(target);
        Ok(())
    }
}

/// Whole time units between the Unix epoch and `timestamp`.
pub(crate) fn to_units(timestamp: Timestamp) -> i64 {
    timestamp.as_millisecond() / TIME_UNIT_MILLIS
}

/// First instant of the given unit counted from the Unix epoch.
pub(crate) fn from_units(units: i64) -> Option<Timestamp> {
    let millis = units.checked_mul(TIME_UNIT_MILLIS)?;
    Timestamp::from_millisecond(millis).ok()
}
