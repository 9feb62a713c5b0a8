use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use flakeid_generator::{
    decompose, Error, Generator, HostnameMachineId, Settings, StaticMachineId, MAX_SEQUENCE,
};
use jiff::{SignedDuration, Timestamp};

fn create_generator(machine_id: u16) -> Generator {
    let settings = Settings::builder()
        .machine_id(Arc::new(StaticMachineId(machine_id)))
        .build();
    Generator::new(settings).expect("Failed to create generator")
}

#[test]
fn test_concurrent_callers_receive_unique_ids() {
    let generator = Arc::new(create_generator(42));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                (0..5_000)
                    .map(|_| generator.next_id().unwrap().as_u64())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("worker thread panicked") {
            assert!(seen.insert(id), "duplicate id {id}");
            assert_eq!(decompose(id).machine_id, 42);
        }
    }
    assert_eq!(seen.len(), 8 * 5_000);
}

#[test]
fn test_sequential_ids_are_increasing() {
    let generator = create_generator(7);

    let mut last = generator.next_id().unwrap();
    for _ in 0..10_000 {
        let next = generator.next_id().unwrap();
        assert!(next > last);
        assert!(next.decompose().time >= last.decompose().time);
        last = next;
    }
}

#[test]
fn test_sequence_exhaustion_advances_time() {
    let generator = create_generator(1);

    let first = generator.next_id().unwrap().decompose();
    let mut latest = first;
    for _ in 0..=MAX_SEQUENCE as usize + 1 {
        latest = generator.next_id().unwrap().decompose();
    }
    assert!(latest.time > first.time);
}

#[test]
fn test_start_time_one_hour_ahead_is_rejected() {
    let start_time = Timestamp::now()
        .checked_add(SignedDuration::from_hours(1))
        .unwrap();
    let settings = Settings::builder()
        .start_time(start_time)
        .machine_id(Arc::new(StaticMachineId(1)))
        .build();

    assert!(matches!(
        Generator::new(settings),
        Err(Error::StartTimeAhead { .. })
    ));
}

#[test]
fn test_recent_start_time_gives_small_time_component() {
    let start_time = Timestamp::now()
        .checked_sub(SignedDuration::from_secs(1))
        .unwrap();
    let settings = Settings::builder()
        .start_time(start_time)
        .machine_id(Arc::new(StaticMachineId(1)))
        .build();
    let generator = Generator::new(settings).unwrap();

    let id = generator.next_id().unwrap();
    // one second is 100 units; allow slack for a slow test runner
    let time = id.decompose().time;
    assert!((100..1_000).contains(&time), "unexpected time {time}");

    let minted_at = generator.to_timestamp(id).unwrap();
    assert!(minted_at <= Timestamp::now());
    assert!(minted_at >= start_time);
}

#[test]
fn test_hostname_provider_builds_generator() {
    let settings = Settings::builder()
        .machine_id(Arc::new(HostnameMachineId::with_hostname("build-agent-3")))
        .build();
    let generator = Generator::new(settings).unwrap();

    let expected = HostnameMachineId::with_hostname("build-agent-3");
    let id = generator.next_id().unwrap();
    assert_eq!(
        id.machine_id(),
        flakeid_generator::MachineIdProvider::machine_id(&expected).unwrap()
    );
}
