// Bounded-buffer protocol tests: a supervisor-side Consumer and generator-side
// Producers attached to the same named segment and semaphores, in one process.

use fas_shm::config::IpcNames;
use fas_shm::error::{Error, Role};
use fas_shm::Core::CountingSemaphore;
use fas_shm::FAS::Buffer::BUFFER_CAPACITY;
use fas_shm::FAS::Structs::{CandidateRecord, Edge};
use fas_shm::FAS::{ChannelBuilder, Consumer, Producer, Publish};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(10);

fn names(tag: &str) -> IpcNames {
    IpcNames::with_namespace(&format!("chan_{}_{}", tag, std::process::id()))
}

fn builder(names: &IpcNames) -> ChannelBuilder {
    ChannelBuilder::new()
        .with_names(names.clone())
        .with_poll_interval(POLL)
}

fn record(tag: i32, seq: i32) -> CandidateRecord {
    CandidateRecord::from_edges(&[Edge::new(tag, seq)]).unwrap()
}

fn counts(consumer: &Consumer) -> (u32, u32) {
    let sems = consumer.semaphores();
    (
        sems.free_slots.value().unwrap(),
        sems.used_slots.value().unwrap(),
    )
}

#[test]
fn accounting_invariant_at_rest() {
    let names = names("acct");
    let consumer = builder(&names).build_consumer().unwrap();
    let producer = builder(&names).build_producer().unwrap();
    println!("{:#?}", consumer);

    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));
    assert_eq!(consumer.semaphores().mutex.value().unwrap(), 1);

    for i in 0..5 {
        assert_eq!(producer.publish(&record(0, i)).unwrap(), Publish::Written);
    }
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32 - 5, 5));
    assert_eq!(consumer.control().buffer.len(), 5);

    for i in 0..2 {
        let got = consumer.receive_timeout(POLL).unwrap().unwrap();
        assert_eq!(got, record(0, i));
    }
    let (free, used) = counts(&consumer);
    assert_eq!((free, used), (BUFFER_CAPACITY as u32 - 3, 3));
    assert_eq!(free + used, BUFFER_CAPACITY as u32);
    assert_eq!(consumer.semaphores().mutex.value().unwrap(), 1);

    producer.close().unwrap();
    consumer.close().unwrap();
}

#[test]
fn receive_times_out_when_empty() {
    let names = names("empty");
    let consumer = builder(&names).build_consumer().unwrap();
    assert!(consumer.receive_timeout(POLL).unwrap().is_none());
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));
    consumer.close().unwrap();
}

#[test]
fn full_ring_blocks_producer_until_a_read() {
    let names = names("full");
    let consumer = builder(&names).build_consumer().unwrap();
    let producer = builder(&names).build_producer().unwrap();

    for i in 0..BUFFER_CAPACITY as i32 {
        assert_eq!(producer.publish(&record(0, i)).unwrap(), Publish::Written);
    }
    assert_eq!(counts(&consumer), (0, BUFFER_CAPACITY as u32));

    let (tx, rx) = mpsc::channel();
    let blocked = thread::spawn(move || {
        let outcome = producer.publish(&record(1, 0)).unwrap();
        tx.send(outcome).unwrap();
        producer
    });

    // Still waiting on free_slots
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    assert_eq!(consumer.receive_blocking().unwrap(), record(0, 0));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Publish::Written);
    blocked.join().unwrap().close().unwrap();

    // FIFO: the late record comes after everything already queued
    for i in 1..BUFFER_CAPACITY as i32 {
        assert_eq!(consumer.receive_blocking().unwrap(), record(0, i));
    }
    assert_eq!(consumer.receive_blocking().unwrap(), record(1, 0));

    consumer.close().unwrap();
}

#[test]
fn deactivate_releases_blocked_producer() {
    let names = names("stop");
    let consumer = builder(&names).build_consumer().unwrap();
    let producer = builder(&names).build_producer().unwrap();

    for i in 0..BUFFER_CAPACITY as i32 {
        producer.publish(&record(0, i)).unwrap();
    }

    let blocked = thread::spawn(move || {
        let outcome = producer.publish(&record(1, 0)).unwrap();
        (outcome, producer)
    });
    thread::sleep(Duration::from_millis(50));
    consumer.deactivate();

    let (outcome, producer) = blocked.join().unwrap();
    assert_eq!(outcome, Publish::Inactive);
    assert!(!producer.is_active());
    assert_eq!(producer.publish(&record(2, 0)).unwrap(), Publish::Inactive);
    assert_eq!(consumer.control().buffer.len(), BUFFER_CAPACITY);

    producer.close().unwrap();
    consumer.close().unwrap();
}

#[test]
fn many_producers_keep_per_producer_order() {
    let names = names("multi");
    let consumer = builder(&names).build_consumer().unwrap();
    let producers = 4;
    let per_producer = 200;

    let handles: Vec<_> = (0..producers)
        .map(|tag| {
            let producer: Producer = builder(&names).build_producer().unwrap();
            thread::spawn(move || {
                for seq in 0..per_producer {
                    assert_eq!(producer.publish(&record(tag, seq)).unwrap(), Publish::Written);
                }
                producer.close().unwrap();
            })
        })
        .collect();

    let mut next = vec![0; producers as usize];
    for _ in 0..producers * per_producer {
        let got = consumer.receive_blocking().unwrap();
        let edge = got.edges()[0];
        assert_eq!(edge.v, next[edge.u as usize], "producer {} out of order", edge.u);
        next[edge.u as usize] += 1;
    }

    for h in handles {
        h.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == per_producer));
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));
    assert!(consumer.control().buffer.is_empty());

    consumer.close().unwrap();
}

#[test]
fn producer_without_supervisor_is_a_setup_error() {
    let names = names("nosup");
    match builder(&names).build_producer() {
        Err(Error::Setup { role, .. }) => assert_eq!(role, Role::Generator),
        other => panic!("expected setup error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn close_removes_every_name() {
    let names = names("close");
    let consumer = builder(&names).build_consumer().unwrap();
    let shm_path = format!("/dev/shm/{}", names.shm);
    assert!(std::path::Path::new(&shm_path).exists());

    consumer.close().unwrap();

    assert!(!std::path::Path::new(&shm_path).exists());
    assert!(builder(&names).build_producer().is_err());
    assert!(fas_shm::Core::NamedSemaphore::open(&names.free_slots).is_err());
    assert!(fas_shm::Core::NamedSemaphore::open(&names.used_slots).is_err());
    assert!(fas_shm::Core::NamedSemaphore::open(&names.mutex).is_err());
}

#[test]
fn producer_keeps_its_mapping_after_supervisor_teardown() {
    let names = names("after");
    let consumer = builder(&names).build_consumer().unwrap();
    let producer = builder(&names).build_producer().unwrap();

    consumer.close().unwrap();

    // Unlinked names don't invalidate open handles; the cleared flag stops the producer
    assert!(!producer.is_active());
    assert_eq!(producer.publish(&record(0, 0)).unwrap(), Publish::Inactive);
    producer.close().unwrap();
}

#[test]
fn restarted_supervisor_is_isolated_from_stale_producers() {
    let names = names("restart");

    // A supervisor that dies without teardown, leaving a producer attached
    let crashed = builder(&names).build_consumer().unwrap();
    let stale = builder(&names).build_producer().unwrap();
    std::mem::forget(crashed);

    let consumer = builder(&names).build_consumer().unwrap();
    assert_eq!(stale.publish(&record(9, 9)).unwrap(), Publish::Written);

    // The stale write landed in the old segment, not the new ring
    assert!(consumer.control().buffer.is_empty());
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));

    let fresh = builder(&names).build_producer().unwrap();
    for i in 0..BUFFER_CAPACITY as i32 {
        assert_eq!(fresh.publish(&record(1, i)).unwrap(), Publish::Written);
    }
    assert_eq!(consumer.receive_timeout(POLL).unwrap(), Some(record(1, 0)));

    fresh.close().unwrap();
    stale.close().unwrap();
    consumer.close().unwrap();
}

#[test]
fn unaccounted_full_ring_backs_off() {
    let names = names("backoff");
    let consumer = builder(&names).build_consumer().unwrap();
    let producer = builder(&names).build_producer().unwrap();

    // Fill the ring behind the semaphores' back
    for i in 0..BUFFER_CAPACITY as i32 {
        assert!(unsafe { consumer.control().buffer.write(&record(0, i)) });
    }

    let start = Instant::now();
    assert_eq!(producer.publish(&record(1, 0)).unwrap(), Publish::Full);
    assert!(start.elapsed() >= POLL);

    // The free token was handed back and the mutex released
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));
    assert_eq!(consumer.semaphores().mutex.value().unwrap(), 1);

    producer.close().unwrap();
    consumer.close().unwrap();
}

#[test]
fn token_without_record_returns_its_slot() {
    let names = names("token");
    let consumer = builder(&names).build_consumer().unwrap();
    let sems = consumer.semaphores();

    // A producer that signalled used_slots without writing
    assert!(sems.free_slots.try_wait().unwrap());
    sems.used_slots.post().unwrap();
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32 - 1, 1));

    assert!(consumer.receive_timeout(POLL).unwrap().is_none());
    assert_eq!(counts(&consumer), (BUFFER_CAPACITY as u32, 0));

    consumer.close().unwrap();
}
