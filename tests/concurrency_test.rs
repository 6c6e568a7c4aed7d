//! Concurrency Stress Test - Multi Producer / Multi Consumer
//!
//! Tidak ada sinkronisasi eksternal: semua thread langsung memanggil
//! push_back/pop_front pada satu `Arc<RingBuffer<u64>>`.
//!
//! Usage:
//!   cargo test --release --test concurrency_test -- --nocapture

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use lockring::core::RingBuffer;

const CAPACITY: usize = 64;
const ITEMS_PER_PRODUCER: u64 = 20_000;

/// Item di-encode sebagai (producer_id << 32) | sequence
fn encode(producer: u64, seq: u64) -> u64 {
    (producer << 32) | seq
}

fn decode(item: u64) -> (usize, u64) {
    ((item >> 32) as usize, item & 0xFFFF_FFFF)
}

/// Jalankan producer/consumer, return semua item per consumer
fn run_mpmc(producers: u64, consumers: usize) -> Vec<Vec<u64>> {
    let rb = Arc::new(RingBuffer::new(CAPACITY));
    let produced_done = Arc::new(AtomicBool::new(false));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                for seq in 0..ITEMS_PER_PRODUCER {
                    let item = encode(p, seq);
                    while !rb.push_back(item) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let rb = Arc::clone(&rb);
            let done = Arc::clone(&produced_done);
            let max_seen = Arc::clone(&max_seen);
            thread::spawn(move || {
                let mut received = Vec::new();
                loop {
                    let count = rb.count();
                    max_seen.fetch_max(count, Ordering::Relaxed);

                    match rb.pop_front() {
                        Some(item) => received.push(item),
                        None if done.load(Ordering::Acquire) => {
                            // Producer selesai; drain sisa lalu keluar
                            while let Some(item) = rb.pop_front() {
                                received.push(item);
                            }
                            break;
                        }
                        None => thread::yield_now(),
                    }
                }
                received
            })
        })
        .collect();

    for handle in producer_handles {
        handle.join().unwrap();
    }
    produced_done.store(true, Ordering::Release);

    let results: Vec<Vec<u64>> = consumer_handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert!(max_seen.load(Ordering::Relaxed) <= CAPACITY);
    assert!(rb.is_empty());
    assert_eq!(rb.count() + rb.space(), CAPACITY);

    results
}

#[test]
fn test_mpmc_no_loss_no_duplicates() {
    const PRODUCERS: u64 = 4;
    let results = run_mpmc(PRODUCERS, 4);

    let mut seen = vec![vec![false; ITEMS_PER_PRODUCER as usize]; PRODUCERS as usize];
    let mut total = 0u64;

    for item in results.iter().flatten() {
        let (p, seq) = decode(*item);
        assert!(!seen[p][seq as usize], "item {:#x} popped twice", item);
        seen[p][seq as usize] = true;
        total += 1;
    }

    assert_eq!(total, PRODUCERS * ITEMS_PER_PRODUCER);
}

#[test]
fn test_per_producer_fifo_order() {
    // Single consumer: urutan dari satu producer harus terjaga
    let results = run_mpmc(3, 1);

    let mut last = [None::<u64>; 3];
    for item in &results[0] {
        let (p, seq) = decode(*item);
        if let Some(prev) = last[p] {
            assert!(seq > prev, "producer {} out of order: {} after {}", p, seq, prev);
        }
        last[p] = Some(seq);
    }

    assert_eq!(results[0].len() as u64, 3 * ITEMS_PER_PRODUCER);
}

#[test]
fn test_count_bounded_under_contention() {
    let rb = Arc::new(RingBuffer::new(8));
    let stop = Arc::new(AtomicBool::new(false));
    let violations = Arc::new(AtomicU64::new(0));

    let workers: Vec<_> = (0..4)
        .map(|id| {
            let rb = Arc::clone(&rb);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut i = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    if (i + id) % 2 == 0 {
                        rb.push_back(i);
                    } else {
                        rb.pop_front();
                    }
                    i += 1;
                }
            })
        })
        .collect();

    let observer = {
        let rb = Arc::clone(&rb);
        let violations = Arc::clone(&violations);
        thread::spawn(move || {
            for _ in 0..50_000 {
                let count = rb.count();
                if count > rb.capacity() {
                    violations.fetch_add(1, Ordering::Relaxed);
                }
                // peek harus konsisten dengan count di bawah lock yang sama
                if let Some(elem) = rb.peek(0) {
                    let _ = *elem;
                }
            }
        })
    };

    observer.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(violations.load(Ordering::Relaxed), 0);
    assert!(rb.count() <= rb.capacity());
    assert_eq!(rb.count() + rb.space(), rb.capacity());
}

#[test]
fn test_clear_while_contended() {
    let rb = Arc::new(RingBuffer::new(16));

    let pusher = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            for i in 0..10_000u32 {
                rb.push_back(i);
            }
        })
    };
    let clearer = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            for _ in 0..1_000 {
                rb.clear();
                thread::yield_now();
            }
        })
    };

    pusher.join().unwrap();
    clearer.join().unwrap();

    // Apapun isinya, invariant harus tetap terjaga dan FIFO tetap naik
    let mut prev = None;
    while let Some(v) = rb.pop_front() {
        if let Some(p) = prev {
            assert!(v > p);
        }
        prev = Some(v);
    }
    assert!(rb.is_empty());
    assert_eq!(rb.space(), 16);
}
