//! lockring - benchmark & stress runner
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]
//!   RUST_LOG=debug cargo run --release -- --producers 4 --consumers 4

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use lockring::core::RingBuffer;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(long, default_value_t = 65536, help = "Ring buffer capacity")]
    capacity: usize,
    #[clap(
        long,
        default_value_t = 1_000_000,
        help = "Operations for the single-thread latency benchmark"
    )]
    iterations: usize,
    #[clap(
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Producer threads for the stress run"
    )]
    producers: u64,
    #[clap(
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Consumer threads for the stress run"
    )]
    consumers: u64,
    #[clap(long, default_value_t = 100_000, help = "Items pushed by each producer")]
    stress_items: u64,
    #[clap(long, help = "Only run the single-thread benchmark")]
    skip_stress: bool,
}

/// Hasil stress run
struct StressReport {
    produced: u64,
    consumed: u64,
    checksum_expected: u64,
    checksum_actual: u64,
    full_retries: u64,
    duration: Duration,
}

impl StressReport {
    fn is_consistent(&self) -> bool {
        self.produced == self.consumed && self.checksum_expected == self.checksum_actual
    }

    fn print(&self) {
        println!("  Produced:      {}", self.produced);
        println!("  Consumed:      {}", self.consumed);
        println!("  Full retries:  {}", self.full_retries);
        println!("  Duration:      {:.2}ms", self.duration.as_secs_f64() * 1000.0);
        println!(
            "  Throughput:    {:.2} M items/sec\n",
            self.consumed as f64 / self.duration.as_secs_f64() / 1_000_000.0
        );
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    println!("lockring - Mutex-Guarded Ring Buffer");
    println!("====================================\n");

    benchmark_ring_buffer(args.capacity, args.iterations);

    if args.skip_stress {
        return ExitCode::SUCCESS;
    }

    let report = stress_ring_buffer(
        args.capacity,
        args.producers,
        args.consumers,
        args.stress_items,
    );
    report.print();

    if !report.is_consistent() {
        log::error!(
            "stress run lost or duplicated items: produced={} consumed={} checksum {} != {}",
            report.produced,
            report.consumed,
            report.checksum_expected,
            report.checksum_actual
        );
        return ExitCode::FAILURE;
    }

    println!("All runs complete!");
    ExitCode::SUCCESS
}

fn benchmark_ring_buffer(capacity: usize, iterations: usize) {
    println!("Ring Buffer Benchmark (single thread)");
    println!("-------------------------------------");

    if capacity == 0 {
        log::warn!("capacity is 0, every push fails; skipping benchmark");
        return;
    }

    let rb: RingBuffer<u64> = RingBuffer::new(capacity);

    // Warm up
    for i in 0..capacity.min(1000) as u64 {
        rb.push_back(i);
    }
    while rb.pop_front().is_some() {}

    // Benchmark push
    let start = Instant::now();
    for i in 0..iterations {
        while !rb.push_back(i as u64) {
            rb.pop_front();
        }
    }
    let push_duration = start.elapsed();

    rb.clear();

    // Benchmark pop (refill per window kalau iterations > capacity)
    let mut popped = 0usize;
    let mut pop_duration = Duration::ZERO;
    while popped < iterations {
        let window = (iterations - popped).min(capacity);
        for i in 0..window {
            rb.push_back(i as u64);
        }
        let start = Instant::now();
        for _ in 0..window {
            rb.pop_front();
        }
        pop_duration += start.elapsed();
        popped += window;
    }

    let ops = iterations.max(1) as f64;
    let push_ns = push_duration.as_nanos() as f64 / ops;
    let pop_ns = pop_duration.as_nanos() as f64 / ops;

    println!("  Capacity:   {}", capacity);
    println!("  Operations: {}", iterations);
    println!(
        "  Push latency: {:.2} ns/op ({:.3} μs/op)",
        push_ns,
        push_ns / 1000.0
    );
    println!(
        "  Pop latency:  {:.2} ns/op ({:.3} μs/op)",
        pop_ns,
        pop_ns / 1000.0
    );
    println!(
        "  Throughput:   {:.2} M ops/sec\n",
        ops / push_duration.as_secs_f64().max(f64::EPSILON) / 1_000_000.0
    );
}

fn stress_ring_buffer(
    capacity: usize,
    producers: u64,
    consumers: u64,
    items_per_producer: u64,
) -> StressReport {
    println!("Ring Buffer Stress ({} producers x {} consumers)", producers, consumers);
    println!("------------------------------------------------");

    let rb = Arc::new(RingBuffer::new(capacity.max(1)));
    let done = Arc::new(AtomicBool::new(false));
    let consumed = Arc::new(AtomicU64::new(0));
    let checksum = Arc::new(AtomicU64::new(0));
    let full_retries = Arc::new(AtomicU64::new(0));

    log::info!(
        "starting stress run: capacity={} items_per_producer={}",
        rb.capacity(),
        items_per_producer
    );

    let start = Instant::now();

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let rb = Arc::clone(&rb);
            let full_retries = Arc::clone(&full_retries);
            thread::spawn(move || {
                for seq in 0..items_per_producer {
                    let item = p * items_per_producer + seq;
                    while !rb.push_back(item) {
                        full_retries.fetch_add(1, Ordering::Relaxed);
                        thread::yield_now();
                    }
                }
                log::debug!("producer {} finished", p);
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|c| {
            let rb = Arc::clone(&rb);
            let done = Arc::clone(&done);
            let consumed = Arc::clone(&consumed);
            let checksum = Arc::clone(&checksum);
            thread::spawn(move || {
                let mut local = 0u64;
                let mut local_sum = 0u64;
                loop {
                    match rb.pop_front() {
                        Some(item) => {
                            local += 1;
                            local_sum = local_sum.wrapping_add(item);
                        }
                        None if done.load(Ordering::Acquire) => {
                            while let Some(item) = rb.pop_front() {
                                local += 1;
                                local_sum = local_sum.wrapping_add(item);
                            }
                            break;
                        }
                        None => thread::yield_now(),
                    }
                }
                consumed.fetch_add(local, Ordering::Relaxed);
                checksum.fetch_add(local_sum, Ordering::Relaxed);
                log::debug!("consumer {} finished: {} items", c, local);
            })
        })
        .collect();

    for handle in producer_handles {
        if handle.join().is_err() {
            log::error!("producer thread panicked");
        }
    }
    done.store(true, Ordering::Release);

    for handle in consumer_handles {
        if handle.join().is_err() {
            log::error!("consumer thread panicked");
        }
    }

    if !rb.is_empty() {
        log::warn!("{} items left in buffer after consumers exited", rb.count());
    }

    let produced = producers * items_per_producer;
    let checksum_expected = (0..produced).fold(0u64, |acc, v| acc.wrapping_add(v));

    StressReport {
        produced,
        consumed: consumed.load(Ordering::Relaxed),
        checksum_expected,
        checksum_actual: checksum.load(Ordering::Relaxed),
        full_retries: full_retries.load(Ordering::Relaxed),
        duration: start.elapsed(),
    }
}
