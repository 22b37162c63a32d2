//! Threaded producer/consumer over a float port
//!
//! Run with: cargo run --example threaded_consumer [QUEUE_DEPTH] [PACKETS]
//!
//! Examples:
//!   cargo run --example threaded_consumer              # depth 100, 500 packets
//!   cargo run --example threaded_consumer 8 2000       # small queue, watch it flush
//!   cargo run --example threaded_consumer -1 2000      # unbounded queue
//!
//! The producer pushes packets for three streams as fast as it can while the
//! consumer sleeps a little on every packet. With a bounded queue the port
//! collapses the backlog and the consumer sees `input_queue_flushed`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bulkio_inport::{GetMode, InFloatPort, PrecisionTime, StreamSri};

const STREAMS: [&str; 3] = ["tuner_1", "tuner_2", "tuner_3"];

/// Counters kept by the consumer
#[derive(Default)]
struct ConsumerStats {
    packets: AtomicU64,
    elements: AtomicU64,
    flushed: AtomicU64,
    sri_changes: AtomicU64,
    eos: AtomicU64,
}

impl ConsumerStats {
    fn print(&self) {
        println!(
            "Consumer: packets={} elements={} flushed={} sri_changes={} eos={}",
            self.packets.load(Ordering::Relaxed),
            self.elements.load(Ordering::Relaxed),
            self.flushed.load(Ordering::Relaxed),
            self.sri_changes.load(Ordering::Relaxed),
            self.eos.load(Ordering::Relaxed),
        );
    }
}

fn print_usage() {
    eprintln!("Usage: threaded_consumer [QUEUE_DEPTH] [PACKETS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  QUEUE_DEPTH  Max queue depth, -1 for unbounded (default: 100)");
    eprintln!("  PACKETS      Packets pushed per stream (default: 500)");
}

fn produce(port: &InFloatPort, packets: usize) {
    for (index, id) in STREAMS.iter().enumerate() {
        let sri = StreamSri::new(*id).xdelta(1.0 / (48_000.0 * (index + 1) as f64));
        port.push_sri(sri);
    }

    let mut time = PrecisionTime::now();
    for n in 0..packets {
        for id in STREAMS {
            let eos = n + 1 == packets;
            port.push_packet(vec![n as f32; 1024], time, eos, id);
        }
        time = time + 1024.0 / 48_000.0;

        // Switch the first stream to complex halfway through
        if n == packets / 2 {
            port.push_sri(StreamSri::new(STREAMS[0]).complex(true));
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let depth: i64 = match args.get(1) {
        Some(arg) => arg.parse()?,
        None => 100,
    };
    let packets: usize = match args.get(2) {
        Some(arg) => arg.parse()?,
        None => 500,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bulkio_inport=info".parse()?),
        )
        .init();

    let port = Arc::new(InFloatPort::new("dataFloat_in"));
    port.set_max_queue_depth(depth)?;
    port.set_new_stream_listener(|sri| {
        println!("New stream: {} (xdelta {:e})", sri.stream_id, sri.xdelta);
    });

    let stats = Arc::new(ConsumerStats::default());

    let consumer = {
        let port = Arc::clone(&port);
        let stats = Arc::clone(&stats);
        thread::spawn(move || {
            while let Some(packet) = port.get_packet(GetMode::Blocking) {
                stats.packets.fetch_add(1, Ordering::Relaxed);
                stats
                    .elements
                    .fetch_add(packet.len() as u64, Ordering::Relaxed);
                if packet.input_queue_flushed {
                    stats.flushed.fetch_add(1, Ordering::Relaxed);
                }
                if packet.sri_changed {
                    stats.sri_changes.fetch_add(1, Ordering::Relaxed);
                }
                if packet.eos {
                    stats.eos.fetch_add(1, Ordering::Relaxed);
                    println!("End of stream: {}", packet.stream_id);
                }
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    let producer = {
        let port = Arc::clone(&port);
        thread::spawn(move || produce(&port, packets))
    };

    if producer.join().is_err() {
        eprintln!("Producer thread panicked");
    }

    let report = port.statistics();
    println!(
        "Port {}: {:.0} elements/s, {:.0} bits/s, depth={}, flushes={}",
        report.port_name,
        report.elements_per_second,
        report.bits_per_second,
        report.queue_depth,
        report.flush_count,
    );

    // Drain whatever is left, then release the consumer
    while port.current_queue_depth() > 0 {
        thread::sleep(Duration::from_millis(10));
    }
    port.stop();

    if consumer.join().is_err() {
        eprintln!("Consumer thread panicked");
    }
    stats.print();

    Ok(())
}
