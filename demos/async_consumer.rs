//! Async consumer fed by a blocking producer
//!
//! Run with: cargo run --example async_consumer
//!
//! The producer runs on a blocking thread and pushes octet packets for a
//! handful of short-lived streams. The consumer is a tokio task awaiting
//! `recv()`; Ctrl+C stops the port and releases it.

use std::sync::Arc;
use std::time::Duration;

use bulkio_inport::{InOctetPort, PortConfig, PrecisionTime, StreamSri};
use bytes::Bytes;

fn produce(port: &InOctetPort) {
    for burst in 0..5 {
        let stream_id = format!("capture_{}", burst);
        let mut sri = StreamSri::new(stream_id.clone());
        sri.set_keyword("burst", burst as i32);
        port.push_sri(sri);

        for chunk in 0..20u8 {
            let data = Bytes::from(vec![chunk; 188]);
            port.push_packet(data, PrecisionTime::now(), false, &stream_id);
            std::thread::sleep(Duration::from_millis(5));
        }

        // Empty EOS folds into the last queued chunk if it is still waiting
        port.push_packet(Bytes::new(), PrecisionTime::now(), true, &stream_id);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bulkio_inport=debug".parse()?),
        )
        .init();

    let config = PortConfig::with_name("dataOctet_in").stats_window(50);
    let port = Arc::new(InOctetPort::with_config(config));

    let consumer = tokio::spawn({
        let port = Arc::clone(&port);
        async move {
            let mut bytes = 0usize;
            let mut streams = 0usize;
            while let Some(packet) = port.recv().await {
                bytes += packet.data.len();
                if packet.sri_changed {
                    println!(
                        "[{}] SRI: burst={:?}",
                        packet.stream_id,
                        packet.sri.keyword("burst")
                    );
                }
                if packet.eos {
                    streams += 1;
                    println!("[{}] End of stream after {} bytes", packet.stream_id, bytes);
                }
            }
            (streams, bytes)
        }
    });

    let producer = tokio::task::spawn_blocking({
        let port = Arc::clone(&port);
        move || produce(&port)
    });

    tokio::select! {
        result = producer => {
            result?;
            // Give the consumer a moment to drain
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    let stats = port.statistics();
    println!(
        "Port {}: {:.1} calls/s, avg queue fill {:.1}%, flushes={}",
        stats.port_name, stats.calls_per_second, stats.average_queue_depth, stats.flush_count
    );

    port.stop();
    let (streams, bytes) = consumer.await?;
    println!("Consumer finished: {} streams, {} bytes", streams, bytes);

    Ok(())
}
