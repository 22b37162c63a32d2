//! Link statistics for input ports
//!
//! Throughput is computed over a rolling window of the most recent pushes.
//! Rates are reported in elements and bits per second; their ratio is always
//! the port's element width.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of pushes kept in the rolling window
pub const DEFAULT_STATS_WINDOW: usize = 10;

/// Floor on the measurement span so a burst of pushes never divides by zero
const MIN_SPAN: Duration = Duration::from_micros(1);

/// One recorded push
#[derive(Debug, Clone, Copy)]
struct PushSample {
    /// Elements in the pushed packet
    elements: usize,
    /// Queue fill (percent of capacity) after the push
    queue_fill: f64,
    /// When the push happened
    at: Instant,
}

/// Snapshot of a port's statistics
#[derive(Debug, Clone, Default)]
pub struct PortStatistics {
    /// Port name
    pub port_name: String,
    /// Elements received per second
    pub elements_per_second: f64,
    /// Bits received per second
    pub bits_per_second: f64,
    /// Pushes per second
    pub calls_per_second: f64,
    /// Mean queue fill over the window, percent of capacity
    pub average_queue_depth: f64,
    /// Seconds since the last push
    pub time_since_last_call: f64,
    /// Active stream ids
    pub stream_ids: Vec<String>,
    /// Packets currently queued
    pub queue_depth: usize,
    /// Number of queue collapses since the port was created
    pub flush_count: u64,
}

impl PortStatistics {
    /// Element width implied by the reported rates
    pub fn bits_per_element(&self) -> Option<f64> {
        if self.elements_per_second > 0.0 {
            Some(self.bits_per_second / self.elements_per_second)
        } else {
            None
        }
    }
}

/// Rolling-window throughput tracker
#[derive(Debug, Clone)]
pub struct LinkStatistics {
    /// Width of a single element
    bits_per_element: usize,
    /// Most recent pushes, oldest first
    window: VecDeque<PushSample>,
    /// Maximum number of pushes kept
    window_size: usize,
    /// Whether pushes are being recorded
    enabled: bool,
    /// Start of measurement (creation or last re-enable)
    started_at: Instant,
}

impl LinkStatistics {
    /// Create a tracker for elements of the given width
    ///
    /// A window size of zero is treated as one.
    pub fn new(bits_per_element: usize, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            bits_per_element,
            window: VecDeque::with_capacity(window_size),
            window_size,
            enabled: true,
            started_at: Instant::now(),
        }
    }

    /// Enable or disable recording; re-enabling starts a fresh window
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.window.clear();
            self.started_at = Instant::now();
        }
        self.enabled = enabled;
    }

    /// Check if recording is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a push
    pub fn record(&mut self, elements: usize, queue_fill: f64) {
        if !self.enabled {
            return;
        }
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(PushSample {
            elements,
            queue_fill,
            at: Instant::now(),
        });
    }

    /// Number of pushes in the window
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Fill in the rate fields of a statistics snapshot
    pub fn report(&self, stats: &mut PortStatistics) {
        let Some(last) = self.window.back() else {
            return;
        };
        let now = Instant::now();

        // Until the window fills, measure from the start of recording so a
        // single push still yields a rate
        let span_start = if self.window.len() == self.window_size {
            self.window.front().map_or(self.started_at, |s| s.at)
        } else {
            self.started_at
        };
        let span = now.duration_since(span_start).max(MIN_SPAN).as_secs_f64();

        let elements: usize = self.window.iter().map(|s| s.elements).sum();
        let fill: f64 = self.window.iter().map(|s| s.queue_fill).sum();

        stats.elements_per_second = elements as f64 / span;
        stats.bits_per_second = stats.elements_per_second * self.bits_per_element as f64;
        stats.calls_per_second = self.window.len() as f64 / span;
        stats.average_queue_depth = fill / self.window.len() as f64;
        stats.time_since_last_call = now.duration_since(last.at).as_secs_f64();
    }
}
