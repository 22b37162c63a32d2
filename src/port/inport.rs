//! Input port implementation
//!
//! The port is the meeting point of one producer (the transport layer calling
//! `push_sri`/`push_packet`) and any number of consumers pulling packets.
//! Queue, registry and statistics sit behind a single mutex; consumers park
//! on a condition variable (threads) or a `Notify` (async tasks).

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::Notify;

use super::config::PortConfig;
use super::state::{GetMode, PortUsageState};
use crate::error::PortError;
use crate::payload::Payload;
use crate::queue::{DataTransfer, PacketQueue, QueueCapacity};
use crate::registry::StreamRegistry;
use crate::sri::{PrecisionTime, StreamSri};
use crate::stats::{LinkStatistics, PortStatistics};

/// Callback invoked when a stream becomes active
pub type NewStreamListener = Arc<dyn Fn(&StreamSri) + Send + Sync>;

/// Everything guarded by the port mutex
struct PortInner<P> {
    registry: StreamRegistry,
    queue: PacketQueue<P>,
    stats: LinkStatistics,
    /// Consumer delivery paused
    blocked: bool,
    /// Cleared by `stop()`; pushes are ignored and consumers released
    started: bool,
}

impl<P: Payload> PortInner<P> {
    fn pop(&mut self, stream_id: Option<&str>) -> Option<DataTransfer<P>> {
        if self.blocked {
            return None;
        }
        match stream_id {
            Some(id) => self.queue.dequeue_stream(&mut self.registry, id),
            None => self.queue.dequeue(&mut self.registry),
        }
    }
}

/// How long a consumer is allowed to park
#[derive(Debug, Clone, Copy)]
enum Wait {
    Never,
    Forever,
    Until(Instant),
}

impl From<GetMode> for Wait {
    fn from(mode: GetMode) -> Self {
        match mode {
            GetMode::NonBlocking => Wait::Never,
            GetMode::Blocking => Wait::Forever,
            GetMode::Timeout(timeout) => Instant::now()
                .checked_add(timeout)
                .map_or(Wait::Forever, Wait::Until),
        }
    }
}

/// Input port carrying payloads of type `P`
///
/// Thread-safe; share it behind an `Arc` between the producer and consumers.
pub struct InPort<P: Payload> {
    /// Configuration the port was created with
    config: PortConfig,

    /// Queue, registry and statistics
    inner: Mutex<PortInner<P>>,

    /// Signalled when data arrives or consumers must re-check the port
    data_available: Condvar,

    /// Async counterpart of `data_available`
    async_waiters: Notify,

    /// New-stream callback slot
    listener: Mutex<Option<NewStreamListener>>,
}

impl<P: Payload> InPort<P> {
    /// Create a port with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PortConfig::with_name(name))
    }

    /// Create a port with custom configuration
    pub fn with_config(config: PortConfig) -> Self {
        let mut stats = LinkStatistics::new(P::BITS_PER_ELEMENT, config.stats_window);
        stats.set_enabled(config.stats_enabled);

        Self {
            inner: Mutex::new(PortInner {
                registry: StreamRegistry::new(),
                queue: PacketQueue::with_capacity(config.max_queue_depth),
                stats,
                blocked: false,
                started: true,
            }),
            data_available: Condvar::new(),
            async_waiters: Notify::new(),
            listener: Mutex::new(None),
            config,
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the port was created with
    ///
    /// Later `set_max_queue_depth` calls are not reflected here.
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Announce or update the SRI for a stream
    ///
    /// Fires the new-stream listener if the stream was not active.
    pub fn push_sri(&self, sri: StreamSri) {
        let update = self.lock().registry.update(sri);

        if update.is_new {
            tracing::info!(port = %self.config.name, stream = %update.sri.stream_id, "New stream");
            self.notify_new_stream(&update.sri);
        }
    }

    /// Queue a packet of data for a stream
    ///
    /// Never blocks beyond the port mutex. Overflow collapses the queue
    /// instead of pushing back on the producer.
    pub fn push_packet(&self, data: P, time: PrecisionTime, eos: bool, stream_id: &str) {
        let elements = data.element_count();

        // Activate a stream created by this packet before the packet is
        // visible, so the listener runs ahead of any consumer
        if eos || !data.is_empty() {
            let created = {
                let mut inner = self.lock();
                if !inner.started {
                    tracing::debug!(port = %self.config.name, stream = %stream_id, "Port stopped, dropping packet");
                    return;
                }
                let touched = inner.registry.touch(stream_id);
                touched.is_new.then_some(touched.sri)
            };
            if let Some(sri) = &created {
                self.announce_data_stream(sri);
            }
        }

        let report = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            if !inner.started {
                tracing::debug!(port = %self.config.name, stream = %stream_id, "Port stopped, dropping packet");
                return;
            }

            let report = inner
                .queue
                .enqueue(&mut inner.registry, stream_id, data, time, eos);
            inner.stats.record(elements, inner.queue.fill_percent());
            report
        };

        // The stream was retired again while the listener ran
        if let Some(sri) = &report.new_stream {
            self.announce_data_stream(sri);
        }

        if report.outcome.is_deliverable() {
            self.wake_consumers();
        }
    }

    /// Take the oldest queued packet
    ///
    /// Returns `None` if no packet arrives within the wait allowed by `mode`,
    /// or as soon as the port is stopped.
    pub fn get_packet(&self, mode: GetMode) -> Option<DataTransfer<P>> {
        self.take(mode, None)
    }

    /// Take the oldest queued packet of one stream
    ///
    /// Packets of other streams stay queued in order.
    pub fn get_packet_for(&self, mode: GetMode, stream_id: &str) -> Option<DataTransfer<P>> {
        self.take(mode, Some(stream_id))
    }

    fn take(&self, mode: GetMode, stream_id: Option<&str>) -> Option<DataTransfer<P>> {
        let wait = Wait::from(mode);
        let mut inner = self.lock();

        loop {
            if !inner.started {
                return None;
            }
            if let Some(packet) = inner.pop(stream_id) {
                return Some(packet);
            }

            inner = match wait {
                Wait::Never => return None,
                Wait::Forever => self
                    .data_available
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner),
                Wait::Until(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    self.data_available
                        .wait_timeout(inner, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Wait asynchronously for the oldest queued packet
    ///
    /// Resolves to `None` once the port is stopped.
    pub async fn recv(&self) -> Option<DataTransfer<P>> {
        loop {
            let notified = self.async_waiters.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await still wakes us
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if !inner.started {
                    return None;
                }
                if let Some(packet) = inner.pop(None) {
                    return Some(packet);
                }
            }

            notified.await;
        }
    }

    /// Number of packets currently queued
    pub fn current_queue_depth(&self) -> usize {
        self.lock().queue.depth()
    }

    /// Current queue capacity
    pub fn max_queue_depth(&self) -> QueueCapacity {
        self.lock().queue.capacity()
    }

    /// Set the queue capacity; -1 means unbounded
    ///
    /// Takes effect on the next push; an already over-full queue is not
    /// collapsed until then.
    pub fn set_max_queue_depth(&self, depth: i64) -> Result<(), PortError> {
        let capacity = QueueCapacity::try_from(depth)?;
        self.lock().queue.set_capacity(capacity);
        tracing::debug!(port = %self.config.name, depth = depth, "Max queue depth changed");
        Ok(())
    }

    /// Load indicator derived from queue depth and capacity
    pub fn state(&self) -> PortUsageState {
        let inner = self.lock();
        PortUsageState::from_depth(inner.queue.depth(), inner.queue.capacity())
    }

    /// SRIs of all active streams, ordered by stream id
    pub fn active_sris(&self) -> Vec<StreamSri> {
        self.lock().registry.snapshot()
    }

    /// Ids of all active streams, ordered
    pub fn streams(&self) -> Vec<String> {
        self.active_sris()
            .into_iter()
            .map(|sri| sri.stream_id)
            .collect()
    }

    /// Install the new-stream callback, replacing any previous one
    ///
    /// The callback runs synchronously on the producer thread, after the port
    /// lock is released; it may call back into the port but should return
    /// quickly.
    ///
    /// A stream created by `push_packet` is announced before its first packet
    /// is queued, so consumers cannot see data of a stream the listener has
    /// not been told about yet.
    pub fn set_new_stream_listener<F>(&self, listener: F)
    where
        F: Fn(&StreamSri) + Send + Sync + 'static,
    {
        *self.listener_slot() = Some(Arc::new(listener));
    }

    /// Remove the new-stream callback
    pub fn clear_new_stream_listener(&self) {
        *self.listener_slot() = None;
    }

    /// Replace the test deciding whether a pushed SRI is a change
    pub fn set_sri_comparator<F>(&self, comparator: F)
    where
        F: Fn(&StreamSri, &StreamSri) -> bool + Send + Sync + 'static,
    {
        self.lock().registry.set_comparator(Arc::new(comparator));
    }

    /// Pause consumer delivery; data keeps queueing
    pub fn block(&self) {
        self.lock().blocked = true;
        tracing::debug!(port = %self.config.name, "Delivery blocked");
    }

    /// Resume consumer delivery
    pub fn unblock(&self) {
        self.lock().blocked = false;
        tracing::debug!(port = %self.config.name, "Delivery unblocked");
        self.wake_consumers();
    }

    /// Start accepting data again after `stop()`
    pub fn start(&self) {
        self.lock().started = true;
        tracing::debug!(port = %self.config.name, "Port started");
    }

    /// Tear the port down: release every waiting consumer with `None` and
    /// drop further pushes until restarted
    pub fn stop(&self) {
        self.lock().started = false;
        tracing::debug!(port = %self.config.name, "Port stopped");
        self.wake_consumers();
    }

    /// Check if the port is started
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Turn statistics recording on or off
    pub fn enable_stats(&self, enabled: bool) {
        self.lock().stats.set_enabled(enabled);
    }

    /// Snapshot of link statistics
    pub fn statistics(&self) -> PortStatistics {
        let inner = self.lock();
        let mut stats = PortStatistics {
            port_name: self.config.name.clone(),
            stream_ids: inner
                .registry
                .snapshot()
                .into_iter()
                .map(|sri| sri.stream_id)
                .collect(),
            queue_depth: inner.queue.depth(),
            flush_count: inner.queue.flush_count(),
            ..Default::default()
        };
        inner.stats.report(&mut stats);
        stats
    }

    fn lock(&self) -> MutexGuard<'_, PortInner<P>> {
        // Every critical section leaves the queue consistent, so a panic
        // elsewhere does not invalidate it
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listener_slot(&self) -> MutexGuard<'_, Option<NewStreamListener>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce_data_stream(&self, sri: &StreamSri) {
        tracing::info!(port = %self.config.name, stream = %sri.stream_id, "New stream from data");
        self.notify_new_stream(sri);
    }

    fn notify_new_stream(&self, sri: &StreamSri) {
        let listener = self.listener_slot().clone();
        if let Some(listener) = listener {
            listener(sri);
        }
    }

    fn wake_consumers(&self) {
        self.data_available.notify_all();
        self.async_waiters.notify_waiters();
    }
}
