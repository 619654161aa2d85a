//! Lock-free single-producer/single-consumer byte ring between the driver
//! callback and the sample sink.
//!
//! Built on `ringbuf::HeapRb<u8>`, the same crate the teacher uses to bridge
//! RTL-SDR's synchronous read loop into its pull-based pipeline
//! (`sdr/rtlsdr_source.rs`). Back-pressure policy: on insufficient free
//! space the producer counts a drop and discards the packet rather than
//! blocking the driver thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::{HeapConsumer, HeapProducer, HeapRb, Rb};

use crate::acquisition::sink::SampleSink;

/// Result of a `try_push` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    Dropped,
}

/// Drop/in-flight counters shared between producer and consumer halves.
#[derive(Debug, Default)]
struct RingCounters {
    drops: AtomicU64,
    delivered: AtomicU64,
    received: AtomicU64,
}

/// Producer half: owned by the driver callback.
pub struct RingProducer {
    inner: HeapProducer<u8>,
    counters: Arc<RingCounters>,
}

/// Consumer half: owned by the sink thread (or called directly from the
/// callback in direct-write mode, see `CaptureRing::direct`).
pub struct RingConsumer {
    inner: HeapConsumer<u8>,
    counters: Arc<RingCounters>,
}

/// A capture ring split into its producer/consumer halves.
pub struct CaptureRing;

impl CaptureRing {
    /// Allocate a ring of `capacity` bytes and split it.
    pub fn new(capacity: usize) -> (RingProducer, RingConsumer) {
        let rb = HeapRb::<u8>::new(capacity);
        let (producer, consumer) = rb.split();
        let counters = Arc::new(RingCounters::default());
        (
            RingProducer {
                inner: producer,
                counters: counters.clone(),
            },
            RingConsumer {
                inner: consumer,
                counters,
            },
        )
    }
}

impl RingProducer {
    /// Push `src` atomically: either the whole slice is written, or (on
    /// insufficient free space) nothing is written and the drop counter is
    /// incremented. Never blocks.
    pub fn try_push(&mut self, src: &[u8]) -> PushOutcome {
        self.counters
            .received
            .fetch_add(src.len() as u64, Ordering::Relaxed);

        if self.inner.free_len() < src.len() {
            self.counters
                .drops
                .fetch_add(src.len() as u64, Ordering::Relaxed);
            return PushOutcome::Dropped;
        }

        let written = self.inner.push_slice(src);
        debug_assert_eq!(written, src.len());
        self.counters
            .delivered
            .fetch_add(written as u64, Ordering::Relaxed);
        PushOutcome::Pushed
    }

    pub fn drops(&self) -> u64 {
        self.counters.drops.load(Ordering::Relaxed)
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.inner.len() as u64
    }
}

impl RingConsumer {
    /// Drain all currently available bytes into `sink`, returning the
    /// number of bytes written. Stops early if the sink reports its byte
    /// budget has been exhausted.
    pub fn drain_into(&mut self, sink: &mut SampleSink) -> std::io::Result<usize> {
        let mut total = 0usize;
        let mut scratch = [0u8; 8192];

        loop {
            if sink.is_complete() {
                break;
            }
            let n = self.inner.pop_slice(&mut scratch);
            if n == 0 {
                break;
            }
            sink.write(&scratch[..n])?;
            total += n;
        }

        Ok(total)
    }

    pub fn drops(&self) -> u64 {
        self.counters.drops.load(Ordering::Relaxed)
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.inner.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_round_trips_bytes() {
        let (mut producer, mut consumer) = CaptureRing::new(1024);
        let payload = vec![1u8, 2, 3, 4, 5];
        assert_eq!(producer.try_push(&payload), PushOutcome::Pushed);

        let mut out = [0u8; 5];
        let n = consumer.inner.pop_slice(&mut out);
        assert_eq!(n, 5);
        assert_eq!(out, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn overflow_counts_drops_without_corrupting_delivered_bytes() {
        let (mut producer, mut consumer) = CaptureRing::new(8);
        // Ring capacity is one less than backing store (full/empty distinction).
        assert_eq!(producer.try_push(&[0u8; 7]), PushOutcome::Pushed);
        assert_eq!(producer.try_push(&[0u8; 7]), PushOutcome::Dropped);
        assert!(producer.drops() > 0);

        let mut out = [0u8; 7];
        let n = consumer.inner.pop_slice(&mut out);
        assert_eq!(n, 7);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn received_equals_drops_plus_delivered_plus_in_flight() {
        let (mut producer, consumer) = CaptureRing::new(16);
        producer.try_push(&[0u8; 10]);
        producer.try_push(&[0u8; 10]);

        let received = producer.counters.received.load(Ordering::Relaxed);
        let drops = producer.counters.drops.load(Ordering::Relaxed);
        let delivered = producer.counters.delivered.load(Ordering::Relaxed);
        let in_flight = consumer.bytes_in_flight();
        assert_eq!(received, drops + delivered);
        assert_eq!(delivered, in_flight);
    }
}
