//! Blocking buffer implementation

use crate::{BufferError, ChannelBatch, Chunk};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

/// Outcome of a blocking wait for a full chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every queue holds at least the requested number of elements
    Ready,
    /// Cancellation was observed before the threshold was met
    Cancelled,
}

/// The five channel queues guarded by the shared mutex
#[derive(Debug, Default)]
struct Queues {
    frequency_ticks: VecDeque<i64>,
    sensing_coil: VecDeque<i32>,
    excitation_coil: VecDeque<i32>,
    in_phase: VecDeque<f64>,
    quadrature: VecDeque<f64>,
}

impl Queues {
    /// Smallest queue length; the drain threshold is checked against this
    fn depth(&self) -> usize {
        self.frequency_ticks
            .len()
            .min(self.sensing_coil.len())
            .min(self.excitation_coil.len())
            .min(self.in_phase.len())
            .min(self.quadrature.len())
    }
}

/// Thread-safe hand-off point between the decode path and the consumer loop.
///
/// All five queues share one mutex and one condition variable; there is no
/// per-queue locking, so the queues can only be observed and drained in
/// lockstep. Queues are unbounded and appends never block.
pub struct ChannelBuffer {
    queues: Mutex<Queues>,
    data_available: Condvar,
}

impl ChannelBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(Queues::default()),
            data_available: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Queues>, BufferError> {
        self.queues.lock().map_err(|_| BufferError::Poisoned)
    }

    /// Atomically push all five sequences of a batch, then wake all waiters.
    pub fn append(&self, batch: ChannelBatch) -> Result<(), BufferError> {
        {
            let mut queues = self.lock()?;
            queues.frequency_ticks.extend(batch.frequency_ticks);
            queues.sensing_coil.extend(batch.sensing_coil);
            queues.excitation_coil.extend(batch.excitation_coil);
            queues.in_phase.extend(batch.in_phase);
            queues.quadrature.extend(batch.quadrature);
        }
        self.data_available.notify_all();
        Ok(())
    }

    /// Current number of complete records held (minimum queue length)
    pub fn depth(&self) -> usize {
        self.lock().map(|q| q.depth()).unwrap_or(0)
    }

    /// Block until every queue holds at least `size` elements.
    ///
    /// Wakes on notification or every `poll` interval to re-check `cancel`,
    /// so a stop request is observed within one poll period even when no
    /// producer ever signals.
    pub fn wait_for_chunk(&self, size: usize, poll: Duration, cancel: &AtomicBool) -> WaitOutcome {
        let mut queues = match self.queues.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("shared buffer mutex poisoned; treating wait as cancelled");
                return WaitOutcome::Cancelled;
            }
        };
        loop {
            if cancel.load(Ordering::Acquire) {
                return WaitOutcome::Cancelled;
            }
            if queues.depth() >= size {
                return WaitOutcome::Ready;
            }
            queues = match self.data_available.wait_timeout(queues, poll) {
                Ok((guard, _timeout)) => guard,
                Err(_) => {
                    warn!("shared buffer mutex poisoned; treating wait as cancelled");
                    return WaitOutcome::Cancelled;
                }
            };
        }
    }

    /// Dequeue exactly `size` elements from each of the five queues under a
    /// single critical section.
    ///
    /// Only valid once `wait_for_chunk` has reported `Ready`; with a single
    /// consumer the threshold cannot regress between the two calls, since
    /// producers only ever append.
    pub fn drain(&self, size: usize) -> Result<Chunk, BufferError> {
        let mut queues = self.lock()?;
        let available = queues.depth();
        if available < size {
            return Err(BufferError::Underfilled {
                needed: size,
                available,
            });
        }
        Ok(Chunk {
            frequency_ticks: queues.frequency_ticks.drain(..size).collect(),
            sensing_coil: queues.sensing_coil.drain(..size).collect(),
            excitation_coil: queues.excitation_coil.drain(..size).collect(),
            in_phase: queues.in_phase.drain(..size).collect(),
            quadrature: queues.quadrature.drain(..size).collect(),
        })
    }

    /// Wake every blocked waiter without appending data.
    ///
    /// Used by the stop path so a pending `wait_for_chunk` observes the
    /// cancellation flag immediately instead of at the next poll tick.
    pub fn notify_all(&self) {
        self.data_available.notify_all();
    }
}

impl Default for ChannelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn batch(n: usize, base: i32) -> ChannelBatch {
        ChannelBatch {
            frequency_ticks: (0..n).map(|i| (base as i64 + i as i64) * 8).collect(),
            sensing_coil: (0..n).map(|i| base + i as i32).collect(),
            excitation_coil: (0..n).map(|i| base + i as i32 + 1).collect(),
            in_phase: (0..n).map(|i| i as f64 * 0.25).collect(),
            quadrature: (0..n).map(|i| i as f64 * -0.25).collect(),
        }
    }

    #[test]
    fn test_append_grows_all_queues_in_lockstep() {
        let buffer = ChannelBuffer::new();
        buffer.append(batch(3, 0)).unwrap();
        buffer.append(batch(2, 10)).unwrap();
        assert_eq!(buffer.depth(), 5);
    }

    #[test]
    fn test_drain_is_fifo_and_exact() {
        let buffer = ChannelBuffer::new();
        buffer.append(batch(4, 0)).unwrap();
        let chunk = buffer.drain(3).unwrap();
        assert_eq!(chunk.len(), 3);
        assert_eq!(chunk.sensing_coil, vec![0, 1, 2]);
        assert_eq!(chunk.frequency_ticks, vec![0, 8, 16]);
        // One element per queue left behind
        assert_eq!(buffer.depth(), 1);
        let rest = buffer.drain(1).unwrap();
        assert_eq!(rest.sensing_coil, vec![3]);
    }

    #[test]
    fn test_drain_underfilled_is_an_error() {
        let buffer = ChannelBuffer::new();
        buffer.append(batch(2, 0)).unwrap();
        let err = buffer.drain(3).unwrap_err();
        match err {
            BufferError::Underfilled { needed, available } => {
                assert_eq!(needed, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wait_returns_ready_once_threshold_met() {
        let buffer = Arc::new(ChannelBuffer::new());
        let cancel = Arc::new(AtomicBool::new(false));

        let producer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                buffer.append(batch(2, 0)).unwrap();
                std::thread::sleep(Duration::from_millis(20));
                buffer.append(batch(3, 2)).unwrap();
            })
        };

        let outcome = buffer.wait_for_chunk(5, Duration::from_millis(100), &cancel);
        assert_eq!(outcome, WaitOutcome::Ready);
        assert_eq!(buffer.depth(), 5);
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_never_returns_ready_on_partial_data() {
        let buffer = ChannelBuffer::new();
        let cancel = AtomicBool::new(false);
        buffer.append(batch(4, 0)).unwrap();

        // Cancel from another thread after the wait has started polling.
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(Duration::from_millis(30));
                cancel.store(true, Ordering::Release);
                buffer.notify_all();
            });
            let outcome = buffer.wait_for_chunk(5, Duration::from_millis(100), &cancel);
            assert_eq!(outcome, WaitOutcome::Cancelled);
        });
        // The partial data was not consumed.
        assert_eq!(buffer.depth(), 4);
    }

    #[test]
    fn test_wait_observes_cancel_without_notification() {
        let buffer = ChannelBuffer::new();
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        let outcome = buffer.wait_for_chunk(1, Duration::from_millis(10), &cancel);
        assert_eq!(outcome, WaitOutcome::Cancelled);
        // Observed at the top of the wait, well before any poll deadline.
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_stop_poll_fires_when_producer_is_silent() {
        let buffer = ChannelBuffer::new();
        let cancel = AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(Duration::from_millis(25));
                // No notify_all: only the poll tick can observe this.
                cancel.store(true, Ordering::Release);
            });
            let outcome = buffer.wait_for_chunk(1, Duration::from_millis(10), &cancel);
            assert_eq!(outcome, WaitOutcome::Cancelled);
        });
    }

    #[test]
    fn test_truncate_lockstep_trims_to_shortest() {
        let mut uneven = batch(3, 0);
        uneven.frequency_ticks.push(99);
        uneven.truncate_lockstep();
        assert_eq!(uneven.record_count(), 3);
        assert_eq!(uneven.frequency_ticks.len(), 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn depth_equals_total_appended_records(sizes in proptest::collection::vec(0usize..32, 0..8)) {
                let buffer = ChannelBuffer::new();
                let mut total = 0;
                for (i, n) in sizes.iter().enumerate() {
                    buffer.append(batch(*n, i as i32)).unwrap();
                    total += n;
                }
                prop_assert_eq!(buffer.depth(), total);
            }
        }
    }
}
