//! Engine Lifecycle Control
//!
//! Cross-thread signals shared by the consumer loop and the outside world:
//! a cooperative stop flag and a one-shot sync-request flag.

use channel_buffer::ChannelBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Control flags for the consumer loop.
///
/// The sync request is read-and-cleared exactly once per consumer cycle via
/// an acquire/release swap, so a UI trigger is neither lost nor applied
/// twice. The stop flag is observed at the top of every iteration and inside
/// the buffer wait's poll tick.
pub struct EngineControl {
    stop: AtomicBool,
    sync_request: AtomicBool,
    buffer: Arc<ChannelBuffer>,
}

impl EngineControl {
    /// Create control flags bound to the buffer whose waiters the stop path
    /// must wake
    pub fn new(buffer: Arc<ChannelBuffer>) -> Self {
        Self {
            stop: AtomicBool::new(false),
            sync_request: AtomicBool::new(false),
            buffer,
        }
    }

    /// Request a cooperative stop and wake any blocked buffer wait.
    pub fn request_stop(&self) {
        info!("stop requested for consumer loop");
        self.stop.store(true, Ordering::Release);
        self.buffer.notify_all();
    }

    /// Whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// The raw stop flag, handed to the buffer wait
    pub(crate) fn stop_flag(&self) -> &AtomicBool {
        &self.stop
    }

    /// Arm the one-shot autosync detection for the next chunk.
    pub fn request_sync(&self) {
        self.sync_request.store(true, Ordering::Release);
    }

    /// Consume the sync request: returns true at most once per arm.
    pub fn take_sync_request(&self) -> bool {
        self.sync_request.swap(false, Ordering::AcqRel)
    }
}
