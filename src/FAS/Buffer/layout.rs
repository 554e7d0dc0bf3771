use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::{Acquire, Release};

use super::Buffer::RingBuffer;

/// Size in bytes the shared segment must have.
pub const CONTROL_BLOCK_SIZE: usize = std::mem::size_of::<ControlBlock>();

/// The whole content of the shared segment: the `active` flag followed by the ring.
///
/// Created and initialized by the supervisor before the semaphores exist.
/// Producers check `active` once per loop iteration; the supervisor is the only
/// process that ever clears it, and it never becomes set again.
#[repr(C)]
pub struct ControlBlock {
    /// 1 while generators should keep producing, 0 once the supervisor is done.
    pub active: AtomicU32,

    /// The candidate ring.
    pub buffer: RingBuffer,
}

impl ControlBlock {
    /// Initialize in place: set `active` and reset the ring to empty.
    pub fn initialize(&self) {
        self.buffer.initialize();
        self.active.store(1, Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Acquire) == 1
    }

    /// Tell every attached generator to stop. One-shot.
    pub fn deactivate(&self) {
        self.active.store(0, Release);
    }
}
