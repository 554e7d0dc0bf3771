// This is the shared circular buffer of candidate feedback arc sets

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::AtomicU32;

use crate::FAS::Structs::Buffer_Structs::Edge;

pub use crate::config::{BUFFER_CAPACITY, RECORD_CAPACITY};

/// A fixed-capacity FIFO of candidate records, laid out flat for shared memory.
///
/// This struct lives directly inside the mapped segment: no pointers, no growth.
/// It is a plain data structure; callers provide exclusion (see `write`/`read`).
///
/// ### Field ownership:
/// - **Writers** own `tail` and the slot at `tail` (record edges + edge count).
///   Multiple writers must serialize among themselves.
/// - **The reader** owns `head` and the slot at `head`.
/// - `entry_count` is shared: writers increment it, the reader decrements it.
///   It is atomic so a writer and the reader never race on it.
#[repr(C)]
pub struct RingBuffer {
    /// Record storage, one fixed-size edge array per slot.
    pub entries: [UnsafeCell<[Edge; RECORD_CAPACITY]>; BUFFER_CAPACITY],

    /// Number of valid edges in the matching `entries` slot.
    pub entry_edge_counts: [UnsafeCell<u32>; BUFFER_CAPACITY],

    /// Next slot to read. Touched only by the reader.
    pub head: CachePadded<AtomicU32>,

    /// Next slot to write. Touched only by writers.
    pub tail: CachePadded<AtomicU32>,

    /// Filled slots, `0..=size`.
    pub entry_count: CachePadded<AtomicU32>,

    /// Slot count recorded at initialization; equals `BUFFER_CAPACITY` once initialized.
    pub size: AtomicU32,
}

unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}
