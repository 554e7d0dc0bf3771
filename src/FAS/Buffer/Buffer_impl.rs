use std::cell::UnsafeCell;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};
use std::sync::atomic::AtomicU32;

use crossbeam_utils::CachePadded;

use super::Buffer::{RingBuffer, BUFFER_CAPACITY, RECORD_CAPACITY};
use crate::FAS::Structs::Buffer_Structs::{CandidateRecord, Edge};

impl RingBuffer {
    /// An initialized, empty buffer in ordinary memory.
    pub fn new() -> Self {
        let buffer = Self {
            entries: std::array::from_fn(|_| UnsafeCell::new([Edge::SENTINEL; RECORD_CAPACITY])),
            entry_edge_counts: std::array::from_fn(|_| UnsafeCell::new(0)),
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            entry_count: CachePadded::new(AtomicU32::new(0)),
            size: AtomicU32::new(0),
        };
        buffer.initialize();
        buffer
    }

    /// Reset to the empty state.
    ///
    /// Called exactly once by the segment owner, before any reader or writer attaches.
    pub fn initialize(&self) {
        self.size.store(BUFFER_CAPACITY as u32, Relaxed);
        self.head.store(0, Relaxed);
        self.tail.store(0, Relaxed);
        self.entry_count.store(0, Release);
    }

    /// Whether `initialize` has run on this memory.
    pub fn is_initialized(&self) -> bool {
        self.size.load(Acquire) as usize == BUFFER_CAPACITY
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        BUFFER_CAPACITY
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entry_count.load(Acquire) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.head.load(Relaxed) as usize
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.tail.load(Relaxed) as usize
    }

    /// Store `record` at the tail. Returns false, touching nothing, if the buffer is full.
    ///
    /// Unused edge slots are padded with [`Edge::SENTINEL`].
    ///
    /// # Safety
    /// No other `write` may run concurrently on this buffer (across every process
    /// mapping it). A concurrent `read` is fine.
    pub unsafe fn write(&self, record: &CandidateRecord) -> bool {
        if self.is_full() {
            return false;
        }

        let tail = self.tail();
        *self.entries[tail].get() = *record.slot();
        *self.entry_edge_counts[tail].get() = record.len() as u32;

        self.tail.store(((tail + 1) % self.capacity()) as u32, Relaxed);
        // Publishes the slot contents to the reader.
        self.entry_count.fetch_add(1, AcqRel);
        true
    }

    /// Copy out the record at the head, or `None` if the buffer is empty.
    ///
    /// Only the first `count` edges of the slot are read.
    ///
    /// # Safety
    /// No other `read` may run concurrently on this buffer. Concurrent `write`s are fine.
    pub unsafe fn read(&self) -> Option<CandidateRecord> {
        if self.is_empty() {
            return None;
        }

        let head = self.head();
        let record = CandidateRecord::from_slot(
            &*self.entries[head].get(),
            *self.entry_edge_counts[head].get(),
        );

        self.head.store(((head + 1) % self.capacity()) as u32, Relaxed);
        // Hands the slot back to writers only after it was copied.
        self.entry_count.fetch_sub(1, AcqRel);
        Some(record)
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
