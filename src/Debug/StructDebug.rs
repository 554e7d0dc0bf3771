use std::fmt;

use crate::Core::{CountingSemaphore, NamedSemaphore};
use crate::FAS::semaphores::SlotSemaphores;
use crate::FAS::Buffer::{ControlBlock, RingBuffer};
use crate::FAS::{Consumer, Producer};

/// A semaphore as `name=count`, or `name=?` if the count can't be read.
struct SemaphoreState<'a>(&'a NamedSemaphore);

impl fmt::Debug for SemaphoreState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value() {
            Ok(count) => write!(f, "{}={}", self.0.name(), count),
            Err(_) => write!(f, "{}=?", self.0.name()),
        }
    }
}

/// Debug function for SlotSemaphores
pub fn debug_slot_semaphores(sems: &SlotSemaphores, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
        .entry(&SemaphoreState(&sems.free_slots))
        .entry(&SemaphoreState(&sems.used_slots))
        .entry(&SemaphoreState(&sems.mutex))
        .finish()
}

/// Debug function for RingBuffer
///
/// Shows only the index and counter fields; slot contents may be mid-write
/// by another process and are never read here.
pub fn debug_ring_buffer(buffer: &RingBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingBuffer")
        .field("capacity", &buffer.capacity())
        .field("len", &buffer.len())
        .field("head", &buffer.head())
        .field("tail", &buffer.tail())
        .field("initialized", &buffer.is_initialized())
        .finish_non_exhaustive()
}

/// Debug function for ControlBlock
pub fn debug_control_block(control: &ControlBlock, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ControlBlock")
        .field("active", &control.is_active())
        .field("buffer", &control.buffer)
        .finish()
}

/// Debug function for Producer
///
/// Shows:
/// - Control block location
/// - Control block state
pub fn debug_producer(producer: &Producer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let control = producer.control();
    f.debug_struct("Producer")
        .field("control", &format_args!("{:p}", control))
        .field("state", control)
        .field("semaphores", producer.semaphores())
        .finish_non_exhaustive()
}

/// Debug function for Consumer
pub fn debug_consumer(consumer: &Consumer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let control = consumer.control();
    f.debug_struct("Consumer")
        .field("shm", &consumer.names().shm)
        .field("control", &format_args!("{:p}", control))
        .field("state", control)
        .field("semaphores", consumer.semaphores())
        .finish_non_exhaustive()
}
