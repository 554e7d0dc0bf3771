// src/FAS/producer.rs

use std::ptr::NonNull;
use std::thread;
use std::time::Duration;

use log::{trace, warn};

use crate::error::{Error, Result, Role};
use crate::Core::semaphore::{CountingSemaphore, NamedSemaphore};
use crate::Core::SharedMemoryBackend;
use crate::FAS::Buffer::layout::ControlBlock;
use crate::FAS::semaphores::SlotSemaphores;
use crate::FAS::Structs::Buffer_Structs::CandidateRecord;

/// Outcome of one [`Producer::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// The record is in the ring and `used_slots` was signalled.
    Written,
    /// The ring reported full despite holding a `free_slots` token. Nothing was written;
    /// the call backed off for one poll interval before returning.
    Full,
    /// The supervisor cleared `active`; nothing was written.
    Inactive,
}

/// The generator side of the shared channel.
///
/// Attaches to a segment and semaphores the supervisor created; never creates,
/// resizes or unlinks anything.
pub struct Producer {
    shm: Box<dyn SharedMemoryBackend>,
    control: NonNull<ControlBlock>,
    sems: SlotSemaphores,
    poll_interval: Duration,
}

// The control block is only touched through atomics and the semaphore protocol.
unsafe impl Send for Producer {}

impl Producer {
    pub(crate) fn new(
        shm: Box<dyn SharedMemoryBackend>,
        control: NonNull<ControlBlock>,
        sems: SlotSemaphores,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shm,
            control,
            sems,
            poll_interval,
        }
    }

    pub fn control(&self) -> &ControlBlock {
        // Safety: the mapping lives as long as self.shm
        unsafe { self.control.as_ref() }
    }

    pub fn semaphores(&self) -> &SlotSemaphores {
        &self.sems
    }

    /// Whether the supervisor still wants candidates.
    pub fn is_active(&self) -> bool {
        self.control().is_active()
    }

    /// Wait on `sem` in bounded slices, re-checking `active` between slices.
    /// Returns false, holding nothing, once the supervisor has deactivated.
    fn acquire(&self, sem: &NamedSemaphore, what: &'static str) -> Result<bool> {
        loop {
            if !self.is_active() {
                return Ok(false);
            }
            if sem
                .wait_timeout(self.poll_interval)
                .map_err(Error::semaphore(what))?
            {
                return Ok(true);
            }
        }
    }

    /// Publish one record through the bounded-buffer protocol.
    ///
    /// Blocks while the ring is full or another producer holds `mutex`.
    pub fn publish(&self, record: &CandidateRecord) -> Result<Publish> {
        if !self.acquire(&self.sems.free_slots, "wait free_slots")? {
            return Ok(Publish::Inactive);
        }

        if !self.acquire(&self.sems.mutex, "wait mutex")? {
            self.sems
                .free_slots
                .post()
                .map_err(Error::semaphore("post free_slots"))?;
            return Ok(Publish::Inactive);
        }

        // Safety: mutex is held, so no other producer writes concurrently
        let written = unsafe { self.control().buffer.write(record) };

        self.sems
            .mutex
            .post()
            .map_err(Error::semaphore("post mutex"))?;

        if written {
            self.sems
                .used_slots
                .post()
                .map_err(Error::semaphore("post used_slots"))?;
            trace!("published candidate with {} edges", record.len());
            Ok(Publish::Written)
        } else {
            warn!("ring full while holding a free slot; returning the slot");
            self.sems
                .free_slots
                .post()
                .map_err(Error::semaphore("post free_slots"))?;
            // Slot accounting is off; don't spin on it
            thread::sleep(self.poll_interval);
            Ok(Publish::Full)
        }
    }

    /// Unmap the segment and close the semaphores.
    pub fn close(self) -> Result<()> {
        let Producer { shm, sems, .. } = self;
        let unmapped = shm
            .close()
            .map_err(Error::teardown(Role::Generator, "unmap shared memory"));
        let closed = sems
            .close()
            .map_err(Error::teardown(Role::Generator, "close semaphores"));
        unmapped.and(closed)
    }
}
