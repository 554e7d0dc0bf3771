// src/FAS/consumer.rs

use std::ptr::NonNull;
use std::time::Duration;

use log::{debug, warn};

use crate::config::IpcNames;
use crate::error::{Error, Result, Role};
use crate::Core::semaphore::CountingSemaphore;
use crate::Core::{unlink_shared_memory, SharedMemoryBackend};
use crate::FAS::Buffer::layout::ControlBlock;
use crate::FAS::semaphores::SlotSemaphores;
use crate::FAS::Structs::Buffer_Structs::CandidateRecord;

/// The supervisor side of the shared channel.
///
/// Owns the segment and the semaphores: it created them and it is the one that
/// removes them from the system namespace in [`Consumer::close`].
pub struct Consumer {
    shm: Box<dyn SharedMemoryBackend>,
    control: NonNull<ControlBlock>,
    sems: SlotSemaphores,
    names: IpcNames,
}

unsafe impl Send for Consumer {}

impl Consumer {
    pub(crate) fn new(
        shm: Box<dyn SharedMemoryBackend>,
        control: NonNull<ControlBlock>,
        sems: SlotSemaphores,
        names: IpcNames,
    ) -> Self {
        Self {
            shm,
            control,
            sems,
            names,
        }
    }

    pub fn control(&self) -> &ControlBlock {
        // Safety: the mapping lives as long as self.shm
        unsafe { self.control.as_ref() }
    }

    pub fn semaphores(&self) -> &SlotSemaphores {
        &self.sems
    }

    pub fn names(&self) -> &IpcNames {
        &self.names
    }

    fn take(&self) -> Result<Option<CandidateRecord>> {
        // Safety: this is the only reader of the ring
        match unsafe { self.control().buffer.read() } {
            Some(record) => {
                self.sems
                    .free_slots
                    .post()
                    .map_err(Error::semaphore("post free_slots"))?;
                Ok(Some(record))
            }
            None => {
                // The token had no record behind it; hand its slot back to producers
                warn!("used_slots signalled but the ring is empty");
                self.sems
                    .free_slots
                    .post()
                    .map_err(Error::semaphore("post free_slots"))?;
                Ok(None)
            }
        }
    }

    /// Receive one record, waiting at most `timeout` for `used_slots`.
    ///
    /// # Returns
    /// * `Ok(Some(record))` if a record was read
    /// * `Ok(None)` if the wait timed out
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<CandidateRecord>> {
        if !self
            .sems
            .used_slots
            .wait_timeout(timeout)
            .map_err(Error::semaphore("wait used_slots"))?
        {
            return Ok(None);
        }
        self.take()
    }

    /// Receive one record, blocking until a producer publishes.
    pub fn receive_blocking(&self) -> Result<CandidateRecord> {
        loop {
            self.sems
                .used_slots
                .wait()
                .map_err(Error::semaphore("wait used_slots"))?;
            if let Some(record) = self.take()? {
                return Ok(record);
            }
        }
    }

    /// Clear `active` so attached producers stop on their next check.
    pub fn deactivate(&self) {
        self.control().deactivate();
    }

    /// Deactivate, unmap, and remove the segment and semaphores from the system.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn close(self) -> Result<()> {
        self.deactivate();
        let Consumer {
            shm, sems, names, ..
        } = self;

        let results = [
            shm.close()
                .map_err(Error::teardown(Role::Supervisor, "unmap shared memory")),
            unlink_shared_memory(&names.shm)
                .map_err(Error::teardown(Role::Supervisor, "unlink shared memory")),
            sems.close()
                .map_err(Error::teardown(Role::Supervisor, "close semaphores")),
            SlotSemaphores::unlink(&names)
                .map_err(Error::teardown(Role::Supervisor, "unlink semaphores")),
        ];
        debug!("released shared resources for {}", names.shm);
        results.into_iter().collect()
    }
}
