// The three named semaphores of the bounded-buffer protocol

use std::io;

use crate::config::{IpcNames, BUFFER_CAPACITY};
use crate::Core::semaphore::NamedSemaphore;

/// `free_slots` (starts at capacity), `used_slots` (starts at 0) and a binary `mutex`.
///
/// Producers: wait `free_slots`, wait `mutex`, write, post `mutex`, post `used_slots`.
/// Consumer: wait `used_slots`, read, post `free_slots`.
/// At rest `free_slots + used_slots == BUFFER_CAPACITY`.
pub struct SlotSemaphores {
    pub free_slots: NamedSemaphore,
    pub used_slots: NamedSemaphore,
    pub mutex: NamedSemaphore,
}

impl SlotSemaphores {
    /// Create all three with their initial counts. Supervisor only.
    pub fn create(names: &IpcNames) -> io::Result<Self> {
        let free_slots = NamedSemaphore::create(&names.free_slots, BUFFER_CAPACITY as u32)?;
        let used_slots = NamedSemaphore::create(&names.used_slots, 0)?;
        let mutex = NamedSemaphore::create(&names.mutex, 1)?;
        Ok(Self {
            free_slots,
            used_slots,
            mutex,
        })
    }

    /// Open semaphores the supervisor already created.
    pub fn open(names: &IpcNames) -> io::Result<Self> {
        Ok(Self {
            free_slots: NamedSemaphore::open(&names.free_slots)?,
            used_slots: NamedSemaphore::open(&names.used_slots)?,
            mutex: NamedSemaphore::open(&names.mutex)?,
        })
    }

    /// Close every handle; returns the first failure after trying all three.
    pub fn close(self) -> io::Result<()> {
        let results = [
            self.free_slots.close(),
            self.used_slots.close(),
            self.mutex.close(),
        ];
        results.into_iter().collect()
    }

    /// Remove all three names; returns the first failure after trying all three.
    pub fn unlink(names: &IpcNames) -> io::Result<()> {
        let results = [
            NamedSemaphore::unlink(&names.free_slots),
            NamedSemaphore::unlink(&names.used_slots),
            NamedSemaphore::unlink(&names.mutex),
        ];
        results.into_iter().collect()
    }
}
