use std::io;
use std::ptr::NonNull;
use std::time::Duration;

use log::debug;

use super::{Consumer, Producer};
use crate::config::{Config, IpcNames, DEFAULT_POLL_INTERVAL};
use crate::error::{Error, Result, Role};
use crate::Core::{attach_shared_memory, create_shared_memory, unlink_shared_memory, SharedMemoryBackend};
use crate::FAS::Buffer::layout::{ControlBlock, CONTROL_BLOCK_SIZE};
use crate::FAS::semaphores::SlotSemaphores;

#[derive(Debug, Clone)]
pub struct ChannelBuilder {
    names: IpcNames,
    poll_interval: Duration,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            names: IpcNames::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn control_block(shm: &dyn SharedMemoryBackend) -> io::Result<NonNull<ControlBlock>> {
    let ptr = shm.as_ptr() as *mut ControlBlock;
    if (ptr as usize) % std::mem::align_of::<ControlBlock>() != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Shared memory not properly aligned",
        ));
    }
    if shm.size() < CONTROL_BLOCK_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Shared memory too small for control block",
        ));
    }
    NonNull::new(ptr)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "null shared memory mapping"))
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_names(config.names.clone())
            .with_poll_interval(config.poll_interval)
    }

    pub fn with_names(mut self, names: IpcNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Create the segment, initialize the control block, then create the semaphores.
    /// Supervisor only.
    pub fn build_consumer(self) -> Result<Consumer> {
        let role = Role::Supervisor;
        let shm = create_shared_memory(&self.names.shm, CONTROL_BLOCK_SIZE)
            .map_err(Error::setup(role, "create shared memory"))?;
        let control = match control_block(&*shm) {
            Ok(control) => control,
            Err(e) => {
                let _ = unlink_shared_memory(&self.names.shm);
                return Err(Error::setup(role, "map control block")(e));
            }
        };

        // Safety: freshly mapped, sized and aligned above; no one else has the semaphores yet
        unsafe { control.as_ref() }.initialize();

        let sems = match SlotSemaphores::create(&self.names) {
            Ok(sems) => sems,
            Err(e) => {
                let _ = SlotSemaphores::unlink(&self.names);
                let _ = unlink_shared_memory(&self.names.shm);
                return Err(Error::setup(role, "create semaphores")(e));
            }
        };

        debug!(
            "created segment {} ({} bytes) and semaphores",
            self.names.shm, CONTROL_BLOCK_SIZE
        );
        Ok(Consumer::new(shm, control, sems, self.names))
    }

    /// Attach to the supervisor's segment and open its semaphores. Never creates anything.
    pub fn build_producer(self) -> Result<Producer> {
        let role = Role::Generator;
        let shm = attach_shared_memory(&self.names.shm, CONTROL_BLOCK_SIZE)
            .map_err(Error::setup(role, "open shared memory"))?;
        let control = control_block(&*shm).map_err(Error::setup(role, "map control block"))?;
        let sems = SlotSemaphores::open(&self.names).map_err(Error::setup(role, "open semaphores"))?;

        // Safety: mapped, sized and aligned above
        if !unsafe { control.as_ref() }.buffer.is_initialized() {
            return Err(Error::setup(role, "verify control block")(io::Error::new(
                io::ErrorKind::InvalidData,
                "ring buffer not initialized by a supervisor",
            )));
        }

        debug!("attached to segment {}", self.names.shm);
        Ok(Producer::new(shm, control, sems, self.poll_interval))
    }
}
