pub mod SharedMemory;
pub mod semaphore;

pub use SharedMemory::{
    attach_shared_memory, create_shared_memory, unlink_shared_memory, RawHandle,
    SharedMemoryBackend,
};
pub use semaphore::{CountingSemaphore, NamedSemaphore};
