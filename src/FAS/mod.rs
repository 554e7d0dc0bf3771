mod builder;
mod consumer;
mod debug;
mod producer;
pub mod generator;
pub mod semaphores;
pub mod supervisor;

pub use builder::ChannelBuilder;
pub use consumer::Consumer;
pub use producer::{Producer, Publish};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::{RingBuffer, BUFFER_CAPACITY, RECORD_CAPACITY}; // re-export for stable path
    pub use layout::{ControlBlock, CONTROL_BLOCK_SIZE};
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::{CandidateRecord, Edge}; // re-export for stable path
}
