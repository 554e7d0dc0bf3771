//! Approximate minimum feedback arc sets, searched by many generator processes
//! and collected by one supervisor through a ring buffer in shared memory.

// Module naming follows project convention (FAS = Feedback Arc Set)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod FAS;
#[allow(non_snake_case)]
mod Debug {
    pub mod StructDebug;
}

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
