//! Error types for fas-shm.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type alias using the crate's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Which process role hit a shared-resource failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Supervisor,
    Generator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Supervisor => f.write_str("supervisor"),
            Role::Generator => f.write_str("generator"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// An edge token that is not `<int>-<int>`.
    #[error("invalid edge `{0}`: expected <int>-<int> with non-negative vertex ids")]
    InvalidEdge(String),

    /// Not enough edges to form a graph worth searching.
    #[error("at least {min} edges are required, got {0}", min = crate::config::MIN_EDGES)]
    TooFewEdges(usize),

    /// Bad environment configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Creating, opening or mapping a shared resource failed.
    #[error("{role}: shared resource setup failed ({what}): {source}")]
    Setup {
        role: Role,
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// Unmapping, closing or unlinking a shared resource failed.
    #[error("{role}: shared resource teardown failed ({what}): {source}")]
    Teardown {
        role: Role,
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// Writing a report line failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A wait or post on one of the synchronization semaphores failed.
    #[error("semaphore operation failed ({what}): {source}")]
    Semaphore {
        what: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn setup(role: Role, what: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Setup { role, what, source }
    }

    pub(crate) fn teardown(role: Role, what: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Teardown { role, what, source }
    }

    pub(crate) fn semaphore(what: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Semaphore { what, source }
    }
}
