// Plain data exchanged through the shared ring: edges and candidate records

// no atomics and no pointers here; both types are copied in and out of shared memory

use std::fmt;
use std::str::FromStr;

use crate::config::RECORD_CAPACITY;
use crate::error::Error;

/// A directed arc `u -> v`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub u: i32,
    pub v: i32,
}

impl Edge {
    /// Filler for record slots past the valid count. Never a real edge since ids are non-negative.
    pub const SENTINEL: Edge = Edge { u: -1, v: -1 };

    pub const fn new(u: i32, v: i32) -> Self {
        Self { u, v }
    }

    pub fn is_self_loop(&self) -> bool {
        self.u == self.v
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.u, self.v)
    }
}

impl FromStr for Edge {
    type Err = Error;

    /// Parses `<int>-<int>`, e.g. `3-7`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidEdge(token.to_owned());
        let (u, v) = token.split_once('-').ok_or_else(invalid)?;
        let vertex = |s: &str| -> Result<i32, Error> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse().map_err(|_| invalid())
        };
        Ok(Edge::new(vertex(u)?, vertex(v)?))
    }
}

/// One candidate feedback arc set of at most [`RECORD_CAPACITY`] edges.
///
/// `len` is authoritative: slots at or past it hold [`Edge::SENTINEL`] and are never read.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    len: u32,
    edges: [Edge; RECORD_CAPACITY],
}

impl CandidateRecord {
    pub const EMPTY: CandidateRecord = CandidateRecord {
        len: 0,
        edges: [Edge::SENTINEL; RECORD_CAPACITY],
    };

    /// Wrap `edges`, or `None` when there are more than [`RECORD_CAPACITY`].
    pub fn from_edges(edges: &[Edge]) -> Option<Self> {
        if edges.len() > RECORD_CAPACITY {
            return None;
        }
        let mut record = Self::EMPTY;
        record.edges[..edges.len()].copy_from_slice(edges);
        record.len = edges.len() as u32;
        Some(record)
    }

    /// Rebuild from a raw slot. A count beyond capacity is clamped.
    pub(crate) fn from_slot(slot: &[Edge; RECORD_CAPACITY], count: u32) -> Self {
        let len = (count as usize).min(RECORD_CAPACITY);
        Self::from_edges(&slot[..len]).unwrap_or(Self::EMPTY)
    }

    pub(crate) fn slot(&self) -> &[Edge; RECORD_CAPACITY] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.len()]
    }
}

impl Default for CandidateRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for CandidateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.edges()).finish()
    }
}

/// Space separated `u-v` pairs, the form used in solution reports.
impl fmt::Display for CandidateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, edge) in self.edges().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}
