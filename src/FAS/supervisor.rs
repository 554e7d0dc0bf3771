//! Best-solution tracking (the consumer role).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::Result;
use crate::FAS::consumer::Consumer;
use crate::FAS::Structs::Buffer_Structs::CandidateRecord;

/// Where the supervisor reads candidates from.
pub trait CandidateSource {
    /// Wait up to `timeout` for one candidate; `Ok(None)` on timeout.
    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<CandidateRecord>>;
}

impl CandidateSource for Consumer {
    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<CandidateRecord>> {
        Consumer::receive_timeout(self, timeout)
    }
}

/// The smallest feedback arc set seen so far, owned outright.
#[derive(Debug, Default, Clone)]
pub struct BestSolution {
    best: Option<CandidateRecord>,
}

impl BestSolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge count of the best solution; `usize::MAX` before the first one.
    pub fn len(&self) -> usize {
        self.best.as_ref().map_or(usize::MAX, CandidateRecord::len)
    }

    pub fn get(&self) -> Option<&CandidateRecord> {
        self.best.as_ref()
    }

    /// An empty feedback arc set was found: the graph has no cycle.
    pub fn is_acyclic(&self) -> bool {
        self.len() == 0
    }

    /// Keep `record` if it has strictly fewer edges. Returns whether it was kept.
    pub fn offer(&mut self, record: CandidateRecord) -> bool {
        if record.len() < self.len() {
            self.best = Some(record);
            true
        } else {
            false
        }
    }
}

/// Why [`Supervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A zero-edge candidate proved the graph acyclic.
    Acyclic,
    /// The run flag was cleared from outside.
    Stopped,
}

/// Drains candidates, keeps the best one and reports each improvement to `out`.
pub struct Supervisor<W: Write> {
    best: BestSolution,
    out: W,
    poll_interval: Duration,
    received: u64,
}

impl<W: Write> Supervisor<W> {
    pub fn new(out: W) -> Self {
        Self {
            best: BestSolution::new(),
            out,
            poll_interval: DEFAULT_POLL_INTERVAL,
            received: 0,
        }
    }

    /// Longest single wait before `running` is checked again.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn best(&self) -> &BestSolution {
        &self.best
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Consider one candidate; report it if it improves on the best.
    pub fn consider(&mut self, record: CandidateRecord) -> Result<bool> {
        self.received += 1;
        if !self.best.offer(record) {
            return Ok(false);
        }

        if record.is_empty() {
            writeln!(self.out, "The graph is acyclic!")?;
        } else {
            writeln!(self.out, "Solution with {} edges: {}", record.len(), record)?;
        }
        self.out.flush()?;
        info!("new best solution: {} edges", record.len());
        Ok(true)
    }

    /// Loop while `running` is set and no empty solution has been seen.
    pub fn run<S: CandidateSource>(&mut self, source: &mut S, running: &AtomicBool) -> Result<Outcome> {
        writeln!(self.out, "Waiting for a generator...")?;
        self.out.flush()?;

        while running.load(Ordering::Acquire) && !self.best.is_acyclic() {
            if let Some(record) = source.receive_timeout(self.poll_interval)? {
                self.consider(record)?;
            }
        }

        debug!("supervisor consumed {} candidates", self.received);
        if self.best.is_acyclic() {
            Ok(Outcome::Acyclic)
        } else {
            Ok(Outcome::Stopped)
        }
    }
}
