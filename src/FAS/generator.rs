//! Randomized candidate generation (the producer role).
//!
//! Each iteration shuffles the distinct vertices into a random target order and
//! collects every edge pointing backward in that order. Removing those edges
//! leaves the graph acyclic, so each iteration yields a feedback arc set.

use std::collections::HashMap;

use log::trace;

use crate::error::Result;
use crate::FAS::producer::{Producer, Publish};
use crate::FAS::Structs::Buffer_Structs::{CandidateRecord, Edge};

/// The input graph: its edges and its distinct vertices in first-seen order.
#[derive(Debug, Clone)]
pub struct Graph {
    edges: Vec<Edge>,
    vertices: Vec<i32>,
}

impl Graph {
    pub fn new(edges: Vec<Edge>) -> Self {
        let mut vertices = Vec::with_capacity(edges.len() * 2);
        for edge in &edges {
            for vertex in [edge.u, edge.v] {
                if !vertices.contains(&vertex) {
                    vertices.push(vertex);
                }
            }
        }
        Self { edges, vertices }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertices(&self) -> &[i32] {
        &self.vertices
    }
}

/// In-place uniform shuffle: for i from n-1 down to 1, swap i with a uniform index in 0..=i.
pub fn fisher_yates<T>(items: &mut [T], rng: &mut fastrand::Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.usize(0..=i);
        items.swap(i, j);
    }
}

/// Edges that point backward in `order` (tail placed after head), plus self-loops.
///
/// Every vertex of `edges` must appear in `order`.
pub fn feedback_arcs(order: &[i32], edges: &[Edge]) -> Vec<Edge> {
    let position: HashMap<i32, usize> = order.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    edges
        .iter()
        .filter(|edge| edge.is_self_loop() || position[&edge.u] > position[&edge.v])
        .copied()
        .collect()
}

/// One iteration's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Fits a record and can be published.
    Fits(CandidateRecord),
    /// Has this many edges, more than a record holds. Dropped.
    Oversized(usize),
}

/// Where a generator sends its candidates.
pub trait CandidateSink {
    /// Whether the consumer still wants candidates.
    fn is_active(&self) -> bool;

    fn publish(&mut self, record: &CandidateRecord) -> Result<Publish>;
}

impl CandidateSink for Producer {
    fn is_active(&self) -> bool {
        Producer::is_active(self)
    }

    fn publish(&mut self, record: &CandidateRecord) -> Result<Publish> {
        Producer::publish(self, record)
    }
}

/// Counters reported when a generator stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorStats {
    pub iterations: u64,
    pub published: u64,
    pub oversized: u64,
}

pub struct Generator {
    graph: Graph,
    order: Vec<i32>,
    rng: fastrand::Rng,
}

impl Generator {
    pub fn new(graph: Graph, rng: fastrand::Rng) -> Self {
        let order = graph.vertices().to_vec();
        Self { graph, order, rng }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The vertex order drawn by the latest iteration.
    pub fn order(&self) -> &[i32] {
        &self.order
    }

    /// Draw a fresh permutation and derive its feedback arc set.
    ///
    /// The candidate's edge list belongs to this call alone; an oversized one is
    /// released before returning.
    pub fn next_candidate(&mut self) -> Candidate {
        fisher_yates(&mut self.order, &mut self.rng);
        let arcs = feedback_arcs(&self.order, self.graph.edges());
        match CandidateRecord::from_edges(&arcs) {
            Some(record) => Candidate::Fits(record),
            None => Candidate::Oversized(arcs.len()),
        }
    }

    /// Generate and publish until the sink goes inactive.
    pub fn run<S: CandidateSink>(&mut self, sink: &mut S) -> Result<GeneratorStats> {
        let mut stats = GeneratorStats::default();

        while sink.is_active() {
            stats.iterations += 1;
            match self.next_candidate() {
                Candidate::Oversized(len) => {
                    stats.oversized += 1;
                    trace!("dropped candidate with {} edges", len);
                }
                Candidate::Fits(record) => match sink.publish(&record)? {
                    Publish::Written => stats.published += 1,
                    Publish::Full => {}
                    Publish::Inactive => break,
                },
            }
        }

        Ok(stats)
    }
}
