//! One simulated accelerator: the per-triplet engine that owns a
//! reservoir, sorts it, builds a node-location index and counts
//! triangles (spec §1's core, C5-C9). `Accelerator` is the in-process
//! stand-in for a single UPMEM-style compute unit; the orchestrator
//! (§4.11) drives a pool of these through the phases described in
//! `model::Phase`.

pub mod count;
pub mod locate;
pub mod remap;
pub mod reservoir;
pub mod sort;
pub mod tiered_buffer;
pub mod worker_pool;

use crate::model::{NodeLocation, Triplet};
use reservoir::Reservoir;
use worker_pool::WorkerPool;

pub struct Accelerator {
    pub triplet_id: u64,
    pub triplet: Triplet,
    reservoir: Reservoir,
    locations: Vec<NodeLocation>,
    last_count: u64,
    last_scan_stats: count::ScanStats,
    nr_splits: usize,
    max_node_id: u32,
    seed: u64,
}

impl Accelerator {
    pub fn new(
        triplet_id: u64,
        triplet: Triplet,
        capacity: usize,
        update_capacity: usize,
        max_node_id: u32,
        nr_splits: usize,
        seed: u64,
    ) -> Self {
        Accelerator {
            triplet_id,
            triplet,
            reservoir: Reservoir::new(capacity, update_capacity, seed ^ triplet_id),
            locations: Vec::new(),
            last_count: 0,
            last_scan_stats: count::ScanStats::empty(),
            nr_splits,
            max_node_id,
            seed: seed ^ triplet_id,
        }
    }

    /// Ingest phase (`Phase::Ingest`): folds one edge batch into the
    /// persistent reservoir.
    pub fn ingest(&self, batch: &[crate::model::Edge], pool: WorkerPool) {
        self.reservoir.ingest_batch(batch, pool);
    }

    pub fn ingest_update(&self, batch: &[crate::model::Edge], pool: WorkerPool) {
        self.reservoir.ingest_update_batch(batch, pool);
    }

    /// `Phase::ReverseRemap`: restores original node ids before the next
    /// update's ingest, undoing the previous count phase's remap.
    pub fn reverse_remap(&mut self, top_list: &[(u32, u32)]) {
        if top_list.is_empty() {
            return;
        }
        let max_node_id = self.max_node_id;
        self.reservoir.with_sample_mut(|sample| remap::reverse_remap(sample, top_list, max_node_id));
    }

    /// `Phase::Reset`: wipes per-update counters only, never the reservoir
    /// itself (spec §9's Open Question, spec §3's lifecycle note).
    pub fn reset_update_counters(&self) {
        self.reservoir.reset_update_counter();
    }

    /// `Phase::Count`: remap the top-`t` heavy hitters, sort, rebuild the
    /// node-location index, and count triangles by two-pointer merge.
    /// Returns the raw (uncorrected) per-accelerator triangle count, or an
    /// `Error::Accelerator` if the sort's in-accelerator invariants (the
    /// scratchpad bound, the explicit sort stack's depth) were violated.
    pub fn count(&mut self, top_list: &[(u32, u32)], pool: WorkerPool) -> crate::error::Result<u64> {
        let max_node_id = self.max_node_id;
        let nr_splits = self.nr_splits;
        let seed = self.seed;
        let (locations, total, scan_stats) = self.reservoir.with_sample_mut(|sample| {
            if !top_list.is_empty() {
                remap::remap(sample, top_list, max_node_id);
            }
            sort::tiered_sort(sample, max_node_id, nr_splits, seed)?;
            let locations = locate::build_locations(sample, pool);
            let (total, scan_stats) = count::count_triangles_with_stats(sample, &locations, pool);
            Ok::<_, crate::error::Error>((locations, total, scan_stats))
        })?;
        self.locations = locations;
        self.last_count = total;
        self.last_scan_stats = scan_stats;
        Ok(total)
    }

    /// Adjacency-scan diagnostics from the most recent `count` call, surfaced
    /// only when the CLI's `--stats` flag is set (spec §4.9's prefetch note;
    /// SPEC_FULL.md's ambient `--stats` diagnostic).
    pub fn scan_stats(&self) -> count::ScanStats {
        self.last_scan_stats
    }

    /// Updates the broadcast `max_node_id` ahead of a phase (spec §4.11's
    /// `ExecutionConfig`); the orchestrator calls this on every accelerator
    /// before remap/sort since new updates can raise the running maximum.
    pub fn set_max_node_id(&mut self, max_node_id: u32) {
        self.max_node_id = max_node_id;
    }

    pub fn raw_estimate(&self) -> u64 {
        self.last_count
    }

    pub fn total_edges(&self) -> u64 {
        self.reservoir.total_edges()
    }

    pub fn edges_in_sample(&self) -> usize {
        self.reservoir.edges_in_sample()
    }

    pub fn reservoir_capacity(&self) -> usize {
        self.reservoir.capacity()
    }
}
