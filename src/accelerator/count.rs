//! Triangle counter (spec §4.9, C9). For each sampled edge `(u, v)`, merge
//! `u`'s forward adjacency (starting one past `v` itself, since sorted
//! order means every earlier neighbor of `u` is `<= v` and thus useless as
//! a third vertex) against `v`'s forward adjacency (starting at
//! `locate(v)`), counting coincidences. This is the classic edge-iterator
//! forward algorithm: every triangle `{a < b < c}` is discovered exactly
//! once, via edge `(a, b)` finding `c` in both runs.

use crate::accelerator::tiered_buffer::Scratchpad;
use crate::accelerator::worker_pool::WorkerPool;
use crate::model::{Edge, NodeLocation};

/// Window size within which a repeated `locate` call is served by a local
/// linear scan of a scratchpad-cached slice instead of a fresh binary
/// search over the full locations array (spec §4.9's scratchpad-vs-tiered
/// binary search switch).
const HOT_CACHE_WINDOW: usize = 64;
const HOT_CACHE_CAPACITY: usize = HOT_CACHE_WINDOW * 2;

/// Caches the most recent `locate` result's neighborhood in a scratchpad
/// window and serves nearby lookups (by `id`) with a linear scan instead of
/// a full binary search over the tiered locations array, since adjacent
/// sample edges very often query nearby node ids.
struct LocationCache<'a> {
    locations: &'a [NodeLocation],
    window: Scratchpad<NodeLocation, HOT_CACHE_CAPACITY>,
    window_start: usize,
    last_hit: usize,
}

impl<'a> LocationCache<'a> {
    fn new(locations: &'a [NodeLocation]) -> Self {
        LocationCache { locations, window: Scratchpad::new(), window_start: 0, last_hit: 0 }
    }

    fn locate(&mut self, id: u32) -> i64 {
        if !self.locations.is_empty() {
            let lo = self.last_hit.saturating_sub(HOT_CACHE_WINDOW);
            let hi = (self.last_hit + HOT_CACHE_WINDOW).min(self.locations.len());
            if self.window.load(&self.locations[lo..hi]).is_ok() {
                self.window_start = lo;
                if let Some(offset) = self.window.as_slice().iter().position(|loc| loc.id == id) {
                    self.last_hit = self.window_start + offset;
                    return self.window.as_slice()[offset].index_in_sample;
                }
            }
        }
        match self.locations.binary_search_by_key(&id, |loc| loc.id) {
            Ok(i) => {
                self.last_hit = i;
                self.locations[i].index_in_sample
            }
            Err(_) => -1,
        }
    }
}

/// Bounded fast-tier prefetch window over one adjacency run (spec §4.9:
/// "each run uses a small scratchpad window"). Refills from the backing
/// sample whenever the requested index falls outside the current window.
struct RunPrefetch<'a> {
    sample: &'a [Edge],
    window: Scratchpad<Edge, RUN_PREFETCH_CAPACITY>,
    window_start: Option<usize>,
}

const RUN_PREFETCH_CAPACITY: usize = 128;

impl<'a> RunPrefetch<'a> {
    fn new(sample: &'a [Edge]) -> Self {
        RunPrefetch { sample, window: Scratchpad::new(), window_start: None }
    }

    fn get(&mut self, idx: usize) -> Edge {
        let needs_refill = match self.window_start {
            Some(start) => idx < start || idx >= start + self.window.len(),
            None => true,
        };
        if needs_refill {
            let end = (idx + RUN_PREFETCH_CAPACITY).min(self.sample.len());
            self.window.load(&self.sample[idx..end]).expect("prefetch window never exceeds its own capacity");
            self.window_start = Some(idx);
        }
        self.window.as_slice()[idx - self.window_start.unwrap()]
    }
}

/// Per-accelerator adjacency-scan diagnostics, surfaced only behind the
/// `--stats` CLI flag (spec §4.9's scratchpad-prefetch note: the heavy-hitter
/// remap is supposed to make the hottest runs contiguous and therefore
/// cheap to scan — `ScanStats` is how the CLI shows whether that held).
#[derive(Debug, Clone, Copy)]
pub struct ScanStats {
    pub min_merge_steps: u64,
    pub max_merge_steps: u64,
    pub total_merge_steps: u64,
    pub merges: u64,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl ScanStats {
    pub fn empty() -> Self {
        ScanStats { min_merge_steps: u64::MAX, max_merge_steps: 0, total_merge_steps: 0, merges: 0 }
    }

    fn record(&mut self, steps: u64) {
        self.min_merge_steps = self.min_merge_steps.min(steps);
        self.max_merge_steps = self.max_merge_steps.max(steps);
        self.total_merge_steps += steps;
        self.merges += 1;
    }

    fn merge(mut self, other: Self) -> Self {
        if other.merges == 0 {
            return self;
        }
        self.min_merge_steps = self.min_merge_steps.min(other.min_merge_steps);
        self.max_merge_steps = self.max_merge_steps.max(other.max_merge_steps);
        self.total_merge_steps += other.total_merge_steps;
        self.merges += other.merges;
        self
    }

    pub fn mean_merge_steps(&self) -> f64 {
        if self.merges == 0 {
            0.0
        } else {
            self.total_merge_steps as f64 / self.merges as f64
        }
    }
}

/// Counts triangles across the whole sample, sharing work over `pool`'s
/// workers by contiguous edge range; each worker accumulates its own
/// local counter and sums are combined once the scope joins (spec §5's
/// barrier-scoped-accumulator shared-state policy).
pub fn count_triangles(sample: &[Edge], locations: &[NodeLocation], pool: WorkerPool) -> u64 {
    count_triangles_with_stats(sample, locations, pool).0
}

/// Same as `count_triangles`, additionally reporting the two-pointer merge
/// lengths walked per sampled edge (spec §4.9; surfaced via `--stats`).
pub fn count_triangles_with_stats(sample: &[Edge], locations: &[NodeLocation], pool: WorkerPool) -> (u64, ScanStats) {
    if sample.is_empty() {
        return (0, ScanStats::empty());
    }
    let mut totals = vec![0u64; pool.size()];
    let mut stats = vec![ScanStats::empty(); pool.size()];
    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(pool.size());
        for worker_id in 0..pool.size() {
            let range = pool.range_for(worker_id, sample.len());
            handles.push(scope.spawn(move || count_range(sample, locations, range)));
        }
        for ((count_slot, stats_slot), handle) in totals.iter_mut().zip(stats.iter_mut()).zip(handles) {
            let (count, scan) = handle.join().expect("counting worker panicked");
            *count_slot = count;
            *stats_slot = scan;
        }
    });
    let count = totals.iter().sum();
    let merged = stats.into_iter().fold(ScanStats::empty(), ScanStats::merge);
    (count, merged)
}

fn count_range(sample: &[Edge], locations: &[NodeLocation], range: std::ops::Range<usize>) -> (u64, ScanStats) {
    let mut cache = LocationCache::new(locations);
    let mut u_run = RunPrefetch::new(sample);
    let mut v_run = RunPrefetch::new(sample);
    let mut count = 0u64;
    let mut stats = ScanStats::empty();
    for i in range {
        let Edge { u, v } = sample[i];
        let v_start = cache.locate(v);
        if v_start < 0 {
            continue;
        }
        let mut u_ptr = i + 1;
        let mut v_ptr = v_start as usize;
        let mut steps = 0u64;
        while u_ptr < sample.len() && u_run.get(u_ptr).u == u && v_ptr < sample.len() && v_run.get(v_ptr).u == v {
            steps += 1;
            let w_u = u_run.get(u_ptr).v;
            let w_v = v_run.get(v_ptr).v;
            match w_u.cmp(&w_v) {
                std::cmp::Ordering::Equal => {
                    count += 1;
                    u_ptr += 1;
                    v_ptr += 1;
                }
                std::cmp::Ordering::Less => u_ptr += 1,
                std::cmp::Ordering::Greater => v_ptr += 1,
            }
        }
        stats.record(steps);
    }
    (count, stats)
}
