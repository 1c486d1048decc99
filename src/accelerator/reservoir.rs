//! Reservoir sampler (spec §4.5, C5). Each accelerator owns a reservoir of
//! capacity `M` and, optionally, an update region of capacity `U <= M`
//! used while heavy-hitter remapping is active between updates. Workers
//! share an incoming batch by contiguous index range and synchronize
//! through one mutex-protected fill cursor plus a one-time barrier between
//! "still filling" and "replacing" (spec §4.5's ordering requirement).

use crate::accelerator::worker_pool::WorkerPool;
use crate::model::Edge;
use rand::{Rng, SeedableRng};
use std::sync::{Barrier, Mutex};

pub struct Reservoir {
    capacity: usize,
    sample: Mutex<Vec<Edge>>,
    update: Mutex<Option<Vec<Edge>>>,
    update_capacity: usize,
    total_edges: Mutex<u64>,
    edges_in_update: Mutex<u64>,
    seed: u64,
}

impl Reservoir {
    pub fn new(capacity: usize, update_capacity: usize, seed: u64) -> Self {
        Reservoir {
            capacity,
            sample: Mutex::new(Vec::with_capacity(capacity)),
            update: Mutex::new(if update_capacity > 0 { Some(Vec::with_capacity(update_capacity)) } else { None }),
            update_capacity,
            total_edges: Mutex::new(0),
            edges_in_update: Mutex::new(0),
            seed,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_edges(&self) -> u64 {
        *self.total_edges.lock().unwrap()
    }

    /// `edges_in_sample = min(total_edges, M)` (spec §4.5's invariant).
    pub fn edges_in_sample(&self) -> usize {
        self.sample.lock().unwrap().len()
    }

    /// Resets `edges_in_update` only (spec §9's Open Question: never
    /// implicitly on a phase transition).
    pub fn reset_update_counter(&self) {
        *self.edges_in_update.lock().unwrap() = 0;
    }

    pub fn sample_snapshot(&self) -> Vec<Edge> {
        self.sample.lock().unwrap().clone()
    }

    pub fn into_sample(self) -> Vec<Edge> {
        self.sample.into_inner().unwrap()
    }

    /// Grants exclusive access to the backing sample array for in-place
    /// remap/sort/count, so that the remapped-and-sorted physical layout
    /// persists until the next update's `REVERSE_REMAP` (spec §4.11).
    pub fn with_sample_mut<R>(&self, f: impl FnOnce(&mut Vec<Edge>) -> R) -> R {
        let mut sample = self.sample.lock().unwrap();
        f(&mut sample)
    }

    /// Ingests one batch of edges, sharing it across `pool`'s workers by
    /// contiguous range. Each worker races the fill cursor for as long as
    /// there is free space, then crosses a barrier before switching to
    /// weighted replacement for any edges it still owns (spec §4.5 steps
    /// 1-3).
    pub fn ingest_batch(&self, batch: &[Edge], pool: WorkerPool) {
        let barrier = Barrier::new(pool.size());
        std::thread::scope(|scope| {
            for worker_id in 0..pool.size() {
                let range = pool.range_for(worker_id, batch.len());
                let barrier = &barrier;
                scope.spawn(move || {
                    self.ingest_worker(worker_id, &batch[range], barrier);
                });
            }
        });
    }

    fn ingest_worker(&self, worker_id: usize, slice: &[Edge], barrier: &Barrier) {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(self.seed ^ (worker_id as u64).wrapping_mul(0x9E3779B97F4A7C15));
        let mut cursor = 0;

        // Phase 1: fill, while there is free space, claiming contiguous
        // destination ranges under the sample mutex.
        while cursor < slice.len() {
            let mut sample = self.sample.lock().unwrap();
            if sample.len() >= self.capacity {
                break;
            }
            sample.push(slice[cursor]);
            drop(sample);
            *self.total_edges.lock().unwrap() += 1;
            cursor += 1;
        }

        // One-time barrier: no worker proceeds to replacement until every
        // worker has either exhausted its slice in the fill phase or
        // observed the reservoir full (spec §4.5 step 3).
        barrier.wait();

        // Phase 2: weighted replacement for whatever remains.
        for &edge in &slice[cursor..] {
            let total = {
                let mut total_edges = self.total_edges.lock().unwrap();
                *total_edges += 1;
                *total_edges
            };
            let u: f64 = rng.random_range(0.0..1.0);
            if u < self.capacity as f64 / total as f64 {
                let idx = rng.random_range(0..self.capacity);
                let mut sample = self.sample.lock().unwrap();
                if idx < sample.len() {
                    sample[idx] = edge;
                }
            }
        }
    }

    /// Mirrors `ingest_batch` for the optional update region, used while an
    /// update is in flight alongside the frozen previous sample.
    pub fn ingest_update_batch(&self, batch: &[Edge], pool: WorkerPool) {
        if self.update_capacity == 0 {
            return;
        }
        let barrier = Barrier::new(pool.size());
        std::thread::scope(|scope| {
            for worker_id in 0..pool.size() {
                let range = pool.range_for(worker_id, batch.len());
                let barrier = &barrier;
                scope.spawn(move || {
                    self.ingest_update_worker(worker_id, &batch[range], barrier);
                });
            }
        });
    }

    fn ingest_update_worker(&self, worker_id: usize, slice: &[Edge], barrier: &Barrier) {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(
            self.seed ^ 0xD1B5_4A32_D192_ED03 ^ (worker_id as u64).wrapping_mul(0x9E3779B97F4A7C15),
        );
        let mut cursor = 0;
        while cursor < slice.len() {
            let mut update = self.update.lock().unwrap();
            let region = update.as_mut().expect("update region enabled");
            if region.len() >= self.update_capacity {
                break;
            }
            region.push(slice[cursor]);
            drop(update);
            *self.edges_in_update.lock().unwrap() += 1;
            cursor += 1;
        }

        barrier.wait();

        for &edge in &slice[cursor..] {
            let total = {
                let mut edges_in_update = self.edges_in_update.lock().unwrap();
                *edges_in_update += 1;
                *edges_in_update
            };
            let u: f64 = rng.random_range(0.0..1.0);
            if u < self.update_capacity as f64 / total as f64 {
                let idx = rng.random_range(0..self.update_capacity);
                let mut update = self.update.lock().unwrap();
                let region = update.as_mut().expect("update region enabled");
                if idx < region.len() {
                    region[idx] = edge;
                }
            }
        }
    }
}
