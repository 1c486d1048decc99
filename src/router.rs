//! Batch router (spec §4.4, C4). `NR_THREADS` host threads share an edge
//! buffer by contiguous range, color and (optionally) sample each edge,
//! feed the local Misra-Gries table on the first update, and append to
//! per-(thread, accelerator) batches that flush to the accelerator pool
//! once full.

use crate::accelerator::{worker_pool::WorkerPool, Accelerator};
use crate::colorer;
use crate::dispatcher;
use crate::error::{Error, Result};
use crate::heavy_hitters::HeavyHitterTable;
use crate::model::{Edge, EdgeColors, HashParams};
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// A single flush never ships more than 8 MiB of edges to one accelerator
/// in one step (spec §4.4's flush discipline).
const MAX_FLUSH_CHUNK_BYTES: usize = 8 * 1024 * 1024;

pub struct RouterConfig {
    pub threads: usize,
    pub colors: u32,
    pub hash_params: HashParams,
    pub sampling_probability: f64,
    pub heavy_hitter_capacity: u32,
    pub top_t: u32,
    pub batch_capacity: usize,
    pub tasklets: usize,
    pub seed: u64,
}

pub struct RouteReport {
    pub edges_seen: u64,
    pub edges_kept: u64,
    pub max_node_id: u32,
    /// Each router thread's top-`2t` Misra-Gries candidates, ready for
    /// `heavy_hitters::merge_global` (empty when `heavy_hitter_capacity == 0`).
    pub thread_heavy_hitter_tops: Vec<Vec<(u32, i64)>>,
}

fn max_flush_chunk_edges() -> usize {
    (MAX_FLUSH_CHUNK_BYTES / std::mem::size_of::<Edge>()).max(1)
}

/// Routes `edges` (an already-canonicalized in-memory buffer — spec
/// §4.4's "or an in-memory edge buffer" alternative to raw byte slicing)
/// across `config.threads` router threads into `accelerators`. Fails with
/// `Error::Transfer` if a flush on one thread panicked and poisoned the
/// shared transfer mutex before another thread could use it (spec §7's
/// transient transfer error bucket).
pub fn route_edges(edges: &[Edge], accelerators: &[Accelerator], config: &RouterConfig, collect_heavy_hitters: bool) -> Result<RouteReport> {
    let pool = WorkerPool::new(config.threads.max(1));
    let transfer = Mutex::new(());
    let mut per_thread_seen = vec![0u64; pool.size()];
    let mut per_thread_kept = vec![0u64; pool.size()];
    let mut per_thread_max_id = vec![0u32; pool.size()];
    let mut per_thread_tops: Vec<Vec<(u32, i64)>> = vec![Vec::new(); pool.size()];

    let outcomes: Vec<Result<ThreadOutcome>> = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(pool.size());
        for worker_id in 0..pool.size() {
            let range = pool.range_for(worker_id, edges.len());
            let transfer = &transfer;
            handles.push(scope.spawn(move || {
                route_thread(&edges[range], worker_id, accelerators, config, collect_heavy_hitters, transfer)
            }));
        }
        handles.into_iter().map(|handle| handle.join().expect("router thread panicked")).collect()
    });

    for (worker_id, outcome) in outcomes.into_iter().enumerate() {
        let outcome = outcome?;
        per_thread_seen[worker_id] = outcome.seen;
        per_thread_kept[worker_id] = outcome.kept;
        per_thread_max_id[worker_id] = outcome.max_node_id;
        per_thread_tops[worker_id] = outcome.top;
    }

    Ok(RouteReport {
        edges_seen: per_thread_seen.iter().sum(),
        edges_kept: per_thread_kept.iter().sum(),
        max_node_id: per_thread_max_id.into_iter().max().unwrap_or(0),
        thread_heavy_hitter_tops: per_thread_tops,
    })
}

struct ThreadOutcome {
    seen: u64,
    kept: u64,
    max_node_id: u32,
    top: Vec<(u32, i64)>,
}

fn route_thread(
    slice: &[Edge],
    worker_id: usize,
    accelerators: &[Accelerator],
    config: &RouterConfig,
    collect_heavy_hitters: bool,
    transfer: &Mutex<()>,
) -> Result<ThreadOutcome> {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(config.seed ^ (worker_id as u64).wrapping_mul(0xA24B_AED4_963E_E407));
    let mut heavy_hitters = if collect_heavy_hitters && config.heavy_hitter_capacity > 0 {
        Some(HeavyHitterTable::new(config.heavy_hitter_capacity))
    } else {
        None
    };

    let mut batches: Vec<Vec<Edge>> = (0..accelerators.len()).map(|_| Vec::new()).collect();
    let ingest_pool = WorkerPool::new(config.tasklets.max(1));
    let max_chunk = max_flush_chunk_edges();

    let mut seen = 0u64;
    let mut kept = 0u64;
    let mut max_node_id = 0u32;

    for &edge in slice {
        seen += 1;
        max_node_id = max_node_id.max(edge.u).max(edge.v);

        if config.sampling_probability < 1.0 {
            let u: f64 = rng.random_range(0.0..1.0);
            if u >= config.sampling_probability {
                continue;
            }
        }
        kept += 1;

        if let Some(table) = heavy_hitters.as_mut() {
            table.observe(edge.u);
            table.observe(edge.v);
        }

        let c_u = colorer::color_of(edge.u, config.hash_params);
        let c_v = colorer::color_of(edge.v, config.hash_params);
        let pair = EdgeColors::new(c_u, c_v);
        for target in dispatcher::dispatch(pair, config.colors) {
            batches[target as usize].push(edge);
            if batches[target as usize].len() >= config.batch_capacity {
                flush_all(&mut batches, accelerators, ingest_pool, transfer, max_chunk)?;
            }
        }
    }
    flush_all(&mut batches, accelerators, ingest_pool, transfer, max_chunk)?;

    let top = heavy_hitters.map(|t| t.top((2 * config.top_t) as usize)).unwrap_or_default();
    Ok(ThreadOutcome { seen, kept, max_node_id, top })
}

/// Flushes every non-empty batch owned by this thread, in bounded chunks,
/// serialized across threads by one shared mutex around the transfer
/// channel (spec §4.4's flush discipline). The transfer mutex poisons if a
/// flushing thread panics mid-transfer; every other thread then surfaces
/// that as `Error::Transfer` instead of panicking itself, matching spec
/// §7's "accelerator driver's own error, surfaced as fatal" transient
/// transfer bucket.
fn flush_all(batches: &mut [Vec<Edge>], accelerators: &[Accelerator], pool: WorkerPool, transfer: &Mutex<()>, max_chunk: usize) -> Result<()> {
    loop {
        if batches.iter().all(|b| b.is_empty()) {
            break;
        }
        let _guard = transfer
            .lock()
            .map_err(|_| Error::Transfer("transfer channel poisoned by a failed flush on another thread".into()))?;
        for (target, batch) in batches.iter_mut().enumerate() {
            if batch.is_empty() {
                continue;
            }
            let chunk_len = batch.len().min(max_chunk);
            let chunk: Vec<Edge> = batch.drain(0..chunk_len).collect();
            accelerators[target].ingest(&chunk, pool);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Triplet;

    fn edge(u: u32, v: u32) -> Edge {
        Edge::canonical(u, v).unwrap()
    }

    fn single_accelerator(colors: u32) -> Vec<Accelerator> {
        (0..crate::dispatcher::enumerate_triplets(colors).len())
            .zip(crate::dispatcher::enumerate_triplets(colors))
            .map(|(id, triplet): (usize, Triplet)| Accelerator::new(id as u64, triplet, 1024, 0, 100, 4, 1))
            .collect()
    }

    #[test]
    fn every_edge_is_routed_to_at_least_one_accelerator() {
        let accelerators = single_accelerator(2);
        let edges = vec![edge(1, 2), edge(3, 4), edge(5, 6)];
        let config = RouterConfig {
            threads: 2,
            colors: 2,
            hash_params: HashParams { p: 8191, a: 3, b: 5, colors: 2 },
            sampling_probability: 1.0,
            heavy_hitter_capacity: 0,
            top_t: 0,
            batch_capacity: 2,
            tasklets: 2,
            seed: 1,
        };
        let report = route_edges(&edges, &accelerators, &config, false).unwrap();
        assert_eq!(report.edges_seen, 3);
        assert_eq!(report.edges_kept, 3);
        let total_ingested: u64 = accelerators.iter().map(|a| a.total_edges()).sum();
        assert!(total_ingested >= 3);
    }

    #[test]
    fn sampling_probability_zero_keeps_nothing() {
        let accelerators = single_accelerator(1);
        let edges = vec![edge(1, 2), edge(3, 4)];
        let config = RouterConfig {
            threads: 2,
            colors: 1,
            hash_params: HashParams { p: 8191, a: 3, b: 5, colors: 1 },
            sampling_probability: 0.0,
            heavy_hitter_capacity: 0,
            top_t: 0,
            batch_capacity: 8,
            tasklets: 2,
            seed: 1,
        };
        let report = route_edges(&edges, &accelerators, &config, false).unwrap();
        assert_eq!(report.edges_kept, 0);
    }

    #[test]
    fn heavy_hitter_tables_collect_top_candidates() {
        let accelerators = single_accelerator(1);
        let mut edges = Vec::new();
        for _ in 0..200 {
            edges.push(edge(0, 1));
        }
        for i in 2..20 {
            edges.push(edge(0, i));
        }
        let config = RouterConfig {
            threads: 1,
            colors: 1,
            hash_params: HashParams { p: 8191, a: 3, b: 5, colors: 1 },
            sampling_probability: 1.0,
            heavy_hitter_capacity: 4,
            top_t: 2,
            batch_capacity: 1024,
            tasklets: 2,
            seed: 1,
        };
        let report = route_edges(&edges, &accelerators, &config, true).unwrap();
        assert_eq!(report.thread_heavy_hitter_tops.len(), 1);
        let top_ids: Vec<u32> = report.thread_heavy_hitter_tops[0].iter().map(|(id, _)| *id).collect();
        assert!(top_ids.contains(&0), "node 0 has the highest degree and should survive");
    }

    #[test]
    fn a_poisoned_transfer_mutex_surfaces_as_a_transfer_error() {
        let accelerators = single_accelerator(1);
        let transfer = Mutex::new(());
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = transfer.lock().unwrap();
            panic!("simulated transfer fault");
        }));
        assert!(transfer.is_poisoned());

        let mut batches: Vec<Vec<Edge>> = vec![vec![edge(1, 2)]];
        let err = flush_all(&mut batches, &accelerators, WorkerPool::new(1), &transfer, 1024).unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
    }
}
