//! Node locator (spec §4.8, C8). Scans the sorted sample once, emitting
//! one `NodeLocation` per distinct `u`. Workers split the sample by
//! contiguous range and each skips any prefix run that its left neighbor
//! already owns; write-out into the shared result is ordered by a
//! handshake chain so worker `i` only publishes after worker `i-1` has.

use crate::accelerator::worker_pool::{HandshakeChain, WorkerPool};
use crate::model::{Edge, NodeLocation};
use std::ops::Range;
use std::sync::Mutex;

pub fn build_locations(sample: &[Edge], pool: WorkerPool) -> Vec<NodeLocation> {
    if sample.is_empty() {
        return Vec::new();
    }
    let chain = HandshakeChain::new();
    let output: Mutex<Vec<NodeLocation>> = Mutex::new(Vec::new());
    std::thread::scope(|scope| {
        for worker_id in 0..pool.size() {
            let range = pool.range_for(worker_id, sample.len());
            let chain = &chain;
            let output = &output;
            scope.spawn(move || {
                let local = local_locations(sample, range, worker_id);
                chain.wait_turn(worker_id);
                output.lock().unwrap().extend(local);
                chain.advance();
            });
        }
    });
    output.into_inner().unwrap()
}

fn local_locations(sample: &[Edge], range: Range<usize>, worker_id: usize) -> Vec<NodeLocation> {
    if range.is_empty() {
        return Vec::new();
    }
    let mut start = range.start;
    if worker_id > 0 {
        let left_u = sample[range.start - 1].u;
        while start < range.end && sample[start].u == left_u {
            start += 1;
        }
    }
    let mut out = Vec::new();
    let mut idx = start;
    while idx < range.end {
        let u = sample[idx].u;
        out.push(NodeLocation { id: u, index_in_sample: idx as i64 });
        while idx < range.end && sample[idx].u == u {
            idx += 1;
        }
    }
    out
}

/// Binary search over a locations array sorted by `id`; absence is
/// signaled by `-1` (spec §3's `NodeLocation` invariant).
pub fn locate(locations: &[NodeLocation], id: u32) -> i64 {
    match locations.binary_search_by_key(&id, |loc| loc.id) {
        Ok(i) => locations[i].index_in_sample,
        Err(_) => -1,
    }
}
