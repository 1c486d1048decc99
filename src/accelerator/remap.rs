//! Heavy-hitter remapper (spec §4.6, C6). Rewrites the top-`t` heavy node
//! ids to sentinel highs `max_id + t, max_id + t - 1, ..., max_id + 1` so
//! their adjacency runs land contiguously at the end of the sorted sample,
//! then restores the original ids with the exact inverse before results
//! cross an update boundary.

use crate::model::Edge;

/// `(rank, node_id)` pairs, rank zero-indexed from most to least frequent,
/// as produced by `heavy_hitters::merge_global`.
pub type TopList = [(u32, u32)];

fn sentinel_for(rank: u32, t: u32, max_id: u32) -> u32 {
    max_id + t - rank
}

/// Applies the forward remap in place, then re-enforces `u < v` on any
/// edge whose endpoints were reordered by the rewrite.
pub fn remap(sample: &mut [Edge], top_list: &TopList, max_id: u32) {
    let t = top_list.len() as u32;
    for edge in sample.iter_mut() {
        for &(rank, id) in top_list {
            let sentinel = sentinel_for(rank, t, max_id);
            if edge.u == id {
                edge.u = sentinel;
            }
            if edge.v == id {
                edge.v = sentinel;
            }
        }
        if edge.u > edge.v {
            std::mem::swap(&mut edge.u, &mut edge.v);
        }
    }
}

/// The exact inverse of `remap` over the same `top_list` and `max_id`.
pub fn reverse_remap(sample: &mut [Edge], top_list: &TopList, max_id: u32) {
    let t = top_list.len() as u32;
    for edge in sample.iter_mut() {
        for &(rank, id) in top_list {
            let sentinel = sentinel_for(rank, t, max_id);
            if edge.u == sentinel {
                edge.u = id;
            }
            if edge.v == sentinel {
                edge.v = id;
            }
        }
        if edge.u > edge.v {
            std::mem::swap(&mut edge.u, &mut edge.v);
        }
    }
}
