//! Estimator (spec §4.10, C10). Scales each accelerator's raw triangle
//! count by its reservoir's sampling factor, applies the monochromatic
//! color-multiplicity correction, sums across accelerators, and — if
//! input-edge sampling was active — applies the final cube correction.

/// One accelerator's contribution: its raw (uncorrected) triangle count,
/// how many edges it ever saw, its reservoir capacity, and whether its
/// triplet is monochromatic (all three colors equal).
#[derive(Debug, Clone, Copy)]
pub struct AcceleratorSummary {
    pub raw_count: u64,
    pub total_edges: u64,
    pub capacity: usize,
    pub monochromatic: bool,
}

/// The per-accelerator reservoir scaling factor `d` (spec §4.10). `d = 1`
/// whenever the reservoir never filled (`total_edges <= capacity`); the
/// `T <= 2` guard avoids a division the original never reaches in
/// practice (`total_edges > capacity` already implies `total_edges >= 1`,
/// but a capacity of 0 or 1 would otherwise divide by a non-positive
/// denominator).
fn scaling_factor(total_edges: u64, capacity: usize) -> f64 {
    let t = total_edges as f64;
    let m = capacity as f64;
    if total_edges as usize <= capacity || total_edges < 3 {
        return 1.0;
    }
    (m / t) * ((m - 1.0) / (t - 1.0)) * ((m - 2.0) / (t - 2.0))
}

/// Combines every accelerator's raw count into the final estimate
/// (spec §4.10). `colors` is the total color count `C`; when
/// `sampling_probability < 1.0`, `edges_kept`/`edges_in_graph` drive the
/// final cube correction for input-edge subsampling.
pub fn estimate(
    accelerators: &[AcceleratorSummary],
    colors: u32,
    sampling_probability: f64,
    edges_kept: u64,
    edges_in_graph: u64,
) -> u64 {
    let mut total: i64 = 0;
    for acc in accelerators {
        let d = scaling_factor(acc.total_edges, acc.capacity);
        let scaled = (acc.raw_count as f64 / d) as i64;
        let multiplier: i64 = if acc.monochromatic { 2 - colors as i64 } else { 1 };
        total += scaled * multiplier;
    }

    let mut result = total as f64;
    if sampling_probability < 1.0 && edges_in_graph > 0 {
        let keep_ratio = edges_kept as f64 / edges_in_graph as f64;
        if keep_ratio > 0.0 {
            result /= keep_ratio.powi(3);
        }
    }

    result.max(0.0).round() as u64
}
