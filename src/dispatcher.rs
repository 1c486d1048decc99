//! Triplet dispatcher (spec §4.2, C2). Maps an edge's ordered colors
//! `(a, b)` to every accelerator id whose triplet is a superset of
//! `{a, b}`, using closed-form cumulative-sum formulas so no per-edge
//! enumeration over triplets is needed.

use crate::model::{EdgeColors, Triplet};

/// Enumerates every triplet `(c1 <= c2 <= c3)` over `colors` colors in
/// lexicographic order; the `i`-th entry is the triplet owned by
/// accelerator `i` (spec §3).
pub fn enumerate_triplets(colors: u32) -> Vec<Triplet> {
    let mut out = Vec::with_capacity(crate::model::triplet_count(colors) as usize);
    for c1 in 0..colors {
        for c2 in c1..colors {
            for c3 in c2..colors {
                out.push(Triplet { c1, c2, c3 });
            }
        }
    }
    out
}

/// Closed-form id of the first triplet `(a, b, c3=b)` (spec §4.2's first
/// family). All arithmetic is done in `i128` because the expression is a
/// difference of cubic terms that is only guaranteed non-negative, and
/// exactly divisible by 6, once fully summed.
fn family1_start(a: i128, b: i128, c: i128) -> i128 {
    let numerator = a.pow(3) - 3 * a.pow(2) * c + a * (3 * c.pow(2) - 1) - 3 * b * (b - 2 * c - 1);
    numerator / 6
}

/// Closed-form id of the first triplet `(a, c2=a, b)` (spec §4.2's second
/// family).
fn family2_start(a: i128, b: i128, c: i128) -> i128 {
    let numerator = a * (a.pow(2) - 3 * a * (c + 1) + 3 * c.pow(2) + 6 * c + 2);
    numerator / 6 - a + b
}

/// Closed-form id of triplet `(c1, a, b)` (spec §4.2's third family). Each
/// `c1` is computed directly rather than incrementally.
fn family3_id(c1: i128, a: i128, b: i128, c: i128) -> i128 {
    let numerator =
        -3 * a.pow(2) + 6 * a * c - 3 * a + 6 * b + 3 * c.pow(2) * c1 - 3 * c * c1.pow(2) + c1.pow(3) - c1;
    numerator / 6
}

/// Given an edge's ordered colors and the total color count, returns every
/// accelerator id whose triplet covers `{a, b}`. The three half-open
/// ranges from spec §4.2 partition the covering triplets without overlap;
/// when `a == b` the second family's range is empty and contributes
/// nothing, which is exactly the "exclude duplicates" rule from spec §3.
pub fn dispatch(colors_pair: EdgeColors, total_colors: u32) -> Vec<u64> {
    let a = colors_pair.c_u as i128;
    let b = colors_pair.c_v as i128;
    let c = total_colors as i128;
    let mut out = Vec::new();

    // family 1: (a, b, c3) for c3 in [b, C)
    let mut id = family1_start(a, b, c);
    for _c3 in (colors_pair.c_v)..total_colors {
        out.push(id as u64);
        id += 1;
    }

    // family 2: (a, c2, b) for c2 in [a, b)
    let mut id = family2_start(a, b, c);
    for c2 in colors_pair.c_u..colors_pair.c_v {
        out.push(id as u64);
        id += (total_colors as i128 - 1 - c2 as i128) as i128;
    }

    // family 3: (c1, a, b) for c1 in [0, a)
    for c1 in 0..colors_pair.c_u {
        out.push(family3_id(c1 as i128, a, b, c) as u64);
    }

    out
}

/// Brute-force reference used by tests and by callers willing to pay
/// `O(triplets)` per edge — kept to cross-check the closed-form dispatcher.
#[cfg(test)]
fn dispatch_brute(colors_pair: EdgeColors, triplets: &[Triplet]) -> Vec<u64> {
    triplets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.covers(colors_pair))
        .map(|(i, _)| i as u64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn as_set(mut v: Vec<u64>) -> BTreeSet<u64> {
        v.sort_unstable();
        v.into_iter().collect()
    }

    #[test]
    fn matches_brute_force_for_small_color_counts() {
        for colors in 1..=6u32 {
            let triplets = enumerate_triplets(colors);
            for a in 0..colors {
                for b in a..colors {
                    let pair = EdgeColors::new(a, b);
                    let fast = as_set(dispatch(pair, colors));
                    let slow = as_set(dispatch_brute(pair, &triplets));
                    assert_eq!(fast, slow, "colors={colors} a={a} b={b}");
                }
            }
        }
    }

    #[test]
    fn no_duplicate_ids_emitted() {
        for colors in 1..=6u32 {
            for a in 0..colors {
                for b in a..colors {
                    let ids = dispatch(EdgeColors::new(a, b), colors);
                    let unique: BTreeSet<_> = ids.iter().copied().collect();
                    assert_eq!(ids.len(), unique.len());
                }
            }
        }
    }

    #[test]
    fn ids_stay_within_triplet_count() {
        for colors in 1..=6u32 {
            let total = crate::model::triplet_count(colors);
            for a in 0..colors {
                for b in a..colors {
                    for id in dispatch(EdgeColors::new(a, b), colors) {
                        assert!(id < total);
                    }
                }
            }
        }
    }
}
