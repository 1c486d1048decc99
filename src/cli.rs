//! Command-line interface (spec §6). Flags mirror the original's
//! `getopt`-based scanner one for one; `clap`'s derive macro replaces the
//! hand-rolled parser, and `Cli::validate` runs the same checks the
//! original performed ahead of dispatch.

use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tricount", about = "Streaming triangle-count estimation over a simulated accelerator fabric")]
pub struct Cli {
    /// Random seed (default: time-based, supplied by the caller of `parse_with_seed`).
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// Per-accelerator reservoir capacity.
    #[arg(short = 'M', long = "sample-size", default_value_t = crate::DEFAULT_SAMPLE_SIZE)]
    pub sample_size: u32,

    /// Edge acceptance probability in `[0, 1]`.
    #[arg(short = 'p', long = "probability", default_value_t = 1.0)]
    pub probability: f64,

    /// Misra-Gries capacity per router thread (0 disables heavy-hitter tracking).
    #[arg(short = 'k', long = "heavy-hitter-capacity", default_value_t = 0)]
    pub heavy_hitter_capacity: u32,

    /// Number of heavy hitters shipped to accelerators (ignored if `-k 0`).
    #[arg(short = 't', long = "top", default_value_t = crate::DEFAULT_TOP_T)]
    pub top_t: u32,

    /// Number of colors `C`.
    #[arg(short = 'c', long = "colors")]
    pub colors: u32,

    /// Update files, in order.
    #[arg(short = 'f', long = "files", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Number of host router threads (defaults to the available parallelism).
    #[arg(long = "threads")]
    pub threads: Option<usize>,

    /// Number of per-accelerator worker tasklets (defaults to the available parallelism).
    #[arg(long = "tasklets")]
    pub tasklets: Option<usize>,

    /// Emit per-accelerator scan-length diagnostics at debug level.
    #[arg(long = "stats", default_value_t = false)]
    pub stats: bool,

    /// Verbose (debug-level) logging.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

/// A validated, ready-to-run configuration (spec §6's validation rules).
pub struct Config {
    pub seed: u64,
    pub sample_size: u32,
    pub probability: f64,
    pub heavy_hitter_capacity: u32,
    pub top_t: u32,
    pub colors: u32,
    pub files: Vec<PathBuf>,
    pub threads: usize,
    pub tasklets: usize,
    pub stats: bool,
}

impl Cli {
    /// Runs spec §6's validation rules: `sample <= MAX_SAMPLE_SIZE`,
    /// `p in [0,1]`, `t <= k`, `binom(C+2,3) <= NR_DPUS` (here: no hard
    /// accelerator ceiling, but a triplet count of zero is still rejected),
    /// and every file must exist.
    pub fn validate(self, seed: u64) -> Result<Config> {
        if self.sample_size > crate::MAX_SAMPLE_SIZE {
            return Err(Error::Capacity(format!(
                "sample size {} exceeds the maximum of {}",
                self.sample_size,
                crate::MAX_SAMPLE_SIZE
            )));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(Error::Argument(format!("probability {} is not in [0, 1]", self.probability)));
        }
        if self.heavy_hitter_capacity > 0 && self.top_t > self.heavy_hitter_capacity {
            return Err(Error::Argument(format!(
                "top count {} exceeds heavy-hitter capacity {}",
                self.top_t, self.heavy_hitter_capacity
            )));
        }
        if self.colors == 0 {
            return Err(Error::Argument("color count must be at least 1".into()));
        }
        if crate::model::triplet_count(self.colors) == 0 {
            return Err(Error::Capacity("no triplets are possible for the requested color count".into()));
        }
        if self.files.is_empty() {
            return Err(Error::Argument("at least one update file is required".into()));
        }
        for file in &self.files {
            if !file.exists() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("update file not found: {}", file.display()),
                )));
            }
        }

        Ok(Config {
            seed: self.seed.unwrap_or(seed),
            sample_size: self.sample_size,
            probability: self.probability,
            heavy_hitter_capacity: self.heavy_hitter_capacity,
            top_t: self.top_t,
            colors: self.colors,
            files: self.files,
            threads: self.threads.unwrap_or_else(crate::default_router_threads),
            tasklets: self.tasklets.unwrap_or_else(crate::default_tasklets),
            stats: self.stats,
        })
    }
}
