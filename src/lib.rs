pub mod accelerator;
pub mod cli;
pub mod colorer;
pub mod dispatcher;
pub mod error;
pub mod estimator;
pub mod heavy_hitters;
pub mod io;
pub mod model;
pub mod orchestrator;
pub mod router;

pub use error::Error;

/// universal hash modulus used by the colorer; fixed by the original scheme
pub const COLOR_HASH_PRIME: u32 = 8191;

/// default per-accelerator reservoir capacity, chosen to fit comfortably in a
/// worker pool's simulated local store
pub const DEFAULT_SAMPLE_SIZE: u32 = 1 << 16;

/// hard ceiling on `-M`; exceeding it is a capacity violation (spec.md §7)
pub const MAX_SAMPLE_SIZE: u32 = 1 << 24;

/// default number of heavy hitters shipped to accelerators when `-k` is set
pub const DEFAULT_TOP_T: u32 = 5;

/// explicit stack bound for the tiered sorter's iterative quicksort;
/// `2^STACK_DEPTH` elements is more than any practical reservoir holds
pub const STACK_DEPTH: usize = 32;

/// buckets produced by Phase A of the tiered sorter; must be a power of two
/// no smaller than the tasklet count
pub const NR_SPLITS: usize = 256;

/// number of cooperatively-scheduled workers ("tasklets") per accelerator
pub fn default_tasklets() -> usize {
    num_cpus::get().max(1)
}

/// number of host router threads
pub fn default_router_threads() -> usize {
    num_cpus::get().max(1)
}

/// initialize logging: a combined terminal + file logger, mirroring the
/// teacher's `simplelog` setup but without the poker-specific ctrl-c hook
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let _ = simplelog::CombinedLogger::init(vec![term]);
}

/// render a spinner-style progress bar for long scans
pub fn progress(n: u64) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_millis(250);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let bar = indicatif::ProgressBar::new(n);
    bar.set_style(style);
    bar.enable_steady_tick(tick);
    bar
}
