use anyhow::Context;
use clap::Parser;
use std::time::{SystemTime, UNIX_EPOCH};
use tricount::cli::Cli;
use tricount::io::MmapGraphSource;
use tricount::orchestrator::{Orchestrator, OrchestratorConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tricount::init_logging(cli.verbose);

    let default_seed = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
    let config = cli.validate(default_seed).map_err(|e| anyhow::anyhow!(e))?;

    log::info!(
        "starting: colors={} sample_size={} probability={} heavy_hitters={} updates={}",
        config.colors,
        config.sample_size,
        config.probability,
        config.heavy_hitter_capacity,
        config.files.len()
    );

    let mut orchestrator = Orchestrator::new(OrchestratorConfig {
        colors: config.colors,
        seed: config.seed,
        sample_capacity: config.sample_size as usize,
        update_capacity: 0,
        sampling_probability: config.probability,
        heavy_hitter_capacity: config.heavy_hitter_capacity,
        top_t: config.top_t,
        router_threads: config.threads,
        tasklets: config.tasklets,
        batch_capacity: 4096,
        nr_splits: tricount::NR_SPLITS,
        stats: config.stats,
    })
    .map_err(|e| anyhow::anyhow!(e))?;
    log::debug!("allocated {} accelerators", orchestrator.accelerator_count());

    for (update_id, path) in config.files.iter().enumerate() {
        let mut source = MmapGraphSource::open(path).with_context(|| format!("opening update file {}", path.display()))?;
        let report = orchestrator.run_update(&mut source).map_err(|e| anyhow::anyhow!(e))?;
        log::info!("update {update_id}: {} edges kept, {} triangles", report.edges_in_update, report.triangles);
        println!("Triangles: {}", report.triangles);
    }

    Ok(())
}
