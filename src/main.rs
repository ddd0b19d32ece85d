use colsim::{load_scenario, ColumnRun, DemDomain, RunParameters};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Granular column collapse driver")]
struct Args {
    /// Input file key without extension (`<key>.yaml`, `<key>.yml` or `<key>.inp`)
    filekey: PathBuf,

    /// Threads used by the force evaluation
    #[arg(default_value_t = 1)]
    nproc: usize,

    /// Directory receiving snapshots and checkpoints
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scenario_cfg = load_scenario(&args.filekey)
        .with_context(|| format!("failed to load scenario `{}`", args.filekey.display()))?;
    let params = RunParameters::from_config(&scenario_cfg).context("invalid scenario")?;
    if let Some(test) = &params.test {
        info!("test `{test}`");
    }
    info!(
        "{} packing, {} cross-section, Kn = {:.4e}, Kt = {:.4e}",
        params.packing, params.cross_section, params.kn, params.kt
    );

    let domain = DemDomain::new(args.out_dir.clone());
    let mut run = ColumnRun::new(params, domain, args.nproc);
    let report = run.run().context("column run aborted")?;

    info!(
        "done: {} grains generated, {} carved, {} solves",
        report.generated,
        report.carved,
        report.solves.len()
    );
    Ok(())
}
