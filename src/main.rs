use std::{
    error::Error,
    sync::{atomic::AtomicBool, Arc},
};

use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{info, warn};

use dining::{
    config::{Args, SimConfig},
    philosopher, SimError,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    let config = SimConfig::try_from(&args)?;

    // Ctrl-C で止める。食事中の哲学者は食べ終えてから席を立つ
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, stop.clone())?;
    signal_hook::flag::register(SIGTERM, stop.clone())?;

    let report = philosopher::run(&config, stop)?;

    for (i, meals) in report.meals.iter().enumerate() {
        info!(philosopher = i, meals, "finished");
    }
    info!(
        transitions = report.summary.transitions,
        peak_eaters = report.summary.peak_eaters,
        violations = report.summary.violations,
        "dinner is over"
    );

    if report.summary.violations > 0 {
        warn!("neighbors were observed eating at the same time");
        return Err(SimError::Unsafe(report.summary.violations).into());
    }
    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    // RUST_LOG があればそちらを優先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("dining=trace")
        } else {
            EnvFilter::new("dining=info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
