mod args;

use anyhow::Result;
use args::Args;
use log::info;
use rayon::iter::ParallelIterator;
use serde_derive::*;

use nasal_thermal::cli::{init_logging, replay_paths_par};
use nasal_thermal::{session::SessionReport, stats::Stats};

fn main() -> Result<()> {
    let Args {
        paths,
        config,
        verbose,
    } = Args::from_cmd_line()?;
    init_logging(verbose);
    info!("replaying {} session(s)", paths.len());

    let (sessions, cumulative) = replay_paths_par(paths, &config)
        .try_fold(
            || (vec![], Stats::default()),
            |mut acc, report| -> Result<_> {
                let report = report?;
                acc.1 += &report.stats;
                acc.0.push(report);
                Ok(acc)
            },
        )
        .try_reduce(
            || (vec![], Stats::default()),
            |mut acc1, acc2| -> Result<_> {
                acc1.0.extend(acc2.0);
                acc1.1 += &acc2.1;
                Ok(acc1)
            },
        )?;

    #[derive(Debug, Serialize)]
    struct OutputJson {
        sessions: Vec<SessionReport>,
        cumulative: Stats,
    }

    info!(
        "{} measurement(s), mean {:?} °C",
        cumulative.count(),
        cumulative.mean()
    );
    serde_json::to_writer(
        std::io::stdout().lock(),
        &OutputJson {
            sessions,
            cumulative,
        },
    )?;

    Ok(())
}
