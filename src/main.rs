use std::io;
use std::process::ExitCode;

use clap::Parser;
use divcompare::sweep::{Sweep, SweepConfig};

/// Upper limit for `--max-n` and `--max-resp`; larger grids are far beyond any practical run.
const FLAG_BOUND: i64 = 1000;

/// Print every distinct (Shannon entropy, Simpson index) pair reachable by multisets of
/// `resp + 2` labels drawn from `n + 2` categories.
///
/// Each output line is `n resp shannon simpson`, in order of first discovery.
#[derive(Parser, Debug)]
#[command(name = "divcompare", version, about)]
struct Args {
    /// Largest n (category count is n + 2).
    #[arg(
        long,
        default_value_t = SweepConfig::default().max_n as u32,
        value_parser = clap::value_parser!(u32).range(0..=FLAG_BOUND)
    )]
    max_n: u32,

    /// Largest resp (sample length is resp + 2).
    #[arg(
        long,
        default_value_t = SweepConfig::default().max_resp as u32,
        value_parser = clap::value_parser!(u32).range(0..=FLAG_BOUND)
    )]
    max_resp: u32,

    /// Report per-cell progress on stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = SweepConfig {
        max_n: args.max_n as usize,
        max_resp: args.max_resp as usize,
    };
    if let Err(e) = config.validate() {
        eprintln!("divcompare: {e}");
        return ExitCode::from(2);
    }

    if args.verbose {
        eprintln!(
            "sweep: n=0..={} resp=0..={} cells={} samples={}",
            config.max_n,
            config.max_resp,
            config.cells().count(),
            config
                .total_samples()
                .map_or_else(|| "overflow".to_string(), |n| n.to_string())
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sweep = Sweep::new(config);
    let verbose = args.verbose;
    let result = sweep.run(&mut out, |report| {
        if verbose {
            eprintln!(
                "cell n={} resp={} samples={} new={}",
                report.cell.n, report.cell.resp, report.samples, report.new_pairs
            );
        }
    });

    match result {
        Ok(summary) => {
            if verbose {
                eprintln!(
                    "done: cells={} samples={} distinct_pairs={}",
                    summary.cells, summary.samples, summary.discoveries
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("divcompare: {e}");
            ExitCode::FAILURE
        }
    }
}
