//! unitc - semantic checker for unit-aware programs
//!
//! Usage: unitc --units <file.units> <program.json>

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser as ClapParser;
use tracing::{warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use unitc::driver::{DriverConfig, ExitStatus, Pipeline};

#[derive(ClapParser, Debug)]
#[command(name = "unitc")]
#[command(version)]
#[command(about = "Unit-of-measurement checker for dimensioned programs", long_about = None)]
struct Args {
    /// Units description file
    #[arg(short, long, required = true)]
    units: PathBuf,

    /// Program tree (JSON) to analyze
    #[arg(required = true)]
    program: PathBuf,

    /// Program source text, used to quote diagnostics
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump the unit catalog and its conversion table
    #[arg(long)]
    dump_units: bool,

    /// Dump the computed value of every node
    #[arg(long)]
    dump_results: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let status = run(&args);
    process::exit(status.code());
}

fn run(args: &Args) -> ExitStatus {
    let config = DriverConfig {
        dump_units: args.dump_units,
        dump_results: args.dump_results,
        verbose: args.verbose,
    };
    let mut pipeline = Pipeline::new(config);

    if let Some(source) = &args.source {
        let attached = pipeline
            .attach_source(source)
            .with_context(|| format!("reading program source '{}'", source.display()));
        if let Err(err) = attached {
            warn!("{err:#}; diagnostics will not quote source text");
        }
    }

    if args.verbose {
        eprintln!(
            "Checking {} against {}",
            args.program.display(),
            args.units.display()
        );
    }

    pipeline.check(&args.units, &args.program)
}
