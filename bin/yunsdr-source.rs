use failure::*;
use log::*;
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

use yunsdr_source::blocks::probe::CountingSink;
use yunsdr_source::config::InMemoryConfiguration;
use yunsdr_source::diagnostics::LogDiagnostics;
use yunsdr_source::graph::{Block, BlockRef, FlowGraph, TopBlock};
use yunsdr_source::sdr::file::FileDriverFactory;
use yunsdr_source::sdr::sim::ToneDriverFactory;
use yunsdr_source::sdr::yunsdr::DriverFactory;
use yunsdr_source::{SignalSource, YunSdrSignalSource};

#[derive(StructOpt)]
#[structopt(name = "yunsdr-source", about = "signal source runner for yunsdr receivers")]
struct Cli {
    /// Prefix of the configuration keys
    #[structopt(short, long, default_value = "SignalSource")]
    role: String,

    /// Replay a sample dump instead of the receiver
    #[structopt(short, long, parse(from_os_str))]
    path: Option<PathBuf>,

    /// Offset of the simulated tone when no dump is replayed
    #[structopt(long, default_value = "1000")]
    tone: f64,

    /// Stop the simulated receiver after this many samples
    #[structopt(long)]
    limit: Option<u64>,

    /// Configuration entry as key=value, repeatable
    #[structopt(short = "s", long = "set")]
    settings: Vec<String>,
}

fn main() -> Result<(), Error> {
    pretty_env_logger::init();
    let args = Cli::from_args();

    let cfg = InMemoryConfiguration::from_overrides(&args.settings)?;
    let factory: Box<dyn DriverFactory> = match args.path {
        Some(path) => Box::new(FileDriverFactory { path }),
        None => Box::new(ToneDriverFactory {
            offset_hz: args.tone,
            limit: args.limit,
        }),
    };

    let mut top_block = TopBlock::new();
    let source = YunSdrSignalSource::new(
        &cfg,
        &args.role,
        0,
        1,
        top_block.msg_queue(),
        &*factory,
        Arc::new(LogDiagnostics),
    )?;
    info!(
        "{} {} with topology {:?}",
        source.implementation(),
        source.role(),
        source.topology()
    );

    source.connect(&mut top_block)?;

    let right = source.get_right_block();
    let probe = Arc::new(CountingSink::new());
    let probe_ref: BlockRef = probe.clone();
    let attach_probe = right.output_ports() > 0;
    if attach_probe {
        top_block.connect(&right, 0, &probe_ref, 0)?;
    }

    let stats = top_block.run()?;
    info!(
        "flowgraph finished after {} iterations, {} samples from the receiver",
        stats.iterations,
        stats.produced_by(source.source().id())
    );
    if let Some(valve) = stats.stopped_by {
        debug!("stopped by block {}", valve);
    }
    if let Some(sink) = source.file_sink() {
        info!("{} samples dumped to {}", sink.written(), sink.path().display());
    }
    if attach_probe {
        info!("{} samples reached {}", probe.count(), right.name());
        top_block.disconnect(&right, 0, &probe_ref, 0)?;
    }

    source.disconnect(&mut top_block)?;
    trace!("flowgraph torn down");

    Ok(())
}
