use std::sync::Arc;

use crossbeam_channel::Sender;
use failure::*;

use crate::blocks::file_sink::FileSink;
use crate::blocks::valve::Valve;
use crate::config::Configuration;
use crate::diagnostics::Diagnostics;
use crate::graph::{Block, BlockRef, ControlMessage, Edge, FlowGraph};
use crate::sdr::dsp;
use crate::sdr::yunsdr::{DriverFactory, SourceConfig, YunSdrSource};
use crate::topology::{Stage, Topology};
use crate::SignalSource;

pub const IMPLEMENTATION: &str = "YunSDR_Signal_Source";

/// YunSDR receiver plus its optional sample limiter and dump file, wired as
/// one signal source.
pub struct YunSdrSignalSource {
    role: String,
    topology: Topology,
    source: Arc<YunSdrSource>,
    valve: Option<Arc<Valve>>,
    file_sink: Option<Arc<FileSink>>,
    chain: Vec<BlockRef>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl YunSdrSignalSource {
    /// Validates the `<role>.*` settings before the driver is opened; an
    /// invalid configuration never reaches `factory`.
    pub fn new(
        cfg: &dyn Configuration,
        role: &str,
        in_streams: usize,
        out_streams: usize,
        queue: Sender<ControlMessage>,
        factory: &dyn DriverFactory,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<YunSdrSignalSource, Error> {
        let config = SourceConfig::from_configuration(cfg, role)?;

        diagnostics.info(&format!("device address: {}", config.device_address));
        diagnostics.info(&format!("LO frequency : {} Hz", config.freq));
        diagnostics.info(&format!("sample rate: {} Hz", config.sample_rate));

        if in_streams > 0 {
            diagnostics.warn("A signal source does not have an input stream");
        }
        if out_streams > 1 {
            diagnostics.warn("This implementation only supports one output stream");
        }

        let source = Arc::new(YunSdrSource::open(&config, factory)?);
        diagnostics.debug(&format!("yunsdr_source({})", source.id()));

        let valve = match config.samples {
            0 => None,
            samples => {
                diagnostics.debug(&format!("Send STOP signal after {} samples", samples));
                let valve = Arc::new(Valve::new(samples, queue));
                diagnostics.debug(&format!("valve({})", valve.id()));
                Some(valve)
            }
        };

        let file_sink = match config.dump {
            false => None,
            true => {
                diagnostics.debug(&format!(
                    "Dumping output into file {}",
                    config.dump_filename.display()
                ));
                let sink = Arc::new(FileSink::create(&config.dump_filename)?);
                diagnostics.debug(&format!("file_sink({})", sink.id()));
                Some(sink)
            }
        };

        let mut unit = YunSdrSignalSource {
            role: role.to_string(),
            topology: Topology::select(valve.is_some(), file_sink.is_some()),
            source,
            valve,
            file_sink,
            chain: Vec::new(),
            diagnostics,
        };
        unit.chain = unit
            .topology
            .stages()
            .iter()
            .filter_map(|stage| unit.block(*stage))
            .collect();
        Ok(unit)
    }

    fn block(&self, stage: Stage) -> Option<BlockRef> {
        match stage {
            Stage::Source => Some(self.source.clone() as BlockRef),
            Stage::Limiter => self.valve.clone().map(|v| v as BlockRef),
            Stage::Sink => self.file_sink.clone().map(|s| s as BlockRef),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Blocks from the receiver downstream.
    pub fn chain(&self) -> &[BlockRef] {
        &self.chain
    }

    /// Upstream/downstream block pairs from the topology table.
    fn links(&self) -> Vec<(BlockRef, BlockRef)> {
        self.topology
            .links()
            .into_iter()
            .filter_map(|(up, down)| Some((self.block(up)?, self.block(down)?)))
            .collect()
    }

    /// The edges `connect` adds, in the order it adds them.
    pub fn edges(&self) -> Vec<Edge> {
        self.links()
            .iter()
            .map(|(up, down)| Edge::new(up, 0, down, 0))
            .collect()
    }

    pub fn source(&self) -> &Arc<YunSdrSource> {
        &self.source
    }

    pub fn valve(&self) -> Option<&Arc<Valve>> {
        self.valve.as_ref()
    }

    pub fn file_sink(&self) -> Option<&Arc<FileSink>> {
        self.file_sink.as_ref()
    }
}

impl SignalSource for YunSdrSignalSource {
    fn role(&self) -> &str {
        &self.role
    }

    fn implementation(&self) -> &str {
        IMPLEMENTATION
    }

    fn item_size(&self) -> usize {
        dsp::ITEM_SIZE
    }

    fn connect(&self, graph: &mut dyn FlowGraph) -> Result<(), Error> {
        for (up, down) in self.links() {
            graph.connect(&up, 0, &down, 0)?;
            self.diagnostics.debug(&format!("connected {} to {}", up.name(), down.name()));
        }
        Ok(())
    }

    fn disconnect(&self, graph: &mut dyn FlowGraph) -> Result<(), Error> {
        for (up, down) in self.links().into_iter().rev() {
            graph.disconnect(&up, 0, &down, 0)?;
            self.diagnostics.debug(&format!("disconnected {} from {}", up.name(), down.name()));
        }
        Ok(())
    }

    fn get_left_block(&self) -> Option<BlockRef> {
        self.diagnostics.warn("Trying to get signal source left block.");
        None
    }

    fn get_right_block(&self) -> BlockRef {
        match self.block(self.topology.terminal()) {
            Some(block) => block,
            None => self.source.clone() as BlockRef,
        }
    }
}
