//! Minimal flowgraph: blocks joined by single-producer edges, and a
//! single-threaded scheduler that moves samples through them.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use failure::*;
use log::*;
use ringbuf::{Consumer, Producer, RingBuffer};

use crate::error::GraphError;
use crate::sdr::dsp::Complex;

pub const DEFAULT_BUFFER_ITEMS: usize = 32768;

static NEXT_BLOCK_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    /// Hands out a process-wide unique id.
    pub fn next() -> BlockId {
        BlockId(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// More work may follow.
    Ok,
    /// The block will not produce anything further.
    Done,
}

/// A processing stage the scheduler can drive.
///
/// `work` receives at most `noutput_items` input samples and must not push
/// more than `noutput_items` samples into `output`. Sources get an empty
/// `input`.
pub trait Block: Send + Sync {
    fn id(&self) -> BlockId;
    fn name(&self) -> &str;
    fn input_ports(&self) -> usize;
    fn output_ports(&self) -> usize;

    fn work(
        &self,
        noutput_items: usize,
        input: &[Complex],
        output: &mut Vec<Complex>,
    ) -> Result<WorkStatus, Error>;

    /// Called once after the graph stops running.
    fn stop(&self) -> Result<(), Error> {
        Ok(())
    }
}

pub type BlockRef = Arc<dyn Block>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub src: BlockId,
    pub src_port: usize,
    pub dst: BlockId,
    pub dst_port: usize,
}

impl Edge {
    pub fn new(src: &BlockRef, src_port: usize, dst: &BlockRef, dst_port: usize) -> Edge {
        Edge {
            src: src.id(),
            src_port,
            dst: dst.id(),
            dst_port,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.src, self.src_port, self.dst, self.dst_port
        )
    }
}

/// The part of a flowgraph that signal sources are allowed to touch.
pub trait FlowGraph {
    fn connect(
        &mut self,
        src: &BlockRef,
        src_port: usize,
        dst: &BlockRef,
        dst_port: usize,
    ) -> Result<(), Error>;

    fn disconnect(
        &mut self,
        src: &BlockRef,
        src_port: usize,
        dst: &BlockRef,
        dst_port: usize,
    ) -> Result<(), Error>;
}

/// Messages blocks post to the graph while it runs.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlMessage {
    Stop { from: BlockId },
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub iterations: u64,
    pub stopped_by: Option<BlockId>,
    pub produced: HashMap<BlockId, u64>,
}

impl RunStats {
    pub fn produced_by(&self, id: BlockId) -> u64 {
        self.produced.get(&id).cloned().unwrap_or(0)
    }
}

pub struct TopBlock {
    blocks: HashMap<BlockId, BlockRef>,
    edges: Vec<Edge>,
    buffer_items: usize,
    queue_tx: Sender<ControlMessage>,
    queue_rx: Receiver<ControlMessage>,
}

impl TopBlock {
    pub fn new() -> TopBlock {
        let (queue_tx, queue_rx) = unbounded();
        TopBlock {
            blocks: HashMap::new(),
            edges: Vec::new(),
            buffer_items: DEFAULT_BUFFER_ITEMS,
            queue_tx,
            queue_rx,
        }
    }

    pub fn with_buffer_items(mut self, items: usize) -> TopBlock {
        self.buffer_items = items.max(1);
        self
    }

    /// Sender blocks use to post control messages to this graph.
    pub fn msg_queue(&self) -> Sender<ControlMessage> {
        self.queue_tx.clone()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn topological_order(&self) -> Result<Vec<BlockId>, Error> {
        let mut indegree: HashMap<BlockId, usize> = self.blocks.keys().map(|id| (*id, 0)).collect();
        for e in &self.edges {
            *indegree.entry(e.dst).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<BlockId> = indegree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.blocks.len());

        while let Some(id) = ready.iter().next().cloned() {
            ready.remove(&id);
            order.push(id);
            for e in self.edges.iter().filter(|e| e.src == id) {
                if let Some(n) = indegree.get_mut(&e.dst) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(e.dst);
                    }
                }
            }
        }

        if order.len() != self.blocks.len() {
            return Err(format_err!("flowgraph contains a cycle"));
        }
        Ok(order)
    }

    /// Runs until every block is done or a block posts `ControlMessage::Stop`,
    /// then stops every block.
    pub fn run(&mut self) -> Result<RunStats, Error> {
        let order = self.topological_order()?;
        debug!(
            "running flowgraph with {} blocks and {} edges",
            order.len(),
            self.edges.len()
        );

        while self.queue_rx.try_recv().is_ok() {}

        let cap = self.buffer_items;
        let (mut producers, mut consumers): (Vec<Producer<Complex>>, Vec<Consumer<Complex>>) = self
            .edges
            .iter()
            .map(|_| RingBuffer::<Complex>::new(cap).split())
            .unzip();

        let mut inputs: HashMap<BlockId, Vec<usize>> = HashMap::new();
        let mut outputs: HashMap<BlockId, Vec<usize>> = HashMap::new();
        for (idx, e) in self.edges.iter().enumerate() {
            inputs.entry(e.dst).or_default().push(idx);
            outputs.entry(e.src).or_default().push(idx);
        }

        let mut stats = RunStats::default();
        let mut done: HashSet<BlockId> = HashSet::new();
        let mut scratch = vec![Complex::default(); cap];
        let mut output: Vec<Complex> = Vec::with_capacity(cap);
        let no_edges: Vec<usize> = Vec::new();

        while done.len() < order.len() {
            stats.iterations += 1;

            for id in &order {
                if done.contains(id) {
                    continue;
                }
                let block = &self.blocks[id];
                let ins = inputs.get(id).unwrap_or(&no_edges);
                let outs = outputs.get(id).unwrap_or(&no_edges);

                if !outs.is_empty() && outs.iter().all(|&e| done.contains(&self.edges[e].dst)) {
                    debug!("{} has no live consumers, marking done", block.name());
                    done.insert(*id);
                    continue;
                }

                let space = outs
                    .iter()
                    .map(|&e| producers[e].remaining())
                    .min()
                    .unwrap_or(cap);
                if space == 0 {
                    continue;
                }

                let mut n = 0;
                if block.input_ports() > 0 {
                    let e = match ins.first() {
                        Some(&e) => e,
                        None => {
                            debug!("{} has no connected input, marking done", block.name());
                            done.insert(*id);
                            continue;
                        }
                    };
                    n = consumers[e].len().min(space);
                    if n == 0 {
                        if done.contains(&self.edges[e].src) {
                            debug!("{} drained its input", block.name());
                            done.insert(*id);
                        }
                        continue;
                    }
                    consumers[e].pop_slice(&mut scratch[..n]);
                }

                output.clear();
                let status = block.work(space, &scratch[..n], &mut output)?;
                if output.len() > space {
                    return Err(format_err!(
                        "{} produced {} items with room for {}",
                        block.name(),
                        output.len(),
                        space
                    ));
                }
                for &e in outs {
                    producers[e].push_slice(&output);
                }
                *stats.produced.entry(*id).or_insert(0) += output.len() as u64;
                trace!("{} consumed {} produced {}", block.name(), n, output.len());

                if status == WorkStatus::Done {
                    debug!("{} is done", block.name());
                    done.insert(*id);
                }
            }

            if let Ok(msg) = self.queue_rx.try_recv() {
                match msg {
                    ControlMessage::Stop { from } => {
                        info!("stop requested by block {}", from);
                        stats.stopped_by = Some(from);
                        break;
                    }
                }
            }
        }

        for id in &order {
            self.blocks[id].stop()?;
        }

        Ok(stats)
    }

    fn prune(&mut self, id: BlockId) {
        if !self.edges.iter().any(|e| e.src == id || e.dst == id) {
            self.blocks.remove(&id);
        }
    }
}

impl Default for TopBlock {
    fn default() -> TopBlock {
        TopBlock::new()
    }
}

impl FlowGraph for TopBlock {
    fn connect(
        &mut self,
        src: &BlockRef,
        src_port: usize,
        dst: &BlockRef,
        dst_port: usize,
    ) -> Result<(), Error> {
        if src_port >= src.output_ports() {
            return Err(GraphError::NoSuchOutput {
                block: src.name().to_string(),
                port: src_port,
            }
            .into());
        }
        if dst_port >= dst.input_ports() {
            return Err(GraphError::NoSuchInput {
                block: dst.name().to_string(),
                port: dst_port,
            }
            .into());
        }

        let edge = Edge::new(src, src_port, dst, dst_port);
        if self.edges.contains(&edge) {
            return Err(GraphError::DuplicateEdge(edge.to_string()).into());
        }
        if self
            .edges
            .iter()
            .any(|e| e.dst == edge.dst && e.dst_port == edge.dst_port)
        {
            return Err(GraphError::InputInUse {
                block: dst.name().to_string(),
                port: dst_port,
            }
            .into());
        }

        debug!("connect {} ({} -> {})", edge, src.name(), dst.name());
        self.blocks.insert(src.id(), src.clone());
        self.blocks.insert(dst.id(), dst.clone());
        self.edges.push(edge);
        Ok(())
    }

    fn disconnect(
        &mut self,
        src: &BlockRef,
        src_port: usize,
        dst: &BlockRef,
        dst_port: usize,
    ) -> Result<(), Error> {
        let edge = Edge::new(src, src_port, dst, dst_port);
        let pos = match self.edges.iter().position(|e| *e == edge) {
            Some(pos) => pos,
            None => return Err(GraphError::EdgeNotFound(edge.to_string()).into()),
        };

        debug!("disconnect {} ({} -> {})", edge, src.name(), dst.name());
        self.edges.remove(pos);
        self.prune(edge.src);
        self.prune(edge.dst);
        Ok(())
    }
}
