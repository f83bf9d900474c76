pub mod blocks;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod sdr;
pub mod source;
pub mod topology;

use failure::Error;

use graph::{BlockRef, FlowGraph};

pub use source::YunSdrSignalSource;

/// A receiver front end as seen by the flowgraph that consumes it.
pub trait SignalSource {
    fn role(&self) -> &str;
    fn implementation(&self) -> &str;
    fn item_size(&self) -> usize;

    /// Adds the source's internal edges to `graph`.
    fn connect(&self, graph: &mut dyn FlowGraph) -> Result<(), Error>;

    /// Removes exactly the edges `connect` added.
    fn disconnect(&self, graph: &mut dyn FlowGraph) -> Result<(), Error>;

    /// Sources have nothing upstream; this reports the misuse and returns `None`.
    fn get_left_block(&self) -> Option<BlockRef>;

    /// Block downstream consumers connect to.
    fn get_right_block(&self) -> BlockRef;
}
