use std::sync::Mutex;

use crossbeam_channel::Sender;
use failure::*;
use log::*;

use crate::graph::{Block, BlockId, ControlMessage, WorkStatus};
use crate::sdr::dsp::Complex;

struct ValveState {
    copied: u64,
    stop_sent: bool,
}

/// Passes the first `nitems` samples through, then asks the graph to stop.
pub struct Valve {
    id: BlockId,
    nitems: u64,
    state: Mutex<ValveState>,
    queue: Sender<ControlMessage>,
}

impl Valve {
    pub fn new(nitems: u64, queue: Sender<ControlMessage>) -> Valve {
        Valve {
            id: BlockId::next(),
            nitems,
            state: Mutex::new(ValveState {
                copied: 0,
                stop_sent: false,
            }),
            queue,
        }
    }

    pub fn nitems(&self) -> u64 {
        self.nitems
    }

    pub fn copied(&self) -> u64 {
        match self.state.lock() {
            Ok(state) => state.copied,
            Err(poisoned) => poisoned.into_inner().copied,
        }
    }
}

impl Block for Valve {
    fn id(&self) -> BlockId {
        self.id
    }

    fn name(&self) -> &str {
        "valve"
    }

    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn work(
        &self,
        noutput_items: usize,
        input: &[Complex],
        output: &mut Vec<Complex>,
    ) -> Result<WorkStatus, Error> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| format_err!("valve state lock poisoned"))?;

        let remaining = self.nitems.saturating_sub(state.copied);
        let n = (remaining.min(input.len() as u64) as usize).min(noutput_items);
        output.extend_from_slice(&input[..n]);
        state.copied += n as u64;

        if state.copied < self.nitems {
            return Ok(WorkStatus::Ok);
        }

        if !state.stop_sent {
            debug!("valve({}) passed {} samples, sending stop", self.id, state.copied);
            if self.queue.send(ControlMessage::Stop { from: self.id }).is_err() {
                warn!("valve({}) has nobody listening for its stop message", self.id);
            }
            state.stop_sent = true;
        }
        Ok(WorkStatus::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn samples(n: usize) -> Vec<Complex> {
        (0..n).map(|i| Complex::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn forwards_exactly_nitems_then_stops_once() {
        let (tx, rx) = unbounded();
        let valve = Valve::new(5000, tx);
        let input = samples(3000);
        let mut out = Vec::new();

        assert_eq!(valve.work(4096, &input, &mut out).unwrap(), WorkStatus::Ok);
        assert_eq!(out.len(), 3000);
        assert!(rx.try_recv().is_err());

        out.clear();
        assert_eq!(valve.work(4096, &input, &mut out).unwrap(), WorkStatus::Done);
        assert_eq!(out.len(), 2000);
        assert_eq!(valve.copied(), 5000);
        assert_eq!(rx.try_recv(), Ok(ControlMessage::Stop { from: valve.id() }));

        out.clear();
        assert_eq!(valve.work(4096, &input, &mut out).unwrap(), WorkStatus::Done);
        assert!(out.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_queue_is_not_an_error() {
        let (tx, rx) = unbounded();
        drop(rx);
        let valve = Valve::new(1, tx);
        let mut out = Vec::new();
        assert_eq!(
            valve.work(8, &samples(4), &mut out).unwrap(),
            WorkStatus::Done
        );
        assert_eq!(out.len(), 1);
    }
}
