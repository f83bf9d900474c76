use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use failure::*;

use crate::graph::{Block, BlockId, WorkStatus};
use crate::sdr::dsp::Complex;

/// Terminal block that counts what reaches it, optionally keeping the samples.
pub struct CountingSink {
    id: BlockId,
    count: AtomicU64,
    capture: Option<Mutex<Vec<Complex>>>,
}

impl CountingSink {
    pub fn new() -> CountingSink {
        CountingSink {
            id: BlockId::next(),
            count: AtomicU64::new(0),
            capture: None,
        }
    }

    pub fn capturing() -> CountingSink {
        CountingSink {
            capture: Some(Mutex::new(Vec::new())),
            ..CountingSink::new()
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn samples(&self) -> Vec<Complex> {
        match &self.capture {
            Some(capture) => match capture.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            },
            None => Vec::new(),
        }
    }
}

impl Default for CountingSink {
    fn default() -> CountingSink {
        CountingSink::new()
    }
}

impl Block for CountingSink {
    fn id(&self) -> BlockId {
        self.id
    }

    fn name(&self) -> &str {
        "counting_sink"
    }

    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        0
    }

    fn work(
        &self,
        _noutput_items: usize,
        input: &[Complex],
        _output: &mut Vec<Complex>,
    ) -> Result<WorkStatus, Error> {
        self.count.fetch_add(input.len() as u64, Ordering::Relaxed);
        if let Some(capture) = &self.capture {
            capture
                .lock()
                .map_err(|_| format_err!("capture lock poisoned"))?
                .extend_from_slice(input);
        }
        Ok(WorkStatus::Ok)
    }
}
