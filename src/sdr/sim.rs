use std::f64::consts::PI;

use failure::*;
use log::*;

use super::dsp::Complex;
use super::yunsdr::{Driver, DriverFactory, SourceConfig};

/// Simulated receiver producing a unit-amplitude complex tone.
pub struct ToneDriver {
    step: f64,
    phase: f64,
    remaining: Option<u64>,
}

impl ToneDriver {
    /// `offset_hz` is relative to the tuned frequency. `limit` bounds the
    /// stream length; `None` streams forever.
    pub fn new(offset_hz: f64, sample_rate: f64, limit: Option<u64>) -> ToneDriver {
        ToneDriver {
            step: 2.0 * PI * offset_hz / sample_rate,
            phase: 0.0,
            remaining: limit,
        }
    }
}

impl Driver for ToneDriver {
    fn read(&mut self, buf: &mut [Complex]) -> Result<usize, Error> {
        let n = match self.remaining {
            Some(remaining) => (remaining.min(buf.len() as u64)) as usize,
            None => buf.len(),
        };

        for sample in buf[..n].iter_mut() {
            *sample = Complex::new(self.phase.cos() as f32, self.phase.sin() as f32);
            self.phase = (self.phase + self.step) % (2.0 * PI);
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= n as u64;
        }
        Ok(n)
    }
}

pub struct ToneDriverFactory {
    pub offset_hz: f64,
    pub limit: Option<u64>,
}

impl DriverFactory for ToneDriverFactory {
    fn open(&self, cfg: &SourceConfig) -> Result<Box<dyn Driver>, Error> {
        if cfg.sample_rate <= 0.0 {
            return Err(format_err!("sample rate must be positive, got {}", cfg.sample_rate));
        }
        info!(
            "simulating device {} with a {} Hz tone",
            cfg.device_address, self.offset_hz
        );
        Ok(Box::new(ToneDriver::new(
            self.offset_hz,
            cfg.sample_rate,
            self.limit,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_tone_ends() {
        let mut driver = ToneDriver::new(1000.0, 8000.0, Some(10));
        let mut buf = [Complex::default(); 8];
        assert_eq!(driver.read(&mut buf).unwrap(), 8);
        assert_eq!(buf[0], Complex::new(1.0, 0.0));
        assert!((buf[2].re).abs() < 1e-6 && (buf[2].im - 1.0).abs() < 1e-6);
        assert_eq!(driver.read(&mut buf).unwrap(), 2);
        assert_eq!(driver.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn samples_have_unit_magnitude() {
        let mut driver = ToneDriver::new(-250.0, 2_600_000.0, None);
        let mut buf = [Complex::default(); 64];
        assert_eq!(driver.read(&mut buf).unwrap(), 64);
        assert!(buf.iter().all(|s| (s.norm() - 1.0).abs() < 1e-5));
    }
}
