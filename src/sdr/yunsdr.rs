use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use failure::*;
use log::*;

use super::dsp::{self, Complex};
use crate::config::{property, Configuration};
use crate::error::ConfigError;
use crate::graph::{Block, BlockId, WorkStatus};

pub const GPS_L1_FREQ_HZ: f64 = 1_575_420_000.0;
pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.1.10";
pub const DEFAULT_SAMPLE_RATE: f64 = 2_600_000.0;
pub const DEFAULT_BANDWIDTH: f64 = 2_000_000.0;
pub const DEFAULT_GAIN: f64 = 64.0;
pub const DEFAULT_BUFFER_SIZE: usize = 0xA0000;
pub const DEFAULT_DUMP_FILENAME: &str = "./data/signal_source.dat";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GainMode {
    Automatic,
    Manual,
}

impl FromStr for GainMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<GainMode, Error> {
        match s {
            "manual" => Ok(GainMode::Manual),
            "automatic" | "slow_attack" | "fast_attack" | "hybrid" => Ok(GainMode::Automatic),
            _ => Err(format_err!("unknown gain mode {:?}", s)),
        }
    }
}

impl fmt::Display for GainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GainMode::Automatic => write!(f, "automatic"),
            GainMode::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub enabled: bool,
    pub gain_mode: GainMode,
    pub gain: f64,
}

/// Receiver settings, validated once and never changed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    pub device_address: String,
    pub freq: f64,
    pub sample_rate: f64,
    pub bandwidth: f64,
    pub rx1: Channel,
    pub rx2: Channel,
    pub ref_clock: String,
    pub vco: String,
    pub buffer_size: usize,
    pub rf_port_select: String,
    pub filter_file: Option<PathBuf>,
    pub filter_auto: bool,
    pub item_type: String,
    /// Samples to forward before stopping; 0 is unlimited.
    pub samples: u64,
    pub dump: bool,
    pub dump_filename: PathBuf,
}

impl SourceConfig {
    /// Reads `<role>.<key>` settings, then rejects combinations the hardware
    /// cannot be configured with.
    pub fn from_configuration(
        cfg: &dyn Configuration,
        role: &str,
    ) -> Result<SourceConfig, ConfigError> {
        let key = |name: &str| format!("{}.{}", role, name);

        let filter_file: String = property(cfg, &key("filter_file"), String::new());
        let source = SourceConfig {
            device_address: property(
                cfg,
                &key("device_address"),
                DEFAULT_DEVICE_ADDRESS.to_string(),
            ),
            freq: property(cfg, &key("freq"), GPS_L1_FREQ_HZ),
            sample_rate: property(cfg, &key("sampling_frequency"), DEFAULT_SAMPLE_RATE),
            bandwidth: property(cfg, &key("bandwidth"), DEFAULT_BANDWIDTH),
            rx1: Channel {
                enabled: property(cfg, &key("rx1_enable"), true),
                gain_mode: property(cfg, &key("gain_mode_rx1"), GainMode::Manual),
                gain: property(cfg, &key("gain_rx1"), DEFAULT_GAIN),
            },
            rx2: Channel {
                enabled: property(cfg, &key("rx2_enable"), false),
                gain_mode: property(cfg, &key("gain_mode_rx2"), GainMode::Manual),
                gain: property(cfg, &key("gain_rx2"), DEFAULT_GAIN),
            },
            ref_clock: property(cfg, &key("ref_clock"), "internal".to_string()),
            vco: property(cfg, &key("vco"), "auxdac1".to_string()),
            buffer_size: property(cfg, &key("buffer_size"), DEFAULT_BUFFER_SIZE),
            rf_port_select: property(cfg, &key("rf_port_select"), "RX".to_string()),
            filter_file: match filter_file.is_empty() {
                true => None,
                false => Some(PathBuf::from(filter_file)),
            },
            filter_auto: property(cfg, &key("filter_auto"), true),
            item_type: property(cfg, &key("item_type"), dsp::ITEM_TYPE.to_string()),
            samples: property(cfg, &key("samples"), 0u64),
            dump: property(cfg, &key("dump"), false),
            dump_filename: PathBuf::from(property(
                cfg,
                &key("dump_filename"),
                DEFAULT_DUMP_FILENAME.to_string(),
            )),
        };

        source.validate()?;
        Ok(source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item_type != dsp::ITEM_TYPE {
            return Err(ConfigError::UnsupportedItemType(self.item_type.clone()));
        }
        if self.rx1.enabled && self.rx2.enabled {
            return Err(ConfigError::BothChannelsEnabled);
        }
        Ok(())
    }
}

/// A receiver streaming `Complex` samples.
pub trait Driver: Send {
    /// Fills up to `buf.len()` samples and returns how many were written.
    /// Zero means the stream has ended.
    fn read(&mut self, buf: &mut [Complex]) -> Result<usize, Error>;
}

/// Opens a receiver for a validated configuration.
pub trait DriverFactory {
    fn open(&self, cfg: &SourceConfig) -> Result<Box<dyn Driver>, Error>;
}

/// Source block wrapping the receiver handle.
pub struct YunSdrSource {
    id: BlockId,
    device_address: String,
    driver: Mutex<Box<dyn Driver>>,
}

impl YunSdrSource {
    pub fn open(cfg: &SourceConfig, factory: &dyn DriverFactory) -> Result<YunSdrSource, Error> {
        debug!(
            "opening yunsdr {} at {} Hz, {} sps, {} Hz bandwidth",
            cfg.device_address, cfg.freq, cfg.sample_rate, cfg.bandwidth
        );
        let driver = factory.open(cfg)?;

        Ok(YunSdrSource {
            id: BlockId::next(),
            device_address: cfg.device_address.clone(),
            driver: Mutex::new(driver),
        })
    }
}

impl Block for YunSdrSource {
    fn id(&self) -> BlockId {
        self.id
    }

    fn name(&self) -> &str {
        "yunsdr_source"
    }

    fn input_ports(&self) -> usize {
        0
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn work(
        &self,
        noutput_items: usize,
        _input: &[Complex],
        output: &mut Vec<Complex>,
    ) -> Result<WorkStatus, Error> {
        let mut driver = self
            .driver
            .lock()
            .map_err(|_| format_err!("yunsdr driver lock poisoned"))?;

        output.resize(noutput_items, Complex::default());
        let n = driver.read(&mut output[..])?;
        output.truncate(n);

        if n == 0 {
            debug!("yunsdr {} stream ended", self.device_address);
            return Ok(WorkStatus::Done);
        }
        Ok(WorkStatus::Ok)
    }
}
