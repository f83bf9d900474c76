use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use bytes::BytesMut;
use failure::*;
use log::*;

use super::dsp::{self, Complex, ITEM_SIZE};
use super::yunsdr::{Driver, DriverFactory, SourceConfig};

/// Replays a sample dump in place of the receiver.
pub struct FileDriver {
    path: PathBuf,
    reader: BufReader<File>,
    raw: Vec<u8>,
    decoded: Vec<Complex>,
}

impl FileDriver {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<FileDriver, Error> {
        let path = path.into();
        let file = File::open(&path)
            .map_err(|e| format_err!("unable to open replay file {}: {}", path.display(), e))?;
        debug!("starting FileDriver with {}", path.display());

        Ok(FileDriver {
            path,
            reader: BufReader::new(file),
            raw: Vec::new(),
            decoded: Vec::new(),
        })
    }
}

impl Driver for FileDriver {
    fn read(&mut self, buf: &mut [Complex]) -> Result<usize, Error> {
        self.raw.resize(buf.len() * ITEM_SIZE, 0);

        let mut filled = 0;
        while filled < self.raw.len() {
            match self.reader.read(&mut self.raw[filled..])? {
                0 => break,
                count => filled += count,
            }
        }
        trace!("read {} bytes from {}", filled, self.path.display());

        if filled % ITEM_SIZE != 0 {
            warn!(
                "{} ends with a partial sample, dropping {} bytes",
                self.path.display(),
                filled % ITEM_SIZE
            );
        }

        let mut bytes = BytesMut::from(&self.raw[..filled - filled % ITEM_SIZE]);
        self.decoded.clear();
        let n = dsp::decode(&mut bytes, &mut self.decoded);
        buf[..n].copy_from_slice(&self.decoded);
        Ok(n)
    }
}

pub struct FileDriverFactory {
    pub path: PathBuf,
}

impl DriverFactory for FileDriverFactory {
    fn open(&self, cfg: &SourceConfig) -> Result<Box<dyn Driver>, Error> {
        info!(
            "replaying {} instead of device {}",
            self.path.display(),
            cfg.device_address
        );
        Ok(Box::new(FileDriver::open(self.path.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn replays_samples_then_ends() {
        let path = std::env::temp_dir().join(format!("file_driver_{}.dat", std::process::id()));
        let mut raw = BytesMut::new();
        let written: Vec<Complex> = (0..5).map(|i| Complex::new(i as f32, -(i as f32))).collect();
        dsp::encode(&written, &mut raw);
        raw.extend_from_slice(&[1, 2, 3]);
        fs::write(&path, &raw[..]).unwrap();

        let mut driver = FileDriver::open(&path).unwrap();
        let mut buf = [Complex::default(); 3];
        assert_eq!(driver.read(&mut buf).unwrap(), 3);
        assert_eq!(buf[2], Complex::new(2.0, -2.0));
        assert_eq!(driver.read(&mut buf).unwrap(), 2);
        assert_eq!(buf[1], Complex::new(4.0, -4.0));
        assert_eq!(driver.read(&mut buf).unwrap(), 0);
        fs::remove_file(&path).unwrap();
    }
}
