use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::BytesMut;
use failure::*;
use log::*;

use crate::graph::{Block, BlockId, WorkStatus};
use crate::sdr::dsp::{self, Complex};

struct Inner {
    writer: BufWriter<File>,
    scratch: BytesMut,
    written: u64,
}

/// Terminal block writing every sample it receives to a file.
pub struct FileSink {
    id: BlockId,
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileSink {
    /// Creates (or truncates) `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<FileSink, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| format_err!("unable to open dump file {}: {}", path.display(), e))?;
        debug!("dumping samples into {}", path.display());

        Ok(FileSink {
            id: BlockId::next(),
            path,
            inner: Mutex::new(Inner {
                writer: BufWriter::new(file),
                scratch: BytesMut::new(),
                written: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples written so far.
    pub fn written(&self) -> u64 {
        match self.inner.lock() {
            Ok(inner) => inner.written,
            Err(poisoned) => poisoned.into_inner().written,
        }
    }
}

impl Block for FileSink {
    fn id(&self) -> BlockId {
        self.id
    }

    fn name(&self) -> &str {
        "file_sink"
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
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| format_err!("file sink lock poisoned"))?;
        let Inner {
            writer,
            scratch,
            written,
        } = &mut *inner;

        scratch.clear();
        dsp::encode(input, scratch);
        writer.write_all(&scratch[..])?;
        *written += input.len() as u64;
        Ok(WorkStatus::Ok)
    }

    fn stop(&self) -> Result<(), Error> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| format_err!("file sink lock poisoned"))?;
        inner.writer.flush()?;
        trace!("flushed {} samples to {}", inner.written, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_interleaved_little_endian_floats() {
        let path = std::env::temp_dir().join(format!("file_sink_{}.dat", std::process::id()));
        let sink = FileSink::create(&path).unwrap();
        let mut unused = Vec::new();

        sink.work(2, &[Complex::new(1.0, 2.0), Complex::new(-0.5, 0.0)], &mut unused)
            .unwrap();
        sink.stop().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-0.5f32).to_le_bytes());
        assert_eq!(sink.written(), 2);
        assert!(unused.is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let path = std::env::temp_dir()
            .join("file_sink_no_such_dir")
            .join("out.dat");
        assert!(FileSink::create(&path).is_err());
    }
}
